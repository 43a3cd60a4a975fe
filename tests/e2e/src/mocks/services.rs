//! Scripted dashboard services
//!
//! [`ScriptedService`] answers each call from a per-section queue of
//! `(delay, outcome)` steps, which makes overlapping refreshes complete in
//! a chosen order. [`FailingService`] fails every call.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use veritas_core::{
    DashboardError, DashboardOverview, DashboardPerformance, DashboardService,
    MockDashboardService, ModelResults, Section, VotingOverview,
};

/// Outcome of one scripted call
pub type Step<T> = (Duration, Result<T, String>);

/// Service replaying scripted responses. Sections without remaining steps
/// answer immediately with sample data.
#[derive(Default)]
pub struct ScriptedService {
    overview: Mutex<VecDeque<Step<DashboardOverview>>>,
    performance: Mutex<VecDeque<Step<DashboardPerformance>>>,
    calls: Mutex<Vec<Section>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_overview(&self, delay: Duration, outcome: Result<DashboardOverview, String>) {
        self.overview
            .lock()
            .unwrap()
            .push_back((delay, outcome));
    }

    pub fn push_performance(&self, delay: Duration, outcome: Result<DashboardPerformance, String>) {
        self.performance
            .lock()
            .unwrap()
            .push_back((delay, outcome));
    }

    /// Overview sample whose portfolio value is `value`, to tell responses apart
    pub fn overview_with_value(value: f64) -> DashboardOverview {
        let mut overview = MockDashboardService::sample_overview();
        overview.portfolio_value.current = value;
        overview
    }

    /// Sections requested so far, in call order
    pub fn calls(&self) -> Vec<Section> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, section: Section) {
        self.calls.lock().unwrap().push(section);
    }

    async fn play<T>(
        queue: &Mutex<VecDeque<Step<T>>>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, DashboardError> {
        let step = queue.lock().unwrap().pop_front();
        match step {
            Some((delay, outcome)) => {
                tokio::time::sleep(delay).await;
                outcome.map_err(DashboardError::Fetch)
            }
            None => Ok(fallback()),
        }
    }
}

#[async_trait]
impl DashboardService for ScriptedService {
    async fn fetch_overview(&self) -> Result<DashboardOverview, DashboardError> {
        self.record(Section::Overview);
        Self::play(&self.overview, MockDashboardService::sample_overview).await
    }

    async fn fetch_performance(&self) -> Result<DashboardPerformance, DashboardError> {
        self.record(Section::Performance);
        Self::play(&self.performance, MockDashboardService::sample_performance).await
    }

    async fn fetch_model_results(&self) -> Result<ModelResults, DashboardError> {
        self.record(Section::Models);
        Ok(MockDashboardService::sample_model_results())
    }

    async fn fetch_voting_overview(&self) -> Result<VotingOverview, DashboardError> {
        self.record(Section::Voting);
        Ok(MockDashboardService::sample_voting_overview())
    }
}

/// Service whose every call fails
#[derive(Debug, Default)]
pub struct FailingService {
    calls: AtomicUsize,
}

impl FailingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, DashboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DashboardError::Fetch("backend unavailable".to_string()))
    }
}

#[async_trait]
impl DashboardService for FailingService {
    async fn fetch_overview(&self) -> Result<DashboardOverview, DashboardError> {
        self.fail()
    }

    async fn fetch_performance(&self) -> Result<DashboardPerformance, DashboardError> {
        self.fail()
    }

    async fn fetch_model_results(&self) -> Result<ModelResults, DashboardError> {
        self.fail()
    }

    async fn fetch_voting_overview(&self) -> Result<VotingOverview, DashboardError> {
        self.fail()
    }
}
