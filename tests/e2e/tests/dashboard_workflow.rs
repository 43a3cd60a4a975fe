//! Dashboard workflow tests: section refresh races, failure handling and
//! settings persistence across sessions.

use std::sync::Arc;
use std::time::Duration;

use veritas_core::dashboard::{RefreshRatesPatch, VisibleMetricsPatch};
use veritas_core::{
    DashboardEvent, DashboardSettings, DashboardState, Section, SettingsPatch, Theme,
};
use veritas_e2e_tests::{FailingService, ScriptedService, TestStoreManager};

// ============================================================================
// REFRESH
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_overlapping_refresh_last_completed_write_wins() {
    let manager = TestStoreManager::new_temp();
    let service = Arc::new(ScriptedService::new());
    // First request is slow, second is fast: the slow one completes last
    service.push_overview(
        Duration::from_millis(300),
        Ok(ScriptedService::overview_with_value(1_000.0)),
    );
    service.push_overview(
        Duration::from_millis(100),
        Ok(ScriptedService::overview_with_value(2_000.0)),
    );

    let dashboard = DashboardState::new(service.clone(), manager.open_dyn());
    tokio::join!(
        dashboard.refresh_data(Some(Section::Overview)),
        dashboard.refresh_data(Some(Section::Overview)),
    );

    let overview = dashboard.overview().expect("overview loaded");
    assert_eq!(overview.portfolio_value.current, 1_000.0);
    assert!(!dashboard.is_loading(Section::Overview));
    assert_eq!(dashboard.error(Section::Overview), None);
    assert_eq!(service.calls(), vec![Section::Overview, Section::Overview]);
}

#[tokio::test]
async fn test_initialize_loads_overview_and_performance_only() {
    let manager = TestStoreManager::new_temp();
    let service = Arc::new(ScriptedService::new());
    let dashboard = DashboardState::new(service.clone(), manager.open_dyn());

    dashboard.initialize().await;

    let snapshot = dashboard.snapshot();
    assert!(snapshot.overview_data.is_some());
    assert!(snapshot.performance_data.is_some());
    assert!(snapshot.model_results.is_none());
    assert!(snapshot.voting_overview.is_none());

    let mut calls = service.calls();
    calls.sort_by_key(|s| s.as_str());
    assert_eq!(calls, vec![Section::Overview, Section::Performance]);
}

#[tokio::test]
async fn test_failing_backend_sets_fixed_section_errors() {
    let manager = TestStoreManager::new_temp();
    let service = Arc::new(FailingService::new());
    let dashboard = DashboardState::new(service.clone(), manager.open_dyn());

    dashboard.initialize().await;
    dashboard.refresh_data(Some(Section::Models)).await;
    dashboard.refresh_data(Some(Section::Voting)).await;

    assert_eq!(
        dashboard.error(Section::Overview).as_deref(),
        Some("Failed to load overview data")
    );
    assert_eq!(
        dashboard.error(Section::Performance).as_deref(),
        Some("Failed to load performance data")
    );
    assert_eq!(
        dashboard.error(Section::Models).as_deref(),
        Some("Failed to load model results")
    );
    assert_eq!(
        dashboard.error(Section::Voting).as_deref(),
        Some("Failed to load voting data")
    );
    for section in Section::ALL {
        assert!(!dashboard.is_loading(section));
    }
    // No retries
    assert_eq!(service.call_count(), 4);
}

#[tokio::test]
async fn test_failed_refresh_keeps_stale_data() {
    let manager = TestStoreManager::new_temp();
    let service = Arc::new(ScriptedService::new());
    service.push_overview(
        Duration::ZERO,
        Ok(ScriptedService::overview_with_value(750.0)),
    );
    service.push_overview(Duration::ZERO, Err("upstream 502".to_string()));

    let dashboard = DashboardState::new(service, manager.open_dyn());
    dashboard.refresh_data(Some(Section::Overview)).await;
    dashboard.refresh_data(Some(Section::Overview)).await;

    assert_eq!(
        dashboard.overview().map(|o| o.portfolio_value.current),
        Some(750.0)
    );
    assert_eq!(
        dashboard.error(Section::Overview).as_deref(),
        Some("Failed to load overview data")
    );
    // Other sections untouched
    assert_eq!(dashboard.error(Section::Performance), None);
}

#[tokio::test]
async fn test_section_error_cleared_by_next_success() {
    let manager = TestStoreManager::new_temp();
    let service = Arc::new(ScriptedService::new());
    service.push_performance(Duration::ZERO, Err("timeout".to_string()));

    let dashboard = DashboardState::new(service, manager.open_dyn());
    dashboard.refresh_data(Some(Section::Performance)).await;
    assert!(dashboard.error(Section::Performance).is_some());

    dashboard.refresh_data(Some(Section::Performance)).await;
    assert_eq!(dashboard.error(Section::Performance), None);
    assert!(dashboard.performance().is_some());
}

#[tokio::test]
async fn test_refresh_emits_loading_then_updated() {
    let manager = TestStoreManager::new_temp();
    let dashboard = DashboardState::new(Arc::new(ScriptedService::new()), manager.open_dyn());
    let mut rx = dashboard.subscribe();

    dashboard.refresh_data(Some(Section::Voting)).await;

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(matches!(
        first,
        DashboardEvent::SectionLoading {
            section: Section::Voting,
            ..
        }
    ));
    assert!(matches!(
        second,
        DashboardEvent::SectionUpdated {
            section: Section::Voting,
            ..
        }
    ));
}

// ============================================================================
// SETTINGS
// ============================================================================

#[tokio::test]
async fn test_settings_survive_new_session() {
    let manager = TestStoreManager::new_temp();

    let first = DashboardState::new(Arc::new(ScriptedService::new()), manager.open_dyn());
    let saved = first
        .update_settings(SettingsPatch {
            theme: Some(Theme::Dark),
            refresh_rates: Some(RefreshRatesPatch {
                voting: Some(45),
                ..Default::default()
            }),
            ..Default::default()
        })
        .unwrap();
    let saved = first
        .update_settings(SettingsPatch {
            visible_metrics: Some(VisibleMetricsPatch {
                active_strategies: Some(false),
                ..Default::default()
            }),
            compact_view: Some(true),
            ..Default::default()
        })
        .map(|latest| {
            assert_eq!(latest.theme, saved.theme);
            latest
        })
        .unwrap();
    drop(first);

    // Fresh connection to the same file, as after a restart
    let second = DashboardState::new(Arc::new(ScriptedService::new()), manager.open_dyn());
    let restored = second.settings();

    assert_eq!(restored, saved);
    assert_eq!(restored.theme, Theme::Dark);
    assert_eq!(restored.refresh_rates.voting, 45);
    assert_eq!(restored.refresh_rates.portfolio_value, 30);
    assert!(!restored.visible_metrics.active_strategies);
    assert!(restored.visible_metrics.risk_score);
    assert!(restored.compact_view);
}

#[tokio::test]
async fn test_partial_persisted_settings_fill_defaults() {
    let manager = TestStoreManager::new_temp();
    manager.seed_settings(r#"{"theme":"light","refreshRates":{"performance":90}}"#);

    let dashboard = DashboardState::new(Arc::new(ScriptedService::new()), manager.open_dyn());
    let settings = dashboard.settings();

    assert_eq!(settings.theme, Theme::Light);
    assert_eq!(settings.refresh_rates.performance, 90);
    assert_eq!(settings.refresh_rates.model_results, 600);
    assert!(settings.visible_metrics.portfolio_value);
}

#[tokio::test]
async fn test_corrupt_persisted_settings_fall_back_to_defaults() {
    let manager = TestStoreManager::new_temp();
    manager.seed_settings("{ not json");

    let dashboard = DashboardState::new(Arc::new(ScriptedService::new()), manager.open_dyn());
    assert_eq!(dashboard.settings(), DashboardSettings::default());

    // The next update overwrites the corrupt document
    dashboard
        .update_settings(SettingsPatch {
            compact_view: Some(true),
            ..Default::default()
        })
        .unwrap();
    let raw = manager.raw(veritas_core::SETTINGS_KEY).unwrap();
    let stored: DashboardSettings = serde_json::from_str(&raw).unwrap();
    assert!(stored.compact_view);
}

#[tokio::test]
async fn test_active_tab_is_not_validated_by_state() {
    let manager = TestStoreManager::new_temp();
    let dashboard = DashboardState::new(Arc::new(ScriptedService::new()), manager.open_dyn());

    assert_eq!(dashboard.active_tab(), "overview");
    dashboard.set_active_tab("allocations");
    assert_eq!(dashboard.active_tab(), "allocations");

    dashboard.set_active_tab("not-a-tab");
    assert_eq!(dashboard.active_tab(), "not-a-tab");
    assert!(!veritas_core::is_valid_tab(&dashboard.active_tab()));
}
