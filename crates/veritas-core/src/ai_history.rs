//! AI interaction history
//!
//! Records prompts and responses of AI-assisted features into the persisted
//! store under [`HISTORY_KEY`], newest first and capped at
//! [`MAX_HISTORY_ENTRIES`]. Tracking can be switched off per installation
//! ([`TRACKING_KEY`]); the environment default applies until it is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{KeyValueStore, StoreError};

/// Store key of the interaction list
pub const HISTORY_KEY: &str = "ai_interaction_history";

/// Store key of the tracking switch (`"true"` / `"false"`)
pub const TRACKING_KEY: &str = "ai_tracking_enabled";

/// Entries kept; older ones are dropped
pub const MAX_HISTORY_ENTRIES: usize = 100;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AiHistoryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInteraction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub prompt: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AiInteraction {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            model: model.into(),
            prompt: prompt.into(),
            response: response.into(),
            duration_ms: None,
            metadata: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub struct AiHistoryTracker {
    store: Arc<dyn KeyValueStore>,
    default_enabled: bool,
    server_logging: bool,
}

impl AiHistoryTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, default_enabled: bool, server_logging: bool) -> Self {
        Self {
            store,
            default_enabled,
            server_logging,
        }
    }

    /// Stored switch, or the default when never set or unreadable
    pub fn is_enabled(&self) -> bool {
        match self.store.get(TRACKING_KEY) {
            Ok(Some(value)) => value == "true",
            Ok(None) => self.default_enabled,
            Err(e) => {
                warn!(error = %e, "Failed to read AI tracking flag");
                self.default_enabled
            }
        }
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), AiHistoryError> {
        self.store
            .set(TRACKING_KEY, if enabled { "true" } else { "false" })?;
        info!(enabled, "AI tracking toggled");
        Ok(())
    }

    /// Record an interaction. Returns `false` when tracking is disabled.
    pub fn record(&self, interaction: AiInteraction) -> Result<bool, AiHistoryError> {
        if !self.is_enabled() {
            debug!(model = %interaction.model, "AI tracking disabled, interaction not recorded");
            return Ok(false);
        }

        if self.server_logging {
            info!(
                id = %interaction.id,
                model = %interaction.model,
                prompt_len = interaction.prompt.len(),
                response_len = interaction.response.len(),
                duration_ms = interaction.duration_ms,
                "AI interaction"
            );
        }

        let mut history = self.history();
        history.insert(0, interaction);
        history.truncate(MAX_HISTORY_ENTRIES);

        let json = serde_json::to_string(&history)?;
        self.store.set(HISTORY_KEY, &json)?;
        Ok(true)
    }

    /// Recorded interactions, newest first. Unreadable history is empty.
    pub fn history(&self) -> Vec<AiInteraction> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read AI interaction history");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding corrupt AI interaction history");
            Vec::new()
        })
    }

    pub fn clear(&self) -> Result<(), AiHistoryError> {
        self.store.remove(HISTORY_KEY)?;
        info!("AI interaction history cleared");
        Ok(())
    }
}
