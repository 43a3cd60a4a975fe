//! In-memory Event Grid service
//!
//! Topic-based pub/sub with best-effort, synchronous, at-most-once
//! delivery. Nothing is persisted and no network I/O happens; webhook
//! subscriptions are bookkeeping records only.

use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::event::{EventGridEvent, EventPayload};
use super::filter::EventFilter;
use super::webhook::{self, WebhookRequest, WebhookValidation};
use super::{EventSubscription, SubscriptionStatus};

/// Events kept per topic
pub const DEFAULT_MAX_CACHE_SIZE: usize = 100;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Handler callback. An `Err` is logged and does not affect other handlers.
pub type EventCallback = Arc<dyn Fn(&EventGridEvent) -> Result<(), String> + Send + Sync>;

#[derive(Clone)]
struct RegisteredHandler {
    id: String,
    callback: EventCallback,
    filter: Option<EventFilter>,
}

/// A topic known to the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInfo {
    pub name: &'static str,
    pub description: &'static str,
}

const TOPICS: &[TopicInfo] = &[
    TopicInfo {
        name: "blockchain-events",
        description: "On-chain transactions touching managed pools",
    },
    TopicInfo {
        name: "market-data",
        description: "Price and liquidity updates",
    },
    TopicInfo {
        name: "risk-alerts",
        description: "Threshold breaches from the risk engine",
    },
    TopicInfo {
        name: "model-results",
        description: "Completed allocation and forecast model runs",
    },
    TopicInfo {
        name: "governance-events",
        description: "Proposal and vote activity",
    },
];

/// Event Grid service. Create one per application (or per test) and share
/// it as `Arc<EventGridService>`.
pub struct EventGridService {
    max_cache_size: usize,
    access_key: Option<String>,
    subscriptions: RwLock<HashMap<String, EventSubscription>>,
    handlers: RwLock<HashMap<String, Vec<RegisteredHandler>>>,
    cache: RwLock<HashMap<String, VecDeque<EventGridEvent>>>,
    event_tx: broadcast::Sender<EventGridEvent>,
}

impl Default for EventGridService {
    fn default() -> Self {
        Self::new()
    }
}

impl EventGridService {
    pub fn new() -> Self {
        Self::with_cache_size(DEFAULT_MAX_CACHE_SIZE)
    }

    pub fn with_cache_size(max_cache_size: usize) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            max_cache_size,
            access_key: None,
            subscriptions: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Require this key on regular webhook deliveries
    pub fn with_access_key(mut self, key: Option<String>) -> Self {
        self.access_key = key;
        self
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    /// Receive every processed event, across all topics
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventGridEvent> {
        self.event_tx.subscribe()
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Record a webhook subscription. No delivery is performed.
    pub fn subscribe_to_topic(
        &self,
        topic_name: &str,
        endpoint: &str,
        filter: Option<EventFilter>,
    ) -> EventSubscription {
        let subscription = EventSubscription {
            id: Uuid::new_v4().to_string(),
            topic_name: topic_name.to_string(),
            endpoint: endpoint.to_string(),
            filter,
            status: SubscriptionStatus::Active,
            created_at: Utc::now(),
        };

        info!(
            topic = topic_name,
            endpoint,
            id = %subscription.id,
            "Subscribed to Event Grid topic"
        );
        write(&self.subscriptions).insert(subscription.id.clone(), subscription.clone());
        subscription
    }

    /// Drop a subscription. Unknown ids are accepted as well.
    pub fn unsubscribe_from_topic(&self, subscription_id: &str) -> bool {
        match write(&self.subscriptions).remove(subscription_id) {
            Some(sub) => info!(id = subscription_id, topic = %sub.topic_name, "Unsubscribed"),
            None => debug!(id = subscription_id, "Unsubscribe for unknown subscription"),
        }
        true
    }

    /// Subscriptions, optionally restricted to one topic, oldest first
    pub fn list_subscriptions(&self, topic_name: Option<&str>) -> Vec<EventSubscription> {
        let mut subs: Vec<EventSubscription> = read(&self.subscriptions)
            .values()
            .filter(|s| topic_name.is_none_or(|t| s.topic_name == t))
            .cloned()
            .collect();
        subs.sort_by_key(|s| s.created_at);
        subs
    }

    pub fn list_topics(&self) -> Vec<TopicInfo> {
        TOPICS.to_vec()
    }

    // ========================================================================
    // HANDLERS
    // ========================================================================

    /// Register an in-process handler and return its id
    pub fn register_event_handler<F>(&self, topic: &str, callback: F, filter: Option<EventFilter>) -> String
    where
        F: Fn(&EventGridEvent) -> Result<(), String> + Send + Sync + 'static,
    {
        let id = Uuid::new_v4().to_string();
        write(&self.handlers)
            .entry(topic.to_string())
            .or_default()
            .push(RegisteredHandler {
                id: id.clone(),
                callback: Arc::new(callback),
                filter,
            });
        debug!(topic, handler_id = %id, "Registered event handler");
        id
    }

    pub fn unregister_event_handler(&self, topic: &str, handler_id: &str) -> bool {
        let mut handlers = write(&self.handlers);
        let Some(list) = handlers.get_mut(topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|h| h.id != handler_id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(topic);
        }
        removed
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        read(&self.handlers).get(topic).map_or(0, Vec::len)
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    /// Cache the event and run every matching handler for its topic.
    ///
    /// Returns the number of handlers that completed without error.
    pub fn process_event(&self, event: EventGridEvent) -> usize {
        {
            let mut cache = write(&self.cache);
            let events = cache.entry(event.topic.clone()).or_default();
            events.push_front(event.clone());
            events.truncate(self.max_cache_size);
        }

        // Handlers run without the lock held so they may (un)register
        let handlers: Vec<RegisteredHandler> = read(&self.handlers)
            .get(&event.topic)
            .cloned()
            .unwrap_or_default();

        let mut delivered = 0;
        for handler in handlers
            .iter()
            .filter(|h| h.filter.as_ref().is_none_or(|f| f.matches(&event)))
        {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (handler.callback)(&event)));
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!(
                    topic = %event.topic,
                    handler_id = %handler.id,
                    error = %e,
                    "Event handler failed"
                ),
                Err(_) => warn!(
                    topic = %event.topic,
                    handler_id = %handler.id,
                    "Event handler panicked"
                ),
            }
        }

        debug!(topic = %event.topic, event_type = %event.event_type, delivered, "Processed event");
        let _ = self.event_tx.send(event);
        delivered
    }

    /// Fabricate an event and process it, as a simulated producer would
    pub fn publish_event(
        &self,
        topic: &str,
        event_type: &str,
        subject: &str,
        data: EventPayload,
    ) -> EventGridEvent {
        let event = EventGridEvent::new(topic, event_type, subject, data);
        self.process_event(event.clone());
        event
    }

    /// Most recent events for a topic, newest first
    pub fn get_recent_events(&self, topic: &str, limit: usize) -> Vec<EventGridEvent> {
        read(&self.cache)
            .get(topic)
            .map(|events| events.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_cache(&self, topic: Option<&str>) {
        let mut cache = write(&self.cache);
        match topic {
            Some(t) => {
                cache.remove(t);
            }
            None => cache.clear(),
        }
    }

    // ========================================================================
    // WEBHOOK
    // ========================================================================

    pub fn validate_webhook_request(&self, request: &WebhookRequest) -> WebhookValidation {
        webhook::validate_request(request, self.access_key.as_deref())
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
