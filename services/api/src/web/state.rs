//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry that holds each
//! mounted view between requests.

use crate::adapters::{ProxyHttpClient, WebhookClient};
use crate::config::Config;
use crate::error::ApiError;
use interview_core::ports::{
    DirectoryService, EventFeedService, ProcessingTrigger, ScheduleProxy, UpstreamForwarder,
};
use interview_core::{EventsView, SchedulingView};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// How many mounts of each view kind are kept before the oldest is evicted.
pub const VIEW_CAPACITY: usize = 256;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<dyn DirectoryService>,
    pub event_feed: Arc<dyn EventFeedService>,
    pub processing: Arc<dyn ProcessingTrigger>,
    pub forwarder: Arc<dyn UpstreamForwarder>,
    pub schedule_proxy: Arc<dyn ScheduleProxy>,
    pub scheduling_views: ViewRegistry<SchedulingView>,
    pub events_views: ViewRegistry<EventsView>,
}

impl AppState {
    /// Wires the webhook and proxy adapters described by `config`.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ApiError> {
        let webhooks = Arc::new(WebhookClient::new(config.webhooks.clone())?);
        let schedule_proxy = Arc::new(ProxyHttpClient::new(
            config.proxy_endpoint.clone(),
            config.upstream_timeout,
        )?);

        Ok(Self {
            config,
            directory: webhooks.clone(),
            event_feed: webhooks.clone(),
            processing: webhooks.clone(),
            forwarder: webhooks,
            schedule_proxy,
            scheduling_views: ViewRegistry::new(VIEW_CAPACITY),
            events_views: ViewRegistry::new(VIEW_CAPACITY),
        })
    }
}

//=========================================================================================
// ViewRegistry (One Entry per Page Mount)
//=========================================================================================

/// Bounded, in-memory store of mounted views keyed by view id.
///
/// A page reload mounts a new view, so nothing here outlives the browser tab
/// that created it in any meaningful way. Locks on individual views are never
/// held across an outbound call.
pub struct ViewRegistry<V> {
    capacity: usize,
    inner: Mutex<RegistryInner<V>>,
}

struct RegistryInner<V> {
    views: HashMap<Uuid, Arc<Mutex<V>>>,
    order: VecDeque<Uuid>,
}

impl<V> ViewRegistry<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(RegistryInner {
                views: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Stores a freshly mounted view and returns its id.
    pub async fn insert(&self, view: V) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().await;
        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.views.remove(&oldest);
            }
        }
        inner.views.insert(id, Arc::new(Mutex::new(view)));
        inner.order.push_back(id);
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<V>>> {
        self.inner.lock().await.views.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.views.len()
    }
}
