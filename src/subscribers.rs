//! Subscriber registry: mounted views that re-render when the store changes.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Something that must refresh itself when the dictionary store changes.
pub trait Subscriber: Send + Sync {
    /// Re-read state and re-render. The returned future completes when done.
    fn refresh(&self) -> BoxFuture<'_, ()>;
}

/// Plain closures subscribe with a synchronous refresh.
impl<F> Subscriber for F
where
    F: Fn() + Send + Sync,
{
    fn refresh(&self) -> BoxFuture<'_, ()> {
        self();
        futures::future::ready(()).boxed()
    }
}

/// Opaque handle identifying a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

/// Set of currently mounted subscribers.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    members: Mutex<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber and return its handle.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, subscriber);
        debug!("Registered {}", id);
        id
    }

    /// Remove a subscriber.
    ///
    /// # Returns
    /// `true` if the handle was registered, `false` if it was unknown or
    /// already removed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!("Unregistered {}", id);
        }
        removed
    }

    pub fn is_registered(&self, id: SubscriberId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Refresh every subscriber registered at the moment of the call.
    ///
    /// The member set is copied before any refresh runs, so subscribers may
    /// register or unregister (themselves included) from inside `refresh`.
    pub async fn notify_all(&self) {
        let members: Vec<Arc<dyn Subscriber>> = self.lock().values().cloned().collect();
        if members.is_empty() {
            return;
        }

        debug!("Notifying {} subscribers", members.len());
        join_all(members.iter().map(|subscriber| subscriber.refresh())).await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, Arc<dyn Subscriber>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("len", &self.len())
            .finish()
    }
}
