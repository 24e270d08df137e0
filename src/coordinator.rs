//! Switch coordinator: intercepts switch-language actions in the dispatch
//! pipeline and drives dictionary loading, caching and notification.
//!
//! # Switching
//!
//! A switch to the language that is already current is forwarded without
//! any other effect. Otherwise the request is accepted and either:
//!
//! - served from the cache (`current_lang` changes immediately), or
//! - marked as loading while the loader runs in the background.
//!
//! Loads cannot be cancelled. When a load resolves, its dictionary is always
//! stored, but it only becomes current if `loading_lang` still names the
//! same language, i.e. no newer request superseded it in the meantime.
//!
//! # Execution context
//!
//! The store lock is never held while a callback runs, so a resolved load
//! updates the store and fires its end callback in two steps. Drive a
//! coordinator from one logical context: a current-thread runtime,
//! dispatching from that runtime's thread. Resolutions then interleave with
//! [`SwitchCoordinator::handle`] only between dispatches, and end callbacks
//! are observed in switch order. On a multi-thread runtime a language that
//! becomes current while the start callback runs is still detected and does
//! not fire a second end callback, but end callbacks of concurrently
//! resolving loads may be observed out of order.

use crate::action::Action;
use crate::error::SwitchError;
use crate::metrics::SwitchMetrics;
use crate::options::SwitchOptions;
use crate::store::{DictionaryStore, StatePatch, StoreState};
use crate::subscribers::SubscriberRegistry;
use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Asynchronous source of dictionaries, keyed by language code.
///
/// Loader errors are logged and the result is discarded; the coordinator
/// never retries. Wrap the loader if a fallback is needed.
pub trait DictionaryLoader<D>: Send + Sync + 'static {
    fn load(&self, lang: &str) -> BoxFuture<'static, Result<D>>;
}

impl<D, F, Fut> DictionaryLoader<D> for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<D>> + Send + 'static,
{
    fn load(&self, lang: &str) -> BoxFuture<'static, Result<D>> {
        self(lang.to_string()).boxed()
    }
}

/// Outcome of the cache lookup for an accepted request.
enum Lookup<D> {
    Hit(D),
    Miss,
    /// The language became current after the no-op check.
    Current,
}

struct Inner<D, C> {
    store: Mutex<DictionaryStore<D>>,
    subscribers: Arc<SubscriberRegistry>,
    options: SwitchOptions<D, C>,
    loader: Arc<dyn DictionaryLoader<D>>,
    metrics: SwitchMetrics,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

/// Language-switch interceptor owning the dictionary store.
///
/// Cloning is cheap and every clone drives the same store.
pub struct SwitchCoordinator<D, C = ()> {
    inner: Arc<Inner<D, C>>,
}

impl<D, C> Clone for SwitchCoordinator<D, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, C> SwitchCoordinator<D, C>
where
    D: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Create a coordinator with an empty store.
    ///
    /// Loads are spawned on the Tokio runtime current at construction.
    ///
    /// # Errors
    /// Returns [`SwitchError::NoRuntime`] outside of a Tokio runtime.
    pub fn new(
        loader: impl DictionaryLoader<D>,
        options: SwitchOptions<D, C>,
    ) -> Result<Self, SwitchError> {
        Self::with_state(loader, options, StoreState::default())
    }

    /// Create a coordinator resuming from a previously known state.
    ///
    /// # Errors
    /// Returns [`SwitchError::NoRuntime`] outside of a Tokio runtime.
    pub fn with_state(
        loader: impl DictionaryLoader<D>,
        options: SwitchOptions<D, C>,
        initial: StoreState<D>,
    ) -> Result<Self, SwitchError> {
        let runtime = Handle::try_current().map_err(|_| SwitchError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, loader, options, initial))
    }

    /// Create a coordinator that spawns its loads on `runtime`.
    pub fn with_runtime(
        runtime: Handle,
        loader: impl DictionaryLoader<D>,
        options: SwitchOptions<D, C>,
        initial: StoreState<D>,
    ) -> Self {
        debug!(?options, "Creating switch coordinator");
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(DictionaryStore::new(initial)),
                subscribers: Arc::new(SubscriberRegistry::new()),
                options,
                loader: Arc::new(loader),
                metrics: SwitchMetrics::new(),
                runtime,
                pending: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Intercept `action`, then forward it to `next`.
    ///
    /// Application actions and switches to the current language go straight
    /// to `next`. Accepted switches run their synchronous part (callbacks,
    /// store update, issuing the load) before `next` is called.
    ///
    /// # Errors
    /// Returns an error without touching the store or calling `next` when
    /// the switch payload is not a non-empty string.
    pub fn handle<A, R>(
        &self,
        action: Action<A>,
        ctx: &C,
        next: impl FnOnce(Action<A>) -> R,
    ) -> Result<R, SwitchError> {
        let Some(lang) = action.language()?.map(str::to_string) else {
            return Ok(next(action));
        };

        if self.lock_store().current_lang() == Some(lang.as_str()) {
            debug!("Language '{}' is already current", lang);
            return Ok(next(action));
        }

        info!("Switching language to '{}'", lang);
        if let Some(callback) = &self.inner.options.start_switch_callback {
            callback(&lang, ctx);
        }

        match self.lookup_and_apply(&lang) {
            Lookup::Hit(dictionary) => {
                self.inner.metrics.record_cache_hit();
                debug!("Dictionary for '{}' served from cache", lang);

                if let Some(callback) = &self.inner.options.end_switch_callback {
                    callback(&lang, &dictionary, ctx);
                }
                if self.inner.options.update_cache_on_switch {
                    self.spawn_refresh(lang);
                }
                self.spawn_notify();
            }
            Lookup::Miss => {
                self.inner.metrics.record_cache_miss();
                self.spawn_notify();
                self.spawn_load(lang, ctx.clone());
            }
            Lookup::Current => {
                debug!("Language '{}' became current during the start callback", lang);
            }
        }

        Ok(next(action))
    }

    /// Merge `patch` into the store, bypassing the switch algorithm.
    ///
    /// The patch is applied before this returns. With `notify`, subscribers
    /// are refreshed in the background and the returned future resolves once
    /// they are done; without it, nothing is scheduled.
    pub fn patch_state(
        &self,
        patch: StatePatch<D>,
        notify: bool,
    ) -> impl Future<Output = ()> + Send + 'static {
        self.lock_store().apply(patch);

        let notification = notify.then(|| {
            let subscribers = Arc::clone(&self.inner.subscribers);
            self.inner
                .runtime
                .spawn(async move { subscribers.notify_all().await })
        });

        async move {
            if let Some(handle) = notification {
                if let Err(e) = handle.await {
                    error!("Subscriber notification failed: {}", e);
                }
            }
        }
    }

    /// Wait for every load, refresh and notification spawned so far.
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.lock_pending());
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    error!("Background switch task failed: {}", e);
                }
            }
        }
    }

    pub fn state(&self) -> StoreState<D> {
        self.lock_store().snapshot()
    }

    pub fn current_lang(&self) -> Option<String> {
        self.lock_store().current_lang().map(str::to_string)
    }

    pub fn loading_lang(&self) -> Option<String> {
        self.lock_store().loading_lang().map(str::to_string)
    }

    pub fn dictionary(&self, lang: &str) -> Option<D> {
        self.lock_store().dictionary(lang).cloned()
    }

    pub fn current_dictionary(&self) -> Option<D> {
        self.lock_store().current_dictionary().cloned()
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.inner.subscribers
    }

    pub fn options(&self) -> &SwitchOptions<D, C> {
        &self.inner.options
    }

    pub fn metrics(&self) -> &SwitchMetrics {
        &self.inner.metrics
    }

    /// Run the cache hit test and apply the synchronous store update.
    fn lookup_and_apply(&self, lang: &str) -> Lookup<D> {
        let mut store = self.lock_store();
        if store.current_lang() == Some(lang) {
            return Lookup::Current;
        }

        let cached = if self.inner.options.cache {
            store.dictionary(lang).cloned()
        } else {
            None
        };

        match cached {
            Some(dictionary) => {
                store.apply(
                    StatePatch::new()
                        .current_lang(Some(lang))
                        .loading_lang(None),
                );
                Lookup::Hit(dictionary)
            }
            None => {
                store.apply(StatePatch::new().loading_lang(Some(lang)));
                Lookup::Miss
            }
        }
    }

    /// Load `lang` and make it current unless superseded meanwhile.
    fn spawn_load(&self, lang: String, ctx: C) {
        self.inner.metrics.record_loader_call();
        let load = self.inner.loader.load(&lang);
        let inner = Arc::clone(&self.inner);

        self.spawn_tracked(async move {
            let dictionary = match load.await {
                Ok(dictionary) => dictionary,
                Err(e) => {
                    inner.metrics.record_loader_failure();
                    error!("Failed to load dictionary for '{}': {:#}", lang, e);
                    return;
                }
            };

            let applied = {
                let mut store = inner.lock_store();
                let still_wanted = store.loading_lang() == Some(lang.as_str());
                let mut patch = StatePatch::new().dictionary(lang.clone(), dictionary.clone());
                if still_wanted {
                    patch = patch.current_lang(Some(&lang)).loading_lang(None);
                }
                store.apply(patch);
                still_wanted
            };

            if !applied {
                inner.metrics.record_stale_resolution();
                debug!("Discarding stale load of '{}', cached only", lang);
                return;
            }

            info!("Language '{}' loaded and active", lang);
            if let Some(callback) = &inner.options.end_switch_callback {
                callback(&lang, &dictionary, &ctx);
            }
            inner.subscribers.notify_all().await;
        });
    }

    /// Reload a cached dictionary without touching the active language.
    fn spawn_refresh(&self, lang: String) {
        self.inner.metrics.record_background_refresh();
        self.inner.metrics.record_loader_call();
        let load = self.inner.loader.load(&lang);
        let inner = Arc::clone(&self.inner);

        self.spawn_tracked(async move {
            match load.await {
                Ok(dictionary) => {
                    inner
                        .lock_store()
                        .apply(StatePatch::new().dictionary(lang.clone(), dictionary));
                    debug!("Refreshed cached dictionary for '{}'", lang);
                    inner.subscribers.notify_all().await;
                }
                Err(e) => {
                    inner.metrics.record_loader_failure();
                    error!("Failed to refresh dictionary for '{}': {:#}", lang, e);
                }
            }
        });
    }

    fn spawn_notify(&self) {
        let subscribers = Arc::clone(&self.inner.subscribers);
        self.spawn_tracked(async move { subscribers.notify_all().await });
    }

    fn spawn_tracked<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.inner.runtime.spawn(task);
        let mut pending = self.lock_pending();
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }

    fn lock_store(&self) -> MutexGuard<'_, DictionaryStore<D>> {
        self.inner.lock_store()
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D, C> Inner<D, C> {
    fn lock_store(&self) -> MutexGuard<'_, DictionaryStore<D>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D, C> fmt::Debug for SwitchCoordinator<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.inner.lock_store();
        f.debug_struct("SwitchCoordinator")
            .field("current_lang", &store.current_lang())
            .field("loading_lang", &store.loading_lang())
            .field("options", &self.inner.options)
            .field("subscribers", &self.inner.subscribers)
            .finish()
    }
}
