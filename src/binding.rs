//! View binding: hands live language state and a bound `switch_lang` to views.
//!
//! A view is any callback that renders from [`ViewProps`]. Mounting it
//! registers a subscriber that re-renders with fresh props whenever the
//! coordinator notifies; dropping the returned [`Mounted`] guard unmounts it.

use crate::action::Action;
use crate::coordinator::SwitchCoordinator;
use crate::error::SwitchError;
use crate::store::EmptyDictionary;
use crate::subscribers::{Subscriber, SubscriberId, SubscriberRegistry};
use std::fmt;
use std::sync::Arc;

/// Bound dispatcher of the switch-language action.
pub type SwitchLangFn = Arc<dyn Fn(&str) -> Result<(), SwitchError> + Send + Sync>;

/// Props injected into a bound view.
#[derive(Clone)]
pub struct ViewProps<D> {
    pub current_lang: Option<String>,
    pub loading_lang: Option<String>,

    /// Dictionary of `current_lang`, or an empty mapping if none is active
    pub dictionary: D,

    switch_lang: SwitchLangFn,
}

impl<D> ViewProps<D> {
    /// Dispatch a switch to `lang`.
    pub fn switch_lang(&self, lang: &str) -> Result<(), SwitchError> {
        (self.switch_lang)(lang)
    }

    pub fn is_loading(&self) -> bool {
        self.loading_lang.is_some()
    }
}

impl<D: fmt::Debug> fmt::Debug for ViewProps<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewProps")
            .field("current_lang", &self.current_lang)
            .field("loading_lang", &self.loading_lang)
            .field("dictionary", &self.dictionary)
            .finish_non_exhaustive()
    }
}

/// Connects views to a coordinator.
pub struct ViewBinding<D, C = ()> {
    coordinator: SwitchCoordinator<D, C>,
    switch_lang: SwitchLangFn,
}

impl<D, C> Clone for ViewBinding<D, C> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            switch_lang: Arc::clone(&self.switch_lang),
        }
    }
}

impl<D, C> ViewBinding<D, C>
where
    D: Clone + EmptyDictionary + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Bind `switch_lang` to the host's dispatch function.
    pub fn new<F>(coordinator: SwitchCoordinator<D, C>, dispatch: F) -> Self
    where
        F: Fn(Action<()>) -> Result<(), SwitchError> + Send + Sync + 'static,
    {
        Self {
            coordinator,
            switch_lang: Arc::new(move |lang: &str| dispatch(Action::switch_lang(lang))),
        }
    }

    /// Bind `switch_lang` straight to the coordinator, for hosts without a
    /// pipeline of their own. `ctx` is handed to the switch callbacks.
    pub fn direct(coordinator: SwitchCoordinator<D, C>, ctx: C) -> Self {
        let target = coordinator.clone();
        Self::new(coordinator, move |action| target.handle(action, &ctx, |_| ()))
    }

    /// Current props, read from the store.
    pub fn props(&self) -> ViewProps<D> {
        ViewProps {
            current_lang: self.coordinator.current_lang(),
            loading_lang: self.coordinator.loading_lang(),
            dictionary: self.coordinator.current_dictionary().unwrap_or_else(D::empty),
            switch_lang: Arc::clone(&self.switch_lang),
        }
    }

    /// Mount a view: render it now and again on every notification.
    pub fn mount<V>(&self, view: V) -> Mounted
    where
        V: Fn(ViewProps<D>) + Send + Sync + 'static,
    {
        view(self.props());

        let binding = self.clone();
        let subscriber: Arc<dyn Subscriber> = Arc::new(move || view(binding.props()));
        self.mount_subscriber(subscriber)
    }

    /// Mount a raw subscriber that reads state on its own.
    pub fn mount_subscriber(&self, subscriber: Arc<dyn Subscriber>) -> Mounted {
        let registry = Arc::clone(self.coordinator.subscribers());
        let id = registry.register(subscriber);
        Mounted { registry, id }
    }

    pub fn coordinator(&self) -> &SwitchCoordinator<D, C> {
        &self.coordinator
    }
}

/// A mounted view; unmounts on drop.
#[must_use = "dropping the guard unmounts the view immediately"]
pub struct Mounted {
    registry: Arc<SubscriberRegistry>,
    id: SubscriberId,
}

impl Mounted {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Unmount explicitly.
    pub fn unmount(self) {}
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

impl fmt::Debug for Mounted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mounted").field(&self.id).finish()
    }
}
