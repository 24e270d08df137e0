//! Asynchronous dictionary loading and language switching for
//! action-dispatch pipelines.
//!
//! # Architecture
//!
//! - `store`: loaded dictionaries plus the current and loading language
//! - `coordinator`: the pipeline interceptor that switches languages
//! - `subscribers`: views to refresh when the store changes
//! - `binding`: props and a bound `switch_lang` for views
//! - `loader`: a ready-made loader reading JSON files from a directory
//!
//! # Example
//!
//! ```rust,ignore
//! use lang_switch::{Action, SwitchCoordinator, SwitchOptions};
//!
//! let coordinator = SwitchCoordinator::new(
//!     |lang: String| async move { fetch_dictionary(&lang).await },
//!     SwitchOptions::new(),
//! )?;
//!
//! coordinator.handle(Action::<()>::switch_lang("en"), &(), |action| next(action))?;
//! coordinator.settle().await;
//! assert_eq!(coordinator.current_lang().as_deref(), Some("en"));
//! ```

pub mod action;
pub mod binding;
pub mod coordinator;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod options;
pub mod store;
pub mod subscribers;

pub use action::{Action, WireAction, SWITCH_LANG};
pub use binding::{Mounted, SwitchLangFn, ViewBinding, ViewProps};
pub use coordinator::{DictionaryLoader, SwitchCoordinator};
pub use error::SwitchError;
pub use loader::JsonDirLoader;
pub use metrics::{MetricsReport, SwitchMetrics};
pub use options::{EndSwitchCallback, StartSwitchCallback, SwitchOptions};
pub use store::{DictionaryStore, EmptyDictionary, StatePatch, StoreState};
pub use subscribers::{Subscriber, SubscriberId, SubscriberRegistry};
