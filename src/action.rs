//! Actions flowing through the dispatch pipeline.
//!
//! The coordinator only cares about one kind of action: a request to switch
//! the active language. Every other action is the application's own business
//! and travels through the coordinator untouched as [`Action::App`].

use crate::error::SwitchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant of the switch-language action on the wire.
///
/// Namespaced so it cannot collide with an application's own action types.
pub const SWITCH_LANG: &str = "@@lang-switch/SWITCH_LANG";

/// An action as seen by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<A> {
    /// Request to make the payload language the active one.
    ///
    /// The payload is untyped so that a malformed request coming off the
    /// wire can still be represented and rejected by the coordinator.
    SwitchLang { payload: Value },

    /// Any other application action, passed through unchanged.
    App(A),
}

impl<A> Action<A> {
    /// Create a switch-language action for `lang`.
    pub fn switch_lang(lang: impl Into<String>) -> Self {
        Action::SwitchLang {
            payload: Value::String(lang.into()),
        }
    }

    /// Whether this is a switch-language action.
    pub fn is_switch_lang(&self) -> bool {
        matches!(self, Action::SwitchLang { .. })
    }

    /// Validate the switch payload and return the requested language.
    ///
    /// # Returns
    /// * `Ok(None)` for application actions
    /// * `Ok(Some(lang))` for a well-formed switch request
    /// * `Err` if the payload is not a string or is empty
    pub fn language(&self) -> Result<Option<&str>, SwitchError> {
        match self {
            Action::App(_) => Ok(None),
            Action::SwitchLang { payload } => match payload {
                Value::String(lang) if lang.is_empty() => Err(SwitchError::EmptyLanguage),
                Value::String(lang) => Ok(Some(lang.as_str())),
                other => Err(SwitchError::invalid_payload(other)),
            },
        }
    }
}

/// The host pipeline's standard `{ type, payload }` action shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl WireAction {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Convert into a typed action, keeping foreign actions intact.
    pub fn into_action(self) -> Action<WireAction> {
        if self.kind == SWITCH_LANG {
            Action::SwitchLang {
                payload: self.payload,
            }
        } else {
            Action::App(self)
        }
    }
}

impl From<Action<WireAction>> for WireAction {
    fn from(action: Action<WireAction>) -> Self {
        match action {
            Action::SwitchLang { payload } => WireAction::new(SWITCH_LANG, payload),
            Action::App(wire) => wire,
        }
    }
}
