use anyhow::{bail, Result};
use std::fmt;
use std::sync::Arc;

/// Called when a switch request is accepted, before any loading starts.
pub type StartSwitchCallback<C> = Arc<dyn Fn(&str, &C) + Send + Sync>;

/// Called once the target language's dictionary is current.
pub type EndSwitchCallback<D, C> = Arc<dyn Fn(&str, &D, &C) + Send + Sync>;

/// Per-coordinator configuration, fixed once the coordinator is built.
///
/// `D` is the dictionary type, `C` the dispatch context handed to callbacks.
pub struct SwitchOptions<D, C = ()> {
    /// Reuse a previously loaded dictionary instead of reloading it
    pub cache: bool,

    /// On a cache hit, also reload the dictionary in the background
    pub update_cache_on_switch: bool,

    pub start_switch_callback: Option<StartSwitchCallback<C>>,
    pub end_switch_callback: Option<EndSwitchCallback<D, C>>,
}

impl<D, C> SwitchOptions<D, C> {
    pub fn new() -> Self {
        Self {
            cache: true,
            update_cache_on_switch: false,
            start_switch_callback: None,
            end_switch_callback: None,
        }
    }

    /// Load the boolean flags from the environment.
    ///
    /// Reads `LANG_SWITCH_CACHE` and `LANG_SWITCH_UPDATE_CACHE_ON_SWITCH`;
    /// unset variables keep their defaults. Callbacks are never configured
    /// from the environment.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::new();
        Ok(Self {
            cache: env_flag("LANG_SWITCH_CACHE")?.unwrap_or(defaults.cache),
            update_cache_on_switch: env_flag("LANG_SWITCH_UPDATE_CACHE_ON_SWITCH")?
                .unwrap_or(defaults.update_cache_on_switch),
            ..defaults
        })
    }

    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_update_cache_on_switch(mut self, update: bool) -> Self {
        self.update_cache_on_switch = update;
        self
    }

    pub fn on_start_switch<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &C) + Send + Sync + 'static,
    {
        self.start_switch_callback = Some(Arc::new(callback));
        self
    }

    pub fn on_end_switch<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &D, &C) + Send + Sync + 'static,
    {
        self.end_switch_callback = Some(Arc::new(callback));
        self
    }
}

impl<D, C> Default for SwitchOptions<D, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, C> Clone for SwitchOptions<D, C> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache,
            update_cache_on_switch: self.update_cache_on_switch,
            start_switch_callback: self.start_switch_callback.clone(),
            end_switch_callback: self.end_switch_callback.clone(),
        }
    }
}

impl<D, C> fmt::Debug for SwitchOptions<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchOptions")
            .field("cache", &self.cache)
            .field("update_cache_on_switch", &self.update_cache_on_switch)
            .field("start_switch_callback", &self.start_switch_callback.is_some())
            .field("end_switch_callback", &self.end_switch_callback.is_some())
            .finish()
    }
}

/// Read an optional boolean environment variable.
fn env_flag(name: &str) -> Result<Option<bool>> {
    let raw = match std::env::var(name) {
        Ok(value) => value,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("{} is not valid unicode", name)))
        }
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => bail!("{} must be a boolean, got '{}'", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("LANG_SWITCH_CACHE");
        std::env::remove_var("LANG_SWITCH_UPDATE_CACHE_ON_SWITCH");
    }

    #[test]
    fn test_defaults() {
        let options: SwitchOptions<()> = SwitchOptions::default();
        assert!(options.cache);
        assert!(!options.update_cache_on_switch);
        assert!(options.start_switch_callback.is_none());
        assert!(options.end_switch_callback.is_none());
    }

    #[test]
    fn test_builder() {
        let options: SwitchOptions<String> = SwitchOptions::new()
            .with_cache(false)
            .with_update_cache_on_switch(true)
            .on_start_switch(|_, _| {})
            .on_end_switch(|_, _, _| {});

        assert!(!options.cache);
        assert!(options.update_cache_on_switch);
        assert!(options.start_switch_callback.is_some());
        assert!(options.end_switch_callback.is_some());
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let options: SwitchOptions<()> = SwitchOptions::new().on_start_switch(|_, _| {});
        let debug = format!("{:?}", options);
        assert!(debug.contains("start_switch_callback: true"));
        assert!(debug.contains("end_switch_callback: false"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_when_unset() {
        clear_env();
        let options: SwitchOptions<()> = SwitchOptions::from_env().expect("Should load");
        assert!(options.cache);
        assert!(!options.update_cache_on_switch);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_flags() {
        clear_env();
        std::env::set_var("LANG_SWITCH_CACHE", "false");
        std::env::set_var("LANG_SWITCH_UPDATE_CACHE_ON_SWITCH", "1");

        let options: SwitchOptions<()> = SwitchOptions::from_env().expect("Should load");
        assert!(!options.cache);
        assert!(options.update_cache_on_switch);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        clear_env();
        std::env::set_var("LANG_SWITCH_CACHE", "sometimes");

        let result: Result<SwitchOptions<()>> = SwitchOptions::from_env();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("LANG_SWITCH_CACHE"));
        clear_env();
    }
}
