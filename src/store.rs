//! Dictionary store: loaded dictionaries plus the active and loading language.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Dictionary types that have an empty mapping.
///
/// Views are handed this when no language is active yet.
pub trait EmptyDictionary {
    fn empty() -> Self;
}

impl EmptyDictionary for Value {
    /// `{}`, never `null`.
    fn empty() -> Self {
        Value::Object(Map::new())
    }
}

impl EmptyDictionary for Map<String, Value> {
    fn empty() -> Self {
        Map::new()
    }
}

impl<K: Eq + Hash, V, S: BuildHasher + Default> EmptyDictionary for HashMap<K, V, S> {
    fn empty() -> Self {
        HashMap::default()
    }
}

impl<K: Ord, V> EmptyDictionary for BTreeMap<K, V> {
    fn empty() -> Self {
        BTreeMap::new()
    }
}

/// Plain state of the dictionary store.
///
/// Every field defaults independently, so a partial snapshot such as
/// `{"currentLang": "en", "dictionaries": {"en": {...}}}` deserializes
/// into a complete state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreState<D> {
    /// Loaded dictionaries keyed by language code
    pub dictionaries: HashMap<String, D>,

    /// Language currently active, if any
    pub current_lang: Option<String>,

    /// Language currently being fetched, if any
    pub loading_lang: Option<String>,
}

impl<D> Default for StoreState<D> {
    fn default() -> Self {
        Self {
            dictionaries: HashMap::new(),
            current_lang: None,
            loading_lang: None,
        }
    }
}

/// A subset update of the store.
///
/// Fields left as `None` are not touched. `current_lang` and `loading_lang`
/// are doubly optional so that a patch can clear them.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePatch<D> {
    pub dictionaries: Option<HashMap<String, D>>,
    pub dictionary: Option<(String, D)>,
    pub current_lang: Option<Option<String>>,
    pub loading_lang: Option<Option<String>>,
}

impl<D> Default for StatePatch<D> {
    fn default() -> Self {
        Self {
            dictionaries: None,
            dictionary: None,
            current_lang: None,
            loading_lang: None,
        }
    }
}

impl<D> StatePatch<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole dictionary map.
    pub fn dictionaries(mut self, dictionaries: HashMap<String, D>) -> Self {
        self.dictionaries = Some(dictionaries);
        self
    }

    /// Insert or overwrite a single dictionary entry.
    pub fn dictionary(mut self, lang: impl Into<String>, dictionary: D) -> Self {
        self.dictionary = Some((lang.into(), dictionary));
        self
    }

    pub fn current_lang(mut self, lang: Option<&str>) -> Self {
        self.current_lang = Some(lang.map(str::to_string));
        self
    }

    pub fn loading_lang(mut self, lang: Option<&str>) -> Self {
        self.loading_lang = Some(lang.map(str::to_string));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_none()
            && self.dictionary.is_none()
            && self.current_lang.is_none()
            && self.loading_lang.is_none()
    }
}

impl<D> From<StoreState<D>> for StatePatch<D> {
    /// A full snapshot as a patch that overwrites every field.
    fn from(state: StoreState<D>) -> Self {
        Self {
            dictionaries: Some(state.dictionaries),
            dictionary: None,
            current_lang: Some(state.current_lang),
            loading_lang: Some(state.loading_lang),
        }
    }
}

/// In-memory dictionary store.
///
/// Reads are open to anyone holding the store; [`DictionaryStore::apply`]
/// is the single mutation entry point.
#[derive(Debug, Clone)]
pub struct DictionaryStore<D> {
    state: StoreState<D>,
}

impl<D> Default for DictionaryStore<D> {
    fn default() -> Self {
        Self::new(StoreState::default())
    }
}

impl<D> DictionaryStore<D> {
    pub fn new(initial: StoreState<D>) -> Self {
        Self { state: initial }
    }

    pub fn current_lang(&self) -> Option<&str> {
        self.state.current_lang.as_deref()
    }

    pub fn loading_lang(&self) -> Option<&str> {
        self.state.loading_lang.as_deref()
    }

    pub fn dictionary(&self, lang: &str) -> Option<&D> {
        self.state.dictionaries.get(lang)
    }

    pub fn contains(&self, lang: &str) -> bool {
        self.state.dictionaries.contains_key(lang)
    }

    /// Dictionary of the active language, if one is selected and loaded.
    pub fn current_dictionary(&self) -> Option<&D> {
        self.current_lang().and_then(|lang| self.dictionary(lang))
    }

    /// Apply a patch in one step.
    ///
    /// The dictionary map is written before the language fields, so a patch
    /// that both inserts a dictionary and activates it never exposes an
    /// active language without its dictionary.
    pub fn apply(&mut self, patch: StatePatch<D>) {
        if let Some(dictionaries) = patch.dictionaries {
            self.state.dictionaries = dictionaries;
        }
        if let Some((lang, dictionary)) = patch.dictionary {
            self.state.dictionaries.insert(lang, dictionary);
        }
        if let Some(current) = patch.current_lang {
            self.state.current_lang = current;
        }
        if let Some(loading) = patch.loading_lang {
            self.state.loading_lang = loading;
        }
    }
}

impl<D: Clone> DictionaryStore<D> {
    pub fn snapshot(&self) -> StoreState<D> {
        self.state.clone()
    }
}
