use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A text value per locale, e.g. `{"en": "Shoes", "de": "Schuhe"}`.
///
/// Backed by a `BTreeMap` so equality and serialization are independent of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(BTreeMap<String, String>);

impl LocalizedString {
    /// Creates an empty localized string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a localized string with a single locale.
    pub fn of(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new().with(locale, text)
    }

    /// Shorthand for a single English value.
    pub fn en(text: impl Into<String>) -> Self {
        Self::of("en", text)
    }

    /// Adds (or replaces) a locale value.
    #[must_use]
    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    /// Returns the value for a locale.
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
