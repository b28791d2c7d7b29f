use std::collections::HashMap;

use crate::api::handler::FromValue;
use crate::storage::Value;

/**
The key/value store shared between all handler invocations and the verdict bookkeeping.

Reads of unknown keys yield nothing rather than an error. The keys of the form `#last_eval_<property>#` are written by the [Verifier](crate::Verifier)
after every evaluation and hold the latest verdict of the property.
*/
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    entries: HashMap<String, Value>,
}

impl SharedState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key under which the last verdict of `property` is stored.
    pub fn last_eval_key(property: &str) -> String {
        format!("#last_eval_{}#", property)
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns a copy of the value stored under `key` or `default` if the key is unknown.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.entries.get(key).cloned().unwrap_or_else(|| default.into())
    }

    /// Reads the value under `key` converted into `T`.
    /// Returns `None` if the key is unknown or the value cannot be converted.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?.clone();
        T::from_value(value).ok()
    }

    /// Stores `value` under `key`, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes the entry under `key` and returns its value.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Decides whether a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The number of entries, including the verdict entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn set_last_eval(&mut self, property: &str, verdict: bool) {
        self.entries.insert(Self::last_eval_key(property), Value::Bool(verdict));
    }

    pub(crate) fn last_eval(&self, property: &str) -> Option<bool> {
        self.entries.get(&Self::last_eval_key(property)).and_then(Value::as_bool)
    }
}
