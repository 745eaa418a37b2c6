use serde::ser::{Serialize, SerializeMap, Serializer};

/// Run-scoped map from variable name to string value.
///
/// Append-only: keys keep insertion order and an existing key is never
/// overwritten. Keys offered again through [`Bindings::with`] or `collect()`
/// are remembered in [`Bindings::duplicates`] so a run can reject them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(String, String)>,
    duplicates: Vec<String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new key. Returns the rejected key if it was already bound.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), String> {
        let key = key.into();
        if self.contains(&key) {
            return Err(key);
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Builder-style insert. A repeated key keeps the first value and is
    /// recorded as a duplicate.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_or_record(key.into(), value.into());
        self
    }

    /// Keys that were offered more than once
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    fn insert_or_record(&mut self, key: String, value: String) {
        if let Err(key) = self.insert(key, value) {
            if !self.duplicates.contains(&key) {
                self.duplicates.push(key);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the given keys, in the order requested. Unknown keys are skipped.
    pub fn select<'a, I>(&self, keys: I) -> Bindings
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut out = Bindings::new();
        for key in keys {
            if let Some(value) = self.get(key) {
                out.entries.push((key.clone(), value.to_string()));
            }
        }
        out
    }

}

/// Values that are not strings are stringified on the way in
impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut bindings = Bindings::new();
        for (k, v) in iter {
            bindings.insert_or_record(k.into(), v.to_string());
        }
        bindings
    }
}

/// Serialized as a JSON-style object in insertion order
impl Serialize for Bindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
