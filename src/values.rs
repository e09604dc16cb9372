//! Interning of string labels into the small integers stored in a trie.
use std::collections::HashMap;

/// A value assigned to or read from a code point.
///
/// The trie only stores integers. A [`Value::Label`] is interned into the value
/// table on assignment, and integers that index the table are reported back as
/// labels by the `get_value()` lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Value<'a> {
    /// A raw integer.
    Int(u32),
    /// A string label.
    Label(&'a str),
}

impl From<u32> for Value<'_> {
    fn from(v: u32) -> Self {
        Self::Int(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Self::Label(s)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Self {
        Self::Label(s.as_str())
    }
}

/// Insertion-ordered table of labels, where the index of a label is its value.
#[derive(Default, Clone, Debug)]
pub(crate) struct ValueTable {
    labels: Vec<String>,
    ids: HashMap<String, u32>,
}

impl ValueTable {
    pub fn new(labels: Vec<String>) -> Self {
        let mut ids = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            // The first occurrence wins, as a lookup through the table would find.
            ids.entry(label.clone()).or_insert(i as u32);
        }
        Self { labels, ids }
    }

    /// Returns the integer for `value`, appending a new label if needed.
    pub fn intern(&mut self, value: Value) -> u32 {
        match value {
            Value::Int(v) => v,
            Value::Label(s) => {
                if let Some(&id) = self.ids.get(s) {
                    return id;
                }
                let id = self.labels.len() as u32;
                self.labels.push(s.to_owned());
                self.ids.insert(s.to_owned(), id);
                id
            }
        }
    }

    #[inline]
    pub fn id(&self, label: &str) -> Option<u32> {
        self.ids.get(label).copied()
    }

    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Maps a stored integer back to its label if it indexes the table.
    #[inline]
    pub fn resolve(&self, v: u32) -> Value {
        self.labels
            .get(v as usize)
            .map_or(Value::Int(v), |s| Value::Label(s))
    }

    #[inline]
    pub fn heap_bytes(&self) -> usize {
        self.labels
            .iter()
            .map(|s| s.capacity() * 2 + std::mem::size_of::<String>() * 2 + 4)
            .sum()
    }
}
