//! Base implementation of records for logging.
use crate::error::RelayError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        hash_map::{IntoIter, Iter, Keys},
        HashMap,
    },
    convert::Into,
    iter::IntoIterator,
};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value, useful for storing labels or descriptions.
    String(String),
}

/// A container for storing key-value pairs of various data types.
///
/// Records are emitted by environments, agents and the trainer, merged, and
/// handed to a [`Recorder`](super::Recorder).
#[derive(Debug)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator over key-value pairs, consuming the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges records, the rhs overwriting entries with the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets scalar value.
    ///
    /// * `key` - The key of the entry.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RelayError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Scalar(v) => Ok(*v),
                _ => Err(RelayError::RecordValueType(k.into())),
            }
        } else {
            Err(RelayError::RecordKeyNotFound(k.into()))
        }
    }

    /// Gets Array1 value.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RelayError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::Array1(v) => Ok(v.clone()),
                _ => Err(RelayError::RecordValueType(k.into())),
            }
        } else {
            Err(RelayError::RecordKeyNotFound(k.into()))
        }
    }

    /// Gets String value.
    pub fn get_string(&self, k: &str) -> Result<String, RelayError> {
        if let Some(v) = self.0.get(k) {
            match v {
                RecordValue::String(s) => Ok(s.clone()),
                _ => Err(RelayError::RecordValueType(k.into())),
            }
        } else {
            Err(RelayError::RecordKeyNotFound(k.into()))
        }
    }

    /// True if the record has no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Record, RecordValue};

    #[test]
    fn insert_get_merge() {
        let mut r1 = Record::from_scalar("loss", 0.5);
        r1.insert("episode", RecordValue::Scalar(10.0));
        let r2 = Record::from_slice(&[("loss", RecordValue::Scalar(0.25))]);

        let merged = r1.merge(r2);
        assert_eq!(merged.get_scalar("loss").unwrap(), 0.25);
        assert_eq!(merged.get_scalar("episode").unwrap(), 10.0);
        assert!(merged.get_scalar("missing").is_err());
    }
}
