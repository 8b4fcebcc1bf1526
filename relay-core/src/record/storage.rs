//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;

/// A storage system for records with aggregation capabilities.
///
/// Scalar values are aggregated into min/max/mean/median entries; for other
/// value types the most recent entry wins.
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(*vs.iter().min_by(|x, y| x.total_cmp(y)).unwrap())
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(*vs.iter().min_by(|x, y| y.total_cmp(x)).unwrap())
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record in the storage.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn get_keys(&self) -> HashSet<String> {
        let mut keys = HashSet::new();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn find(&self, key: &str) -> &RecordValue {
        for record in self.data.iter() {
            if let Some(value) = record.get(key) {
                return value;
            }
        }
        panic!("Key '{}' was not found.", key);
    }

    /// Most recent entry of the given key, for non-scalar value types.
    fn latest(&self, key: &str) -> Record {
        for record in self.data.iter().rev() {
            if let Some(value) = record.get(key) {
                return Record::from_slice(&[(key, value.clone())]);
            }
        }
        panic!("Key '{}' was not found.", key);
    }

    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(v) => match v {
                    RecordValue::Scalar(v) => Some(*v),
                    _ => panic!("Expect RecordValue::Scalar for {}", key),
                },
                None => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_slice(&[(key, RecordValue::Scalar(vs[0]))])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ])
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
            let r = match self.find(key) {
                RecordValue::Scalar(..) => self.scalar(key),
                _ => self.latest(key),
            };
            record = record.merge(r);
        }

        self.data = vec![];

        record
    }
}

impl Default for RecordStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_scalars() {
        let mut storage = RecordStorage::new();
        for v in [1.0f32, 3.0, 2.0] {
            storage.store(Record::from_scalar("r", v));
        }
        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("r_min").unwrap(), 1.0);
        assert_eq!(agg.get_scalar("r_max").unwrap(), 3.0);
        assert_eq!(agg.get_scalar("r_mean").unwrap(), 2.0);
        assert_eq!(agg.get_scalar("r_median").unwrap(), 2.0);

        // A single entry passes through under its own key.
        storage.store(Record::from_scalar("r", 5.0));
        let agg = storage.aggregate();
        assert_eq!(agg.get_scalar("r").unwrap(), 5.0);
    }
}
