use super::{Record, RecordStorage, Recorder, RecordValue};
use log::info;

/// A recorder that emits aggregated records through the `log` crate.
///
/// Stored records are accumulated in a [`RecordStorage`]; on
/// [`Recorder::flush`] the aggregate is written as one `info!` line per key.
pub struct LogRecorder {
    storage: RecordStorage,
}

impl LogRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self {
            storage: RecordStorage::new(),
        }
    }

    fn log(step: i64, record: &Record) {
        let mut keys: Vec<_> = record.keys().collect();
        keys.sort();
        for k in keys {
            match record.get(k).unwrap() {
                RecordValue::Scalar(v) => info!("step {:>8} | {} = {:.4}", step, k, v),
                RecordValue::String(s) => info!("step {:>8} | {} = {}", step, k, s),
                RecordValue::DateTime(t) => info!("step {:>8} | {} = {}", step, k, t),
                RecordValue::Array1(a) => info!("step {:>8} | {} = [{} values]", step, k, a.len()),
            }
        }
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        Self::log(-1, &record);
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let record = self.storage.aggregate();
        Self::log(step, &record);
    }
}
