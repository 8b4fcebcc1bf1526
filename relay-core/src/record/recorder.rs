use super::Record;

/// Writes records to an output destination.
pub trait Recorder {
    /// Write a record immediately.
    fn write(&mut self, record: Record);

    /// Store a record for later aggregation.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    ///
    /// `step` is a monotonically increasing counter of the caller, commonly
    /// the number of completed training episodes.
    fn flush(&mut self, step: i64);
}
