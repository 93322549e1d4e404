use crate::error::{Result, SettlementError};
use serde::de::DeserializeOwned;
use std::io::Read;

/// Reads typed rows from a CSV source.
///
/// Wraps `csv::Reader` and yields one `Result<T>` per row, so a malformed row
/// can be reported and skipped without abandoning the rest of the file.
/// Whitespace around fields is trimmed.
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RecordReader<R> {
    /// Creates a new `RecordReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes rows.
    pub fn records<T: DeserializeOwned>(self) -> impl Iterator<Item = Result<T>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(SettlementError::from))
    }
}
