use crate::domain::product::CartItem;
use crate::error::{EngineError, Result};
use std::io::Read;

/// Reads cart items from a CSV source with `sku,quantity` rows.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<CartItem>`.
/// Whitespace is trimmed and record lengths are flexible, so a bad row
/// surfaces as one erroneous item instead of poisoning the stream.
pub struct CartReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CartReader<R> {
    /// Creates a new `CartReader` from any `Read` source (e.g. File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes cart items.
    pub fn items(self) -> impl Iterator<Item = Result<CartItem>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(EngineError::from))
    }
}
