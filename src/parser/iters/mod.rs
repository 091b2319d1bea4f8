/*!
Iterator implementations for [DumpParser].

- `default`: [RecordIterator] logs and skips malformed lines;
- `fallible`: [FallibleRecordIterator] hands every error to the caller.
*/
pub mod default;
pub mod fallible;

pub use default::RecordIterator;
pub use fallible::FallibleRecordIterator;

use crate::models::PrefixRecord;
use crate::parser::DumpParser;
use std::io::Read;

/// Use [RecordIterator] as the default iterator.
impl<R: Read> IntoIterator for DumpParser<R> {
    type Item = PrefixRecord;
    type IntoIter = RecordIterator<R>;

    fn into_iter(self) -> Self::IntoIter {
        RecordIterator::new(self)
    }
}

impl<R> DumpParser<R> {
    pub fn into_record_iter(self) -> RecordIterator<R> {
        RecordIterator::new(self)
    }

    /// Creates an iterator that returns `Result<PrefixRecord, AggregatorError>`, so malformed
    /// lines can be handled by the caller.
    ///
    /// ```no_run
    /// use bgpkit_aggregator::DumpParser;
    ///
    /// let parser = DumpParser::new("rib.txt").unwrap();
    /// for result in parser.into_fallible_record_iter() {
    ///     match result {
    ///         Ok(record) => println!("{}", record),
    ///         Err(e) => eprintln!("{}", e),
    ///     }
    /// }
    /// ```
    pub fn into_fallible_record_iter(self) -> FallibleRecordIterator<R> {
        FallibleRecordIterator::new(self)
    }
}
