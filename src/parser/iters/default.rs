/*!
Default iterator that skips malformed lines.
*/
use crate::error::AggregatorError;
use crate::models::PrefixRecord;
use crate::parser::DumpParser;
use log::{error, warn};
use std::io::Read;

/// Iterator over [PrefixRecord]s. Malformed lines are logged and skipped; reading stops at the
/// first I/O error.
pub struct RecordIterator<R> {
    parser: DumpParser<R>,
    skipped: u64,
}

impl<R> RecordIterator<R> {
    pub(crate) fn new(parser: DumpParser<R>) -> Self {
        RecordIterator { parser, skipped: 0 }
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: Read> Iterator for RecordIterator<R> {
    type Item = PrefixRecord;

    fn next(&mut self) -> Option<PrefixRecord> {
        loop {
            match self.parser.next_record() {
                Ok(record) => return record,
                Err(AggregatorError::ParseError { line, reason }) => {
                    warn!("skipping line {}: {}", line, reason);
                    self.skipped += 1;
                }
                Err(e) => {
                    error!("{}", e);
                    return None;
                }
            }
        }
    }
}
