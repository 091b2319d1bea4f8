/*!
Fallible iterator that returns every error to the caller.
*/
use crate::error::AggregatorError;
use crate::models::PrefixRecord;
use crate::parser::DumpParser;
use std::io::Read;

/// Iterator over `Result<PrefixRecord, AggregatorError>`.
///
/// Parse errors do not end the iteration; the next call continues with the following line. An
/// I/O error is returned once and ends it.
pub struct FallibleRecordIterator<R> {
    parser: DumpParser<R>,
    finished: bool,
}

impl<R> FallibleRecordIterator<R> {
    pub(crate) fn new(parser: DumpParser<R>) -> Self {
        FallibleRecordIterator {
            parser,
            finished: false,
        }
    }
}

impl<R: Read> Iterator for FallibleRecordIterator<R> {
    type Item = Result<PrefixRecord, AggregatorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.parser.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e @ AggregatorError::ParseError { .. }) => Some(Err(e)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
