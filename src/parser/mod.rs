/*!
Reader for textual routing table dumps.

Two pipe-separated layouts are understood:
- `prefix|as_path`, the two-column extract of a table dump;
- the full `bgpdump -m` layout (`TYPE|timestamp|B|peer_ip|peer_asn|prefix|as_path|...`), from
  which the prefix and AS path columns are taken.

Only IPv6 announcements are of interest: IPv4 prefixes and blank lines are skipped silently.
*/
pub mod iters;

use crate::error::AggregatorError;
use crate::models::{AsPath, Network, PrefixRecord};
use ipnet::IpNet;
use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

pub use iters::{FallibleRecordIterator, RecordIterator};

/// Minimum number of fields of a `bgpdump -m` line.
const BGPDUMP_MIN_FIELDS: usize = 7;
const BGPDUMP_PREFIX_FIELD: usize = 5;
const BGPDUMP_AS_PATH_FIELD: usize = 6;

/// Line-based dump parser over any reader.
///
/// ```no_run
/// use bgpkit_aggregator::DumpParser;
///
/// let parser = DumpParser::new("rib.20240101.0000.txt.gz").unwrap();
/// for record in parser {
///     println!("{}", record);
/// }
/// ```
pub struct DumpParser<R> {
    reader: BufReader<R>,
    line_no: u64,
    buf: String,
}

impl DumpParser<Box<dyn Read>> {
    /// Opens a local dump, decompressing it based on its file extension.
    pub fn new(path: &str) -> Result<Self, AggregatorError> {
        let reader: Box<dyn Read> = oneio::get_reader(path)?;
        Ok(DumpParser::from_reader(reader))
    }
}

impl<R: Read> DumpParser<R> {
    pub fn from_reader(reader: R) -> Self {
        DumpParser {
            reader: BufReader::new(reader),
            line_no: 0,
            buf: String::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Reads lines until the next IPv6 record. Returns `Ok(None)` at the end of input.
    pub fn next_record(&mut self) -> Result<Option<PrefixRecord>, AggregatorError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if let Some(record) = parse_line(&self.buf, self.line_no)? {
                return Ok(Some(record));
            }
        }
    }
}

/// Parses one dump line.
///
/// Returns `Ok(None)` for blank lines and IPv4 announcements.
pub fn parse_line(line: &str, line_no: u64) -> Result<Option<PrefixRecord>, AggregatorError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields = line.split('|').collect::<Vec<_>>();
    let (prefix, as_path) = match fields.len() {
        2 => (fields[0], fields[1]),
        n if n >= BGPDUMP_MIN_FIELDS => (
            fields[BGPDUMP_PREFIX_FIELD],
            fields[BGPDUMP_AS_PATH_FIELD],
        ),
        n => {
            return Err(AggregatorError::parse_error(
                line_no,
                format!(
                    "expected 2 or at least {} fields, found {}",
                    BGPDUMP_MIN_FIELDS, n
                ),
            ))
        }
    };

    let prefix = prefix.trim();
    let network = match IpNet::from_str(prefix) {
        Ok(IpNet::V6(net)) => Network::from(net),
        Ok(IpNet::V4(_)) => return Ok(None),
        Err(_) => {
            return Err(AggregatorError::parse_error(
                line_no,
                format!("cannot parse prefix {:?}", prefix),
            ))
        }
    };

    let as_path = AsPath::from_str(as_path)
        .map_err(|e| AggregatorError::parse_error(line_no, e.to_string()))?;
    if as_path.is_empty() {
        return Err(AggregatorError::parse_error(line_no, "empty AS path"));
    }

    Ok(Some(PrefixRecord::new(network, as_path)))
}
