/*!
error module defines the error types used in bgpkit-aggregator.
*/
use crate::models::Network;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregatorError {
    /// A prefix that cannot be represented as a [Network]: prefix length above 128, a non-IPv6
    /// prefix where an IPv6 one is required, or unparsable prefix text.
    ///
    /// ## Occurs during:
    ///  - Constructing a [Network] from raw parts or text
    ///  - Parsing the prefix column of a dump line
    #[error("invalid network {input}: {reason}")]
    InvalidNetwork { input: String, reason: &'static str },
    /// This error represents a [ipnet::PrefixLenError] error. It occurs if an address mask is
    /// larger than the length of the address it is being applied to.
    #[error("invalid network prefix mask")]
    InvalidPrefixLength(#[from] ipnet::PrefixLenError),
    /// An AS path token that is not a 32-bit AS number.
    #[error("invalid ASN {0:?}")]
    InvalidAsn(String),
    /// The trie was asked to walk a path that was never inserted.
    ///
    /// Only surfaced by [crate::PrefixTrie::try_mark_as_aggregated]; the infallible variants
    /// treat it as a no-op.
    #[error("no trie path for network {0}")]
    PrecursorMissing(Network),
    /// A malformed line in a routing table dump.
    #[error("line {line}: {reason}")]
    ParseError { line: u64, reason: String },
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[cfg(feature = "parser")]
    #[error(transparent)]
    OneIoError(#[from] oneio::OneIoError),
    #[cfg(feature = "whois")]
    #[error("cannot build whois worker pool: {0}")]
    WhoisPool(#[from] rayon::ThreadPoolBuildError),
    #[cfg(feature = "whois")]
    #[error("invalid whois marker pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl AggregatorError {
    pub(crate) fn parse_error<S: Into<String>>(line: u64, reason: S) -> Self {
        AggregatorError::ParseError {
            line,
            reason: reason.into(),
        }
    }
}
