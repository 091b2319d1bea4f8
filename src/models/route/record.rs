use crate::models::{AsPath, Asn, Network};
use std::fmt::{Display, Formatter};

/// One announced prefix together with the AS path it was seen with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefixRecord {
    pub network: Network,
    pub as_path: AsPath,
}

impl PrefixRecord {
    pub fn new(network: Network, as_path: AsPath) -> PrefixRecord {
        PrefixRecord { network, as_path }
    }

    /// Origin AS of the announcement, used as the grouping key for per-origin aggregation.
    pub fn origin(&self) -> Option<Asn> {
        self.as_path.origin()
    }
}

impl Display for PrefixRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.network, self.as_path)
    }
}
