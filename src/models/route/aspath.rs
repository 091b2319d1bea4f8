use crate::error::AggregatorError;
use crate::models::Asn;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A flattened AS path as it appears in text dumps.
///
/// AS sets (`{64496,64497}`) are flattened into their members, so the path length counts every
/// ASN that appears in the text and the origin is the last ASN written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AsPath {
    asns: Vec<Asn>,
}

impl AsPath {
    pub fn new() -> AsPath {
        AsPath::default()
    }

    /// Shorthand for creating a path from a plain sequence of ASNs.
    pub fn from_sequence<S: AsRef<[u32]>>(seq: S) -> Self {
        AsPath {
            asns: seq.as_ref().iter().copied().map_into().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.asns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asn> {
        self.asns.iter()
    }

    /// The originating AS, i.e. the last ASN on the path.
    pub fn origin(&self) -> Option<Asn> {
        self.asns.last().copied()
    }

    pub fn contains_asn(&self, asn: Asn) -> bool {
        self.asns.contains(&asn)
    }
}

impl FromStr for AsPath {
    type Err = AggregatorError;

    /// Parses a textual AS path such as `3356 1299 {64496,64497}`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.replace(['{', '}'], "").replace(',', " ");
        let asns = cleaned
            .split_whitespace()
            .map(Asn::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AsPath { asns })
    }
}

impl Display for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.asns.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence() {
        let path = AsPath::from_str("3356 1299 64496").unwrap();
        assert_eq!(path, AsPath::from_sequence([3356, 1299, 64496]));
        assert_eq!(path.len(), 3);
        assert_eq!(path.origin(), Some(Asn::new(64496)));
        assert!(path.contains_asn(Asn::new(1299)));
    }

    #[test]
    fn test_parse_as_set() {
        let path = AsPath::from_str("3356 {64496,64497}").unwrap();
        assert_eq!(path, AsPath::from_sequence([3356, 64496, 64497]));
        assert_eq!(path.origin(), Some(Asn::new(64497)));

        let path = AsPath::from_str(" 174  {64500} ").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.origin(), Some(Asn::new(64500)));
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        let path = AsPath::from_str("   ").unwrap();
        assert!(path.is_empty());
        assert_eq!(path.origin(), None);

        assert!(matches!(
            AsPath::from_str("3356 x1299"),
            Err(AggregatorError::InvalidAsn(_))
        ));
    }

    #[test]
    fn test_display() {
        let path = AsPath::from_str("3356 {64496,64497}").unwrap();
        assert_eq!(path.to_string(), "3356 64496 64497");
        assert_eq!(AsPath::new().to_string(), "");
    }
}
