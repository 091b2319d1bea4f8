use crate::error::AggregatorError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// ASN -- Autonomous System Number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Asn {
    pub asn: u32,
}

impl Asn {
    pub const fn new(asn: u32) -> Self {
        Asn { asn }
    }

    /// Checks if the given ASN is public, i.e. not listed in IANA's "Special-Purpose AS Numbers"
    /// registry. Special-purpose numbers are never delegated by a RIR, so a registration lookup
    /// for them is pointless.
    ///
    /// For additional details see:
    ///  - <https://datatracker.ietf.org/doc/rfc7249/>
    ///  - <https://www.iana.org/assignments/iana-as-numbers-special-registry/iana-as-numbers-special-registry.xhtml>
    pub const fn is_public(&self) -> bool {
        match self.asn {
            0 => false,                       // reserved by RFC7607
            112 => false,                     // reserved by RFC7534
            23456 => false,                   // reserved by RFC6793
            64496..=64511 => false,           // reserved by RFC5398
            64512..=65534 => false,           // reserved by RFC6996
            65535 => false,                   // reserved by RFC7300
            65536..=65551 => false,           // reserved by RFC5398
            4200000000..=4294967294 => false, // reserved by RFC6996
            4294967295 => false,              // reserved by RFC7300
            _ => true,
        }
    }
}

impl PartialEq<u32> for Asn {
    fn eq(&self, other: &u32) -> bool {
        self.asn == *other
    }
}

impl From<u32> for Asn {
    fn from(v: u32) -> Self {
        Asn::new(v)
    }
}

impl From<Asn> for u32 {
    fn from(value: Asn) -> Self {
        value.asn
    }
}

impl FromStr for Asn {
    type Err = AggregatorError;

    /// Parses `64496` as well as the `AS64496` spelling used by WHOIS queries.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("AS")
            .or_else(|| s.strip_prefix("as"))
            .unwrap_or(s);
        digits
            .parse::<u32>()
            .map(Asn::new)
            .map_err(|_| AggregatorError::InvalidAsn(s.to_string()))
    }
}

impl Display for Asn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.asn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asn_is_public() {
        assert!(Asn::new(3356).is_public());
        assert!(!Asn::new(0).is_public());
        assert!(!Asn::new(23456).is_public());
        assert!(!Asn::new(64496).is_public());
        assert!(!Asn::new(4294967295).is_public());
    }

    #[test]
    fn test_fromstr() {
        assert_eq!(Asn::from_str("3356").unwrap(), 3356);
        assert_eq!(Asn::from_str("AS3356").unwrap(), 3356);
        assert_eq!(Asn::from_str(" as64496 ").unwrap(), 64496);
        assert!(Asn::from_str("AS").is_err());
        assert!(Asn::from_str("{3356}").is_err());
        assert!(Asn::from_str("4294967296").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Asn::from(3356).to_string(), "3356");
        assert_eq!(u32::from(Asn::new(7)), 7);
    }
}
