use crate::error::AggregatorError;
use ipnet::{IpNet, Ipv6Net};
use std::fmt::{Debug, Display, Formatter};
use std::net::Ipv6Addr;
use std::str::FromStr;

/// Number of bits in the address space every [Network] lives in.
pub const ADDRESS_BITS: u8 = 128;

/// An IPv6 network prefix as a 128-bit address plus a prefix length.
///
/// Host bits beyond the prefix length are always cleared, so two values written with different
/// host bits compare equal. The derived ordering sorts by prefix length first and address second,
/// which is the order the aggregation engine processes networks in.
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Network {
    // field order drives the derived `Ord`
    prefix_len: u8,
    address: u128,
}

impl Network {
    /// Creates a new network, clearing any host bits set in `address`.
    ///
    /// Fails with [AggregatorError::InvalidNetwork] if `prefix_len` is larger than 128.
    ///
    /// ```rust
    /// use bgpkit_aggregator::models::Network;
    ///
    /// let network = Network::new(0x2001_0db8_0000_0000_0000_0000_0000_0001, 32).unwrap();
    /// assert_eq!(network.to_string(), "2001:db8::/32");
    /// assert!(Network::new(0, 129).is_err());
    /// ```
    pub fn new(address: u128, prefix_len: u8) -> Result<Network, AggregatorError> {
        if prefix_len > ADDRESS_BITS {
            return Err(AggregatorError::InvalidNetwork {
                input: format!("{}/{}", Ipv6Addr::from(address), prefix_len),
                reason: "prefix length exceeds 128 bits",
            });
        }
        Ok(Network {
            prefix_len,
            address: address & mask(prefix_len),
        })
    }

    pub const fn address(&self) -> u128 {
        self.address
    }

    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn to_ipv6_net(&self) -> Ipv6Net {
        Ipv6Net::new(Ipv6Addr::from(self.address), self.prefix_len)
            .unwrap_or_else(|_| unreachable!("prefix length is at most 128 by construction"))
    }

    /// Returns the bit at `index` (0 is the most significant bit) as a child slot index.
    #[inline]
    pub(crate) fn bit(&self, index: u8) -> usize {
        ((self.address >> (ADDRESS_BITS - 1 - index)) & 1) as usize
    }

    /// Iterates over the prefix bits, most significant first.
    pub(crate) fn prefix_bits(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.prefix_len).map(move |i| self.bit(i))
    }

    /// Number of addresses covered by this network, `None` for `::/0` whose size does not fit
    /// in 128 bits.
    pub fn block_size(&self) -> Option<u128> {
        match self.prefix_len {
            0 => None,
            len => Some(1u128 << (ADDRESS_BITS - len)),
        }
    }

    /// First address after the block covered by this network, `None` when the block ends at the
    /// top of the address space.
    pub fn next_block_address(&self) -> Option<u128> {
        self.address.checked_add(self.block_size()?)
    }

    /// The other half of the enclosing `prefix_len - 1` network.
    ///
    /// ```rust
    /// use std::str::FromStr;
    /// use bgpkit_aggregator::models::Network;
    ///
    /// let lower = Network::from_str("2001:db8::/33").unwrap();
    /// let upper = Network::from_str("2001:db8:8000::/33").unwrap();
    /// assert_eq!(lower.sibling(), Some(upper));
    /// assert_eq!(upper.sibling(), Some(lower));
    /// ```
    pub fn sibling(&self) -> Option<Network> {
        let block = self.block_size()?;
        Some(Network {
            prefix_len: self.prefix_len,
            address: self.address ^ block,
        })
    }

    /// Whether this network is the upper (last-bit-one) half of its enclosing network.
    pub fn is_upper_half(&self) -> bool {
        match self.prefix_len {
            0 => false,
            len => self.bit(len - 1) == 1,
        }
    }

    /// The enclosing network one bit shorter.
    pub fn parent(&self) -> Option<Network> {
        let prefix_len = self.prefix_len.checked_sub(1)?;
        Some(Network {
            prefix_len,
            address: self.address & mask(prefix_len),
        })
    }

    /// Checks whether `other` falls within this network (a network contains itself).
    pub fn contains(&self, other: &Network) -> bool {
        self.prefix_len <= other.prefix_len && other.address & mask(self.prefix_len) == self.address
    }
}

#[inline]
fn mask(prefix_len: u8) -> u128 {
    match prefix_len {
        0 => 0,
        len => u128::MAX << (ADDRESS_BITS - len),
    }
}

impl From<Ipv6Net> for Network {
    fn from(prefix: Ipv6Net) -> Self {
        Network {
            prefix_len: prefix.prefix_len(),
            address: u128::from(prefix.network()),
        }
    }
}

impl From<Network> for Ipv6Net {
    fn from(network: Network) -> Self {
        network.to_ipv6_net()
    }
}

impl TryFrom<IpNet> for Network {
    type Error = AggregatorError;

    fn try_from(prefix: IpNet) -> Result<Self, Self::Error> {
        match prefix {
            IpNet::V6(v6) => Ok(Network::from(v6)),
            IpNet::V4(v4) => Err(AggregatorError::InvalidNetwork {
                input: v4.to_string(),
                reason: "not an IPv6 prefix",
            }),
        }
    }
}

impl TryFrom<(Ipv6Addr, u8)> for Network {
    type Error = AggregatorError;

    fn try_from((address, prefix_len): (Ipv6Addr, u8)) -> Result<Self, Self::Error> {
        Ok(Network::from(Ipv6Net::new(address, prefix_len)?))
    }
}

impl FromStr for Network {
    type Err = AggregatorError;

    /// Parses an IPv6 prefix in non-strict mode: host bits are accepted and cleared.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let prefix = IpNet::from_str(s).map_err(|_| AggregatorError::InvalidNetwork {
            input: s.to_string(),
            reason: "cannot parse prefix",
        })?;
        Network::try_from(prefix)
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", Ipv6Addr::from(self.address), self.prefix_len)
    }
}

// Attempt to reduce the size of the debug output
impl Debug for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Network {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            self.to_ipv6_net().serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Network {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ipv6Net::deserialize(deserializer).map(Network::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fromstr() {
        let network = Network::from_str("2001:db8::/32").unwrap();
        assert_eq!(network.address(), 0x2001_0db8 << 96);
        assert_eq!(network.prefix_len(), 32);

        // host bits are cleared
        let loose = Network::from_str(" 2001:db8:ffff::1/32 ").unwrap();
        assert_eq!(loose, network);

        assert!(matches!(
            Network::from_str("192.168.0.0/24"),
            Err(AggregatorError::InvalidNetwork { .. })
        ));
        assert!(Network::from_str("2001:db8::/129").is_err());
        assert!(Network::from_str("not-a-prefix").is_err());
    }

    #[test]
    fn test_new() {
        let network = Network::new(u128::MAX, 0).unwrap();
        assert_eq!(network.address(), 0);
        let network = Network::new(u128::MAX, 128).unwrap();
        assert_eq!(network.address(), u128::MAX);
        assert!(matches!(
            Network::new(0, 129),
            Err(AggregatorError::InvalidNetwork { .. })
        ));
    }

    #[test]
    fn test_try_from_parts() {
        let address = Ipv6Addr::from_str("2001:db8::1").unwrap();
        let network = Network::try_from((address, 32)).unwrap();
        assert_eq!(network, Network::from_str("2001:db8::/32").unwrap());
        assert!(matches!(
            Network::try_from((address, 200)),
            Err(AggregatorError::InvalidPrefixLength(_))
        ));
    }

    #[test]
    fn test_ordering() {
        let mut networks = vec![
            Network::from_str("2001:db8:1::/48").unwrap(),
            Network::from_str("2001:db9::/32").unwrap(),
            Network::from_str("2001:db8::/48").unwrap(),
            Network::from_str("2001:db8::/32").unwrap(),
        ];
        networks.sort();
        let sorted = networks.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(
            sorted,
            vec![
                "2001:db8::/32",
                "2001:db9::/32",
                "2001:db8::/48",
                "2001:db8:1::/48"
            ]
        );
    }

    #[test]
    fn test_bits() {
        let network = Network::from_str("8000::/1").unwrap();
        assert_eq!(network.prefix_bits().collect::<Vec<_>>(), vec![1]);

        let network = Network::from_str("2001:db8::/16").unwrap();
        let bits = network.prefix_bits().collect::<Vec<_>>();
        assert_eq!(bits, vec![0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_block_arithmetic() {
        let lower = Network::from_str("2001:db8::/33").unwrap();
        let upper = Network::from_str("2001:db8:8000::/33").unwrap();
        assert_eq!(lower.block_size(), Some(1 << 95));
        assert_eq!(lower.next_block_address(), Some(upper.address()));
        assert!(!lower.is_upper_half());
        assert!(upper.is_upper_half());
        assert_eq!(upper.sibling(), Some(lower));
        assert_eq!(
            upper.parent(),
            Some(Network::from_str("2001:db8::/32").unwrap())
        );

        let everything = Network::from_str("::/0").unwrap();
        assert_eq!(everything.block_size(), None);
        assert_eq!(everything.next_block_address(), None);
        assert_eq!(everything.sibling(), None);
        assert_eq!(everything.parent(), None);

        let last = Network::from_str("ffff::/16").unwrap();
        assert_eq!(last.next_block_address(), None);
    }

    #[test]
    fn test_contains() {
        let supernet = Network::from_str("2001:db8::/32").unwrap();
        let subnet = Network::from_str("2001:db8:1::/48").unwrap();
        let other = Network::from_str("2001:db9::/48").unwrap();
        assert!(supernet.contains(&subnet));
        assert!(supernet.contains(&supernet));
        assert!(!subnet.contains(&supernet));
        assert!(!supernet.contains(&other));
        assert!(Network::from_str("::/0").unwrap().contains(&other));
    }

    #[test]
    fn test_display() {
        let network = Network::from_str("2001:db8:8000::/33").unwrap();
        assert_eq!(network.to_string(), "2001:db8:8000::/33");
        assert_eq!(format!("{network:?}"), "2001:db8:8000::/33");
        assert_eq!(
            Ipv6Net::from(network),
            Ipv6Net::from_str("2001:db8:8000::/33").unwrap()
        );
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_serialization() {
        let network = Network::from_str("2001:db8::/32").unwrap();
        let serialized = serde_json::to_string(&network).unwrap();
        assert_eq!(serialized, "\"2001:db8::/32\"");
        let deserialized: Network = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, network);
    }
}
