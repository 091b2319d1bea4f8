/*!
Binary prefix trie over the 128-bit IPv6 address space.

Every inserted [Network] is stored at depth `prefix_len`, on the path spelled by its prefix bits
(most significant bit first). Any network stored on the path of another, shorter than it, is a
covering supernet by construction; this is what [PrefixTrie::find_supernet] exploits.
*/
mod node;

use crate::error::AggregatorError;
use crate::models::Network;
use log::debug;
use node::TrieNode;

/// Binary trie of IPv6 networks with per-network aggregation marks.
///
/// The trie only grows: nodes are created lazily on insertion and never removed.
///
/// ```rust
/// use std::str::FromStr;
/// use bgpkit_aggregator::models::Network;
/// use bgpkit_aggregator::PrefixTrie;
///
/// let mut trie = PrefixTrie::new();
/// trie.insert(Network::from_str("2001:db8::/32").unwrap());
///
/// let subnet = Network::from_str("2001:db8:1::/48").unwrap();
/// assert_eq!(
///     trie.find_supernet_or_contiguous(&subnet),
///     Some(Network::from_str("2001:db8::/32").unwrap())
/// );
/// ```
#[derive(Debug, Default)]
pub struct PrefixTrie {
    root: TrieNode,
    len: usize,
    node_count: usize,
}

impl PrefixTrie {
    pub fn new() -> PrefixTrie {
        PrefixTrie::default()
    }

    /// Number of distinct networks stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of nodes below the root, branching nodes included.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Inserts a network, creating any missing node on its path.
    ///
    /// Re-inserting an equal network leaves the trie unchanged, including its aggregation mark.
    pub fn insert(&mut self, network: Network) {
        let mut created = 0;
        let mut node = &mut self.root;
        for bit in network.prefix_bits() {
            let (child, is_new) = node.child_or_insert(bit);
            created += usize::from(is_new);
            node = child;
        }
        if node.network.replace(network).is_none() {
            self.len += 1;
        }
        self.node_count += created;
    }

    /// Checks whether exactly this network was inserted.
    pub fn contains(&self, network: &Network) -> bool {
        self.stored(network).is_some()
    }

    /// Checks whether this network was inserted and then marked by
    /// [PrefixTrie::mark_as_aggregated].
    pub fn is_aggregated(&self, network: &Network) -> bool {
        self.node(network)
            .map(|node| node.is_aggregated && node.network.as_ref() == Some(network))
            .unwrap_or(false)
    }

    /// Finds a network `network` could be merged with: a contiguous same-length neighbor if one is
    /// stored, otherwise the most specific strict supernet on its path.
    ///
    /// Contiguity takes precedence over a supernet when both exist.
    pub fn find_supernet_or_contiguous(&self, network: &Network) -> Option<Network> {
        self.find_contiguous(network)
            .or_else(|| self.find_supernet(network))
    }

    /// Walks `network`'s bits from the root and returns the deepest stored network strictly
    /// shorter than it. The walk stops at the first missing child.
    ///
    /// The root itself is never a candidate, so an inserted `::/0` does not cover anything.
    pub fn find_supernet(&self, network: &Network) -> Option<Network> {
        let mut node = &self.root;
        let mut candidate = None;
        // nodes deeper than prefix_len - 1 only hold networks at least as long as `network`
        for bit in network.prefix_bits() {
            node = match node.child(bit) {
                Some(child) => child,
                None => break,
            };
            if let Some(stored) = node.network {
                if stored.prefix_len() < network.prefix_len() {
                    candidate = Some(stored);
                }
            }
        }
        candidate
    }

    /// Returns the stored same-length network whose block immediately precedes `network`'s block
    /// and which merges with it into one network a bit shorter.
    ///
    /// Only the upper half of a pair finds its partner. The lower half is always processed first
    /// by the aggregation engine, so each mergeable pair yields exactly one match.
    pub fn find_contiguous(&self, network: &Network) -> Option<Network> {
        if !network.is_upper_half() {
            return None;
        }
        let sibling = network.sibling()?;
        self.stored(&sibling)
            .filter(|stored| stored.next_block_address() == Some(network.address()))
    }

    /// Marks an inserted network as aggregated. Returns whether a mark was set.
    ///
    /// Marking a network whose path was never inserted is a no-op; the condition is logged at
    /// debug level. Use [PrefixTrie::try_mark_as_aggregated] to observe it as an error.
    pub fn mark_as_aggregated(&mut self, network: &Network) -> bool {
        match self.try_mark_as_aggregated(network) {
            Ok(marked) => marked,
            Err(e) => {
                debug!("skip aggregation mark: {}", e);
                false
            }
        }
    }

    /// Marks an inserted network as aggregated.
    ///
    /// Returns `Ok(false)` when the path exists but ends at a node that stores no network or a
    /// different one, and [AggregatorError::PrecursorMissing] when the path does not exist.
    pub fn try_mark_as_aggregated(&mut self, network: &Network) -> Result<bool, AggregatorError> {
        let node = self
            .node_mut(network)
            .ok_or(AggregatorError::PrecursorMissing(*network))?;
        if node.network.as_ref() == Some(network) {
            node.is_aggregated = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Iterates over stored networks in pre-order: ascending address, shorter prefix first.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            nodes: self.nodes(),
        }
    }

    /// Iterates over stored networks that have been marked as aggregated.
    pub fn aggregated(&self) -> impl Iterator<Item = Network> + '_ {
        self.nodes()
            .filter(|node| node.is_aggregated)
            .filter_map(|node| node.network)
    }

    fn nodes(&self) -> NodeIter<'_> {
        NodeIter {
            stack: vec![&self.root],
        }
    }

    /// Node at the end of `network`'s prefix path, if the path exists.
    fn node(&self, network: &Network) -> Option<&TrieNode> {
        let mut node = &self.root;
        for bit in network.prefix_bits() {
            node = node.child(bit)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, network: &Network) -> Option<&mut TrieNode> {
        let mut node = &mut self.root;
        for bit in network.prefix_bits() {
            node = node.child_mut(bit)?;
        }
        Some(node)
    }

    fn stored(&self, network: &Network) -> Option<Network> {
        self.node(network)?
            .network
            .filter(|stored| stored == network)
    }
}

impl Extend<Network> for PrefixTrie {
    fn extend<T: IntoIterator<Item = Network>>(&mut self, iter: T) {
        for network in iter {
            self.insert(network);
        }
    }
}

impl FromIterator<Network> for PrefixTrie {
    fn from_iter<T: IntoIterator<Item = Network>>(iter: T) -> Self {
        let mut trie = PrefixTrie::new();
        trie.extend(iter);
        trie
    }
}

impl<'a> IntoIterator for &'a PrefixTrie {
    type Item = Network;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct NodeIter<'a> {
    stack: Vec<&'a TrieNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a TrieNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // push the one-branch first so the zero-branch is visited first
        self.stack.extend(node.child(1));
        self.stack.extend(node.child(0));
        Some(node)
    }
}

/// Iterator over the networks stored in a [PrefixTrie], see [PrefixTrie::iter].
pub struct Iter<'a> {
    nodes: NodeIter<'a>,
}

impl Iterator for Iter<'_> {
    type Item = Network;

    fn next(&mut self) -> Option<Self::Item> {
        self.nodes.find_map(|node| node.network)
    }
}
