use crate::models::Network;

/// A node of the binary prefix trie.
///
/// A node sits at depth `d` and represents the `d`-bit prefix spelled by the path from the root.
/// When `network` is set, an inserted network of length `d` terminates here; otherwise the node
/// only branches.
#[derive(Debug, Default)]
pub(crate) struct TrieNode {
    pub(crate) children: [Option<Box<TrieNode>>; 2],
    pub(crate) network: Option<Network>,
    pub(crate) is_aggregated: bool,
}

impl TrieNode {
    #[inline]
    pub(crate) fn child(&self, bit: usize) -> Option<&TrieNode> {
        self.children[bit].as_deref()
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, bit: usize) -> Option<&mut TrieNode> {
        self.children[bit].as_deref_mut()
    }

    /// Returns the child for `bit`, creating it if missing. The flag tells whether a node was
    /// created.
    pub(crate) fn child_or_insert(&mut self, bit: usize) -> (&mut TrieNode, bool) {
        let created = self.children[bit].is_none();
        let child = self.children[bit].get_or_insert_with(Box::default);
        (child, created)
    }
}
