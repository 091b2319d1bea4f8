/*!
Aggregation engine driving a [PrefixTrie] over a collection of networks.

The engine implements a greedy, order-dependent heuristic: networks are processed shortest
prefix first and each one that has a supernet or a contiguous neighbor in the trie counts as one
aggregation event. Networks can be processed as one global group or partitioned by an external
key (usually the origin AS). The trie is rebuilt for every run and shared by all of its groups,
while the skip state is scoped to the group being processed.
*/
use crate::models::{Network, PrefixRecord};
use crate::trie::PrefixTrie;
use log::{debug, info};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;

/// Switches between the behaviors of the aggregation heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregationOptions {
    /// Look for contiguous same-length neighbors in addition to supernets.
    pub contiguity: bool,
    /// Drop a network from a group's result when the group also holds a longer network at the
    /// same address.
    pub most_specific_filter: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        AggregationOptions {
            contiguity: true,
            most_specific_filter: true,
        }
    }
}

/// How networks are partitioned before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Grouping {
    /// All networks form a single group.
    Global,
    /// One group per origin AS.
    #[default]
    #[cfg_attr(feature = "cli", value(name = "origin"))]
    OriginAs,
}

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggregationResult {
    /// Networks involved in an aggregation decision, after per-group filtering.
    pub aggregated_networks: BTreeSet<Network>,
    /// Number of networks found to have a supernet or contiguous neighbor.
    pub aggregation_event_count: usize,
}

impl AggregationResult {
    /// Folds another (group) result into this one.
    pub fn merge(&mut self, other: AggregationResult) {
        self.aggregated_networks.extend(other.aggregated_networks);
        self.aggregation_event_count += other.aggregation_event_count;
    }
}

/// Owns the trie of an analysis run and applies the aggregation heuristic to it.
///
/// Each call to [Aggregator::aggregate] or [Aggregator::aggregate_by] is one run: the trie is
/// rebuilt from that call's networks only, all of them inserted before any group is processed,
/// so supernets and neighbors are found across group boundaries but never across runs. The trie
/// of the last run stays available through [Aggregator::trie].
///
/// ```rust
/// use std::str::FromStr;
/// use bgpkit_aggregator::models::Network;
/// use bgpkit_aggregator::{AggregationOptions, Aggregator};
///
/// let networks = ["2001:db8::/32", "2001:db8:1::/48", "2001:dba::/32"]
///     .into_iter()
///     .map(|s| Network::from_str(s).unwrap());
///
/// let mut aggregator = Aggregator::new(AggregationOptions::default());
/// let result = aggregator.aggregate(networks);
/// assert_eq!(result.aggregation_event_count, 1);
/// assert_eq!(result.aggregated_networks.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Aggregator {
    trie: PrefixTrie,
    options: AggregationOptions,
}

impl Aggregator {
    pub fn new(options: AggregationOptions) -> Aggregator {
        Aggregator {
            trie: PrefixTrie::new(),
            options,
        }
    }

    pub fn options(&self) -> &AggregationOptions {
        &self.options
    }

    /// Trie of the last run, with its aggregation marks.
    pub fn trie(&self) -> &PrefixTrie {
        &self.trie
    }

    /// Aggregates all networks as a single group.
    pub fn aggregate<I>(&mut self, networks: I) -> AggregationResult
    where
        I: IntoIterator<Item = Network>,
    {
        // BTreeSet dedupes and orders by (prefix_len, address)
        let group = networks.into_iter().collect::<BTreeSet<_>>();
        self.trie = group.iter().copied().collect();

        let result = self.aggregate_group(&group);
        info!(
            "global aggregation: {} events over {} networks",
            result.aggregation_event_count,
            group.len()
        );
        result
    }

    /// Aggregates networks partitioned by `key`. Groups are processed in ascending key order.
    ///
    /// A network that comes with several keys (a prefix announced by more than one origin)
    /// belongs to the smallest of them only, so it is evaluated once per run.
    pub fn aggregate_by<K, I>(&mut self, items: I) -> AggregationResult
    where
        K: Ord + Debug,
        I: IntoIterator<Item = (K, Network)>,
    {
        let mut owners: BTreeMap<Network, K> = BTreeMap::new();
        for (key, network) in items {
            match owners.entry(network) {
                Entry::Vacant(entry) => {
                    entry.insert(key);
                }
                Entry::Occupied(mut entry) => {
                    if key < *entry.get() {
                        entry.insert(key);
                    }
                }
            }
        }
        self.trie = owners.keys().copied().collect();

        let mut groups: BTreeMap<K, BTreeSet<Network>> = BTreeMap::new();
        for (network, key) in owners {
            groups.entry(key).or_default().insert(network);
        }

        let mut result = AggregationResult::default();
        for (key, group) in &groups {
            let group_result = self.aggregate_group(group);
            debug!(
                "group {:?}: {} events over {} networks",
                key,
                group_result.aggregation_event_count,
                group.len()
            );
            result.merge(group_result);
        }
        info!(
            "grouped aggregation: {} events over {} groups",
            result.aggregation_event_count,
            groups.len()
        );
        result
    }

    /// Aggregates the networks of parsed dump records with the given grouping.
    pub fn aggregate_records(
        &mut self,
        records: &[PrefixRecord],
        grouping: Grouping,
    ) -> AggregationResult {
        match grouping {
            Grouping::Global => self.aggregate(records.iter().map(|r| r.network)),
            Grouping::OriginAs => {
                self.aggregate_by(records.iter().map(|r| (r.origin(), r.network)))
            }
        }
    }

    fn aggregate_group(&mut self, group: &BTreeSet<Network>) -> AggregationResult {
        let mut aggregated = BTreeSet::new();
        let mut events = 0;

        for network in group {
            if aggregated.contains(network) {
                continue;
            }
            let partner = match self.options.contiguity {
                true => self.trie.find_supernet_or_contiguous(network),
                false => self.trie.find_supernet(network),
            };
            if let Some(partner) = partner {
                events += 1;
                aggregated.insert(*network);
                self.trie.mark_as_aggregated(network);
                aggregated.insert(partner);
            }
        }

        let aggregated_networks = match self.options.most_specific_filter {
            true => most_specific(aggregated),
            false => aggregated,
        };
        AggregationResult {
            aggregated_networks,
            aggregation_event_count: events,
        }
    }
}

/// Aggregates `networks` as a single group on a fresh trie.
pub fn aggregate<I>(networks: I, options: AggregationOptions) -> AggregationResult
where
    I: IntoIterator<Item = Network>,
{
    Aggregator::new(options).aggregate(networks)
}

/// Aggregates `(key, network)` pairs grouped by key on a fresh trie.
pub fn aggregate_by<K, I>(items: I, options: AggregationOptions) -> AggregationResult
where
    K: Ord + Debug,
    I: IntoIterator<Item = (K, Network)>,
{
    Aggregator::new(options).aggregate_by(items)
}

/// Keeps a network only if no other network in the set has the same address and a longer prefix.
fn most_specific(networks: BTreeSet<Network>) -> BTreeSet<Network> {
    let mut longest: HashMap<u128, u8> = HashMap::new();
    for network in &networks {
        let len = longest.entry(network.address()).or_default();
        *len = (*len).max(network.prefix_len());
    }
    networks
        .into_iter()
        .filter(|n| longest.get(&n.address()) == Some(&n.prefix_len()))
        .collect()
}
