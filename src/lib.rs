/*!
bgpkit-aggregator estimates how much of the IPv6 routing table could be aggregated.

Announced prefixes are inserted into a binary [PrefixTrie]; the [Aggregator] then walks them
shortest prefix first and counts every prefix that has a covering supernet or a contiguous
same-length neighbor in the trie. Prefixes can be considered all together or separately per
origin AS, the latter matching what a single network operator could actually aggregate.

# Examples

## Aggregate prefixes from a routing table dump

```no_run
use bgpkit_aggregator::{AggregationOptions, Aggregator, DumpParser, Grouping, PrefixStats};

let records = DumpParser::new("rib.20240101.0000.txt.gz")
    .unwrap()
    .into_record_iter()
    .collect::<Vec<_>>();

let mut aggregator = Aggregator::new(AggregationOptions::default());
let result = aggregator.aggregate_records(&records, Grouping::OriginAs);
println!("{}", PrefixStats::compute(&records, &result));
```

## Aggregate an in-memory list

```rust
use std::str::FromStr;
use bgpkit_aggregator::models::Network;
use bgpkit_aggregator::{aggregate, AggregationOptions};

let networks = ["2001:db8::/33", "2001:db8:8000::/33"]
    .into_iter()
    .map(|s| Network::from_str(s).unwrap());
let result = aggregate(networks, AggregationOptions::default());
assert_eq!(result.aggregation_event_count, 1);
```

# Dump formats

The [DumpParser] (feature `parser`, enabled by default) reads pipe-separated text, either the
two-column `prefix|as_path` extract or full `bgpdump -m` output, from local files, optionally
gzip or bzip2 compressed. IPv4 announcements are skipped.

# Registration

[registry::summarize_unregistered] counts announcements whose origin (or any path) AS is not
registered according to a [registry::RegistrationLookup]. With the `whois` feature,
`registry::WhoisClient` fills a [registry::RegistrationCache] by querying WHOIS concurrently.
*/

pub mod aggregation;
pub mod error;
pub mod models;
#[cfg(feature = "parser")]
pub mod parser;
pub mod registry;
pub mod stats;
pub mod trie;

pub use aggregation::{
    aggregate, aggregate_by, AggregationOptions, AggregationResult, Aggregator, Grouping,
};
pub use error::AggregatorError;
#[cfg(feature = "parser")]
pub use parser::{DumpParser, FallibleRecordIterator, RecordIterator};
pub use stats::PrefixStats;
pub use trie::PrefixTrie;
