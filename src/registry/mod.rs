/*!
AS registration lookups.

The aggregation core never asks whether an AS is registered. Reports that want to know do so
through [RegistrationLookup], typically backed by a [RegistrationCache] filled once per run, for
example by the WHOIS client (feature `whois`).
*/
#[cfg(feature = "whois")]
mod whois;

#[cfg(feature = "whois")]
pub use whois::*;

use crate::models::{Asn, PrefixRecord};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

/// Answers whether an AS number is registered with a registry.
pub trait RegistrationLookup {
    fn is_registered(&self, asn: Asn) -> bool;
}

impl<F> RegistrationLookup for F
where
    F: Fn(Asn) -> bool,
{
    fn is_registered(&self, asn: Asn) -> bool {
        self(asn)
    }
}

/// Registration status memoized for one run.
///
/// ASNs that were never resolved count as unregistered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationCache {
    entries: HashMap<Asn, bool>,
}

impl RegistrationCache {
    pub fn new() -> RegistrationCache {
        RegistrationCache::default()
    }

    pub fn insert(&mut self, asn: Asn, registered: bool) {
        self.entries.insert(asn, registered);
    }

    /// Cached status, `None` if the ASN was never resolved.
    pub fn get(&self, asn: Asn) -> Option<bool> {
        self.entries.get(&asn).copied()
    }

    pub fn contains(&self, asn: Asn) -> bool {
        self.entries.contains_key(&asn)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RegistrationLookup for RegistrationCache {
    fn is_registered(&self, asn: Asn) -> bool {
        self.get(asn).unwrap_or(false)
    }
}

impl Extend<(Asn, bool)> for RegistrationCache {
    fn extend<T: IntoIterator<Item = (Asn, bool)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl FromIterator<(Asn, bool)> for RegistrationCache {
    fn from_iter<T: IntoIterator<Item = (Asn, bool)>>(iter: T) -> Self {
        RegistrationCache {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Which ASNs of a record are checked for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsnScope {
    /// Only the origin AS.
    #[default]
    Origin,
    /// Every distinct ASN on the AS path. A prepended ASN counts once per record.
    Path,
}

impl AsnScope {
    /// Distinct ASNs of `record` under this scope, in path order.
    pub fn asns(&self, record: &PrefixRecord) -> Vec<Asn> {
        match self {
            AsnScope::Origin => record.origin().into_iter().collect(),
            AsnScope::Path => record.as_path.iter().copied().unique().collect(),
        }
    }

    /// Distinct ASNs over all records under this scope, sorted.
    pub fn distinct_asns<'a, I>(&self, records: I) -> Vec<Asn>
    where
        I: IntoIterator<Item = &'a PrefixRecord>,
    {
        records
            .into_iter()
            .flat_map(|r| self.asns(r))
            .sorted()
            .dedup()
            .collect()
    }
}

/// Unregistered ASNs and the number of prefix announcements attributed to each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnregisteredSummary {
    pub scope: AsnScope,
    pub unregistered_asns: BTreeMap<Asn, usize>,
}

impl UnregisteredSummary {
    /// Number of distinct unregistered ASNs.
    pub fn asn_count(&self) -> usize {
        self.unregistered_asns.len()
    }

    /// Announcements attributed to unregistered ASNs. A record counts once per unregistered ASN
    /// it is attributed to.
    pub fn announcement_count(&self) -> usize {
        self.unregistered_asns.values().sum()
    }
}

impl Display for UnregisteredSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "unregistered ASNs ({:?}): {}, announcements: {}",
            self.scope,
            self.asn_count(),
            self.announcement_count()
        )?;
        for (asn, count) in &self.unregistered_asns {
            writeln!(f, "  {}: {}", asn, count)?;
        }
        Ok(())
    }
}

/// Attributes every record to its ASNs under `scope` and counts the ones `lookup` reports as
/// unregistered.
pub fn summarize_unregistered<L>(
    records: &[PrefixRecord],
    lookup: &L,
    scope: AsnScope,
) -> UnregisteredSummary
where
    L: RegistrationLookup + ?Sized,
{
    let mut unregistered_asns = BTreeMap::new();
    for record in records {
        for asn in scope.asns(record) {
            if !lookup.is_registered(asn) {
                *unregistered_asns.entry(asn).or_insert(0) += 1;
            }
        }
    }
    UnregisteredSummary {
        scope,
        unregistered_asns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AsPath, Network};
    use std::str::FromStr;

    fn record(prefix: &str, path: &[u32]) -> PrefixRecord {
        PrefixRecord::new(
            Network::from_str(prefix).unwrap(),
            AsPath::from_sequence(path),
        )
    }

    #[test]
    fn test_cache() {
        let mut cache = RegistrationCache::new();
        assert!(cache.is_empty());
        cache.insert(Asn::new(3356), true);
        cache.insert(Asn::new(64512), false);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(Asn::new(3356)), Some(true));
        assert_eq!(cache.get(Asn::new(1299)), None);
        assert!(cache.is_registered(Asn::new(3356)));
        assert!(!cache.is_registered(Asn::new(64512)));
        // never resolved
        assert!(!cache.is_registered(Asn::new(1299)));
    }

    #[test]
    fn test_scope_asns() {
        let r = record("2001:db8::/32", &[3356, 1299, 3356, 64496]);
        assert_eq!(AsnScope::Origin.asns(&r), vec![Asn::new(64496)]);
        assert_eq!(
            AsnScope::Path.asns(&r),
            vec![Asn::new(3356), Asn::new(1299), Asn::new(64496)]
        );

        let records = vec![r, record("2001:db9::/32", &[1299, 64497])];
        assert_eq!(
            AsnScope::Origin.distinct_asns(&records),
            vec![Asn::new(64496), Asn::new(64497)]
        );
        assert_eq!(AsnScope::Path.distinct_asns(&records).len(), 4);
    }

    #[test]
    fn test_summarize_unregistered() {
        let records = vec![
            record("2001:db8::/32", &[3356, 64496]),
            record("2001:db8:1::/48", &[3356, 64496]),
            record("2001:db9::/32", &[1299, 64497]),
            record("2001:dba::/32", &[1299, 3356]),
        ];
        let cache: RegistrationCache = [
            (Asn::new(3356), true),
            (Asn::new(1299), true),
            (Asn::new(64496), false),
        ]
        .into_iter()
        .collect();

        let summary = summarize_unregistered(&records, &cache, AsnScope::Origin);
        assert_eq!(summary.asn_count(), 2);
        assert_eq!(summary.announcement_count(), 3);
        assert_eq!(summary.unregistered_asns.get(&Asn::new(64496)), Some(&2));
        assert_eq!(summary.unregistered_asns.get(&Asn::new(64497)), Some(&1));

        // documentation ASNs are never registered
        let lookup = |asn: Asn| asn.is_public();
        let summary = summarize_unregistered(&records, &lookup, AsnScope::Path);
        assert_eq!(summary.asn_count(), 2);
        assert_eq!(summary.announcement_count(), 3);
    }

    #[test]
    fn test_path_scope_prepending() {
        let records = vec![
            record("2001:db8::/32", &[64497, 64497, 64497, 64496]),
            record("2001:db8:1::/48", &[64497, 64496, 64496]),
        ];
        let lookup = |_: Asn| false;
        let summary = summarize_unregistered(&records, &lookup, AsnScope::Path);
        assert_eq!(summary.unregistered_asns.get(&Asn::new(64497)), Some(&2));
        assert_eq!(summary.unregistered_asns.get(&Asn::new(64496)), Some(&2));
        assert_eq!(summary.announcement_count(), 4);
    }

    #[test]
    fn test_display() {
        let summary = UnregisteredSummary {
            scope: AsnScope::Origin,
            unregistered_asns: [(Asn::new(64496), 2)].into_iter().collect(),
        };
        assert_eq!(
            summary.to_string(),
            "unregistered ASNs (Origin): 1, announcements: 2\n  64496: 2\n"
        );
    }
}
