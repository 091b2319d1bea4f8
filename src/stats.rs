/*!
Summary statistics of one analysis run.
*/
use crate::aggregation::AggregationResult;
use crate::models::PrefixRecord;
use crate::registry::UnregisteredSummary;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Report values derived from the parsed records and the aggregation outcome.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrefixStats {
    /// Announcements read, repetitions included.
    pub total_records: usize,
    pub unique_prefixes: usize,
    pub average_prefix_length: f64,
    pub aggregation_events: usize,
    /// Unique prefixes minus aggregation events.
    pub unaggregatable_prefixes: usize,
    /// Size of the aggregated network set.
    pub aggregated_networks: usize,
    /// Unique prefixes per aggregated network.
    pub desaggregation_factor: f64,
    pub longest_as_path: usize,
    pub average_as_path_length: f64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub unregistered: Option<UnregisteredSummary>,
}

impl PrefixStats {
    pub fn compute(records: &[PrefixRecord], result: &AggregationResult) -> PrefixStats {
        let unique = records.iter().map(|r| r.network).unique().collect::<Vec<_>>();
        let unique_prefixes = unique.len();
        let aggregated_networks = result.aggregated_networks.len();

        let average_prefix_length = mean(
            unique.iter().map(|n| n.prefix_len() as usize),
            unique_prefixes,
        );
        let average_as_path_length =
            mean(records.iter().map(|r| r.as_path.len()), records.len());
        let desaggregation_factor = match aggregated_networks {
            0 => 0.0,
            n => unique_prefixes as f64 / n as f64,
        };

        PrefixStats {
            total_records: records.len(),
            unique_prefixes,
            average_prefix_length,
            aggregation_events: result.aggregation_event_count,
            unaggregatable_prefixes: unique_prefixes
                .saturating_sub(result.aggregation_event_count),
            aggregated_networks,
            desaggregation_factor,
            longest_as_path: records.iter().map(|r| r.as_path.len()).max().unwrap_or(0),
            average_as_path_length,
            unregistered: None,
        }
    }

    pub fn with_unregistered(mut self, summary: UnregisteredSummary) -> Self {
        self.unregistered = Some(summary);
        self
    }
}

fn mean<I: Iterator<Item = usize>>(values: I, count: usize) -> f64 {
    match count {
        0 => 0.0,
        n => values.sum::<usize>() as f64 / n as f64,
    }
}

impl Display for PrefixStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total records: {}", self.total_records)?;
        writeln!(f, "unique prefixes: {}", self.unique_prefixes)?;
        writeln!(f, "average prefix length: {:.2}", self.average_prefix_length)?;
        writeln!(f, "aggregation events: {}", self.aggregation_events)?;
        writeln!(f, "unaggregatable prefixes: {}", self.unaggregatable_prefixes)?;
        writeln!(f, "aggregated networks: {}", self.aggregated_networks)?;
        writeln!(f, "desaggregation factor: {:.2}", self.desaggregation_factor)?;
        writeln!(f, "longest AS path: {}", self.longest_as_path)?;
        writeln!(f, "average AS path length: {:.2}", self.average_as_path_length)?;
        if let Some(unregistered) = &self.unregistered {
            write!(f, "{}", unregistered)?;
        }
        Ok(())
    }
}
