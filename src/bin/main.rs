use std::io::Write;
use std::path::PathBuf;

use bgpkit_aggregator::registry::{
    summarize_unregistered, AsnScope, RegistrationCache, WhoisClient, WhoisProfile,
    DEFAULT_MAX_CONCURRENCY,
};
use bgpkit_aggregator::{AggregationOptions, Aggregator, DumpParser, Grouping, PrefixStats};
use clap::Parser;
use log::info;

/// bgpkit-aggregator estimates how far the IPv6 prefixes of a routing table dump could be
/// aggregated.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    /// File path to a pipe-separated dump (`prefix|as_path` or `bgpdump -m` output), optionally
    /// gzip or bzip2 compressed.
    #[clap(name = "FILE")]
    file_path: PathBuf,

    /// How prefixes are grouped before aggregation
    #[clap(short, long, value_enum, default_value_t = Grouping::OriginAs)]
    grouping: Grouping,

    /// Only count supernets, ignore contiguous neighbors
    #[clap(long)]
    no_contiguity: bool,

    /// Keep networks shadowed by a longer network at the same address in the result
    #[clap(long)]
    keep_shadowed: bool,

    /// Resolve AS registration through WHOIS and report unregistered ASNs
    #[clap(long)]
    whois: bool,

    /// How WHOIS answers are classified; `radb` also queries whois.radb.net
    #[clap(long, value_enum, default_value_t = WhoisProfile::ErrorMarkers)]
    whois_profile: WhoisProfile,

    /// WHOIS server to query, overriding the profile's server
    #[clap(long)]
    whois_server: Option<String>,

    /// Maximum number of concurrent WHOIS queries
    #[clap(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    whois_limit: usize,

    /// Check every ASN on the AS path instead of only the origin
    #[clap(long)]
    whois_path_asns: bool,

    /// Output the report as JSON
    #[clap(long)]
    json: bool,

    /// Pretty-print JSON output
    #[clap(long)]
    pretty: bool,
}

fn main() {
    let opts: Opts = Opts::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = opts.file_path.to_string_lossy();
    let parser = match DumpParser::new(&path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("cannot open {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let mut iter = parser.into_record_iter();
    let records = iter.by_ref().collect::<Vec<_>>();
    info!(
        "read {} IPv6 records from {}, skipped {} malformed lines",
        records.len(),
        path,
        iter.skipped()
    );

    let options = AggregationOptions {
        contiguity: !opts.no_contiguity,
        most_specific_filter: !opts.keep_shadowed,
    };
    let mut aggregator = Aggregator::new(options);
    let result = aggregator.aggregate_records(&records, opts.grouping);
    let mut stats = PrefixStats::compute(&records, &result);

    if opts.whois {
        let scope = match opts.whois_path_asns {
            true => AsnScope::Path,
            false => AsnScope::Origin,
        };
        let mut client = WhoisClient::new()
            .with_profile(opts.whois_profile)
            .with_max_concurrency(opts.whois_limit);
        if let Some(server) = opts.whois_server {
            client = client.with_server(server);
        }

        let mut cache = RegistrationCache::new();
        if let Err(e) = client.resolve(scope.distinct_asns(&records), &mut cache) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        stats = stats.with_unregistered(summarize_unregistered(&records, &cache, scope));
    }

    let output_str = match opts.json {
        true => {
            let res = match opts.pretty {
                true => serde_json::to_string_pretty(&stats),
                false => serde_json::to_string(&stats),
            };
            match res {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        false => stats.to_string(),
    };

    let mut stdout = std::io::stdout();
    if let Err(e) = writeln!(stdout, "{}", output_str.trim_end()) {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
