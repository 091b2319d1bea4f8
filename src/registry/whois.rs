use crate::error::AggregatorError;
use crate::models::Asn;
use crate::registry::{RegistrationCache, RegistrationLookup};
use log::{debug, info, warn};
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use std::process::Command;

/// Substrings in a WHOIS answer that mean the AS is not registered.
pub const DEFAULT_UNREGISTERED_MARKERS: [&str; 5] = [
    "denied",
    "Not match",
    "Not found",
    "ERROR",
    "no entries found",
];

/// Registry names whose presence in a WHOIS answer means the AS is registered.
pub const RIR_KEYWORDS: [&str; 5] = ["ARIN", "RIPE", "APNIC", "LACNIC", "AFRINIC"];

/// Error pattern of RADB answers, matched case-insensitively.
pub const RADB_ERROR_PATTERN: &str = "denied|not found|no entries found|error|invalid|does not exist";

pub const RADB_SERVER: &str = "whois.radb.net";

/// Number of WHOIS queries allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 200;

/// What a marker match says about the AS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerPolarity {
    /// A match means the AS is not registered.
    #[default]
    Unregistered,
    /// A match means the AS is registered.
    Registered,
}

/// Classifies a WHOIS answer as registered or not by matching markers against it.
///
/// An empty marker set never matches: with [MarkerPolarity::Unregistered] every answer counts as
/// registered, with [MarkerPolarity::Registered] none does.
#[derive(Debug, Clone)]
pub struct AnswerClassifier {
    markers: Option<Regex>,
    polarity: MarkerPolarity,
}

impl Default for AnswerClassifier {
    fn default() -> Self {
        AnswerClassifier::error_markers()
    }
}

impl AnswerClassifier {
    /// Markers matched literally as substrings.
    pub fn literal<S: AsRef<str>>(
        markers: &[S],
        polarity: MarkerPolarity,
        case_insensitive: bool,
    ) -> Result<Self, AggregatorError> {
        let escaped = markers
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !m.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();
        if escaped.is_empty() {
            return Ok(AnswerClassifier {
                markers: None,
                polarity,
            });
        }
        AnswerClassifier::pattern(&escaped.join("|"), polarity, case_insensitive)
    }

    /// A regular expression; an empty pattern matches nothing.
    pub fn pattern(
        pattern: &str,
        polarity: MarkerPolarity,
        case_insensitive: bool,
    ) -> Result<Self, AggregatorError> {
        let markers = match pattern.is_empty() {
            true => None,
            false => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(case_insensitive)
                    .build()?,
            ),
        };
        Ok(AnswerClassifier { markers, polarity })
    }

    /// [DEFAULT_UNREGISTERED_MARKERS], literal and case-sensitive.
    pub fn error_markers() -> Self {
        AnswerClassifier::literal(
            &DEFAULT_UNREGISTERED_MARKERS,
            MarkerPolarity::Unregistered,
            false,
        )
        .unwrap_or_else(|_| unreachable!("escaped markers always compile"))
    }

    /// Registered when the answer names one of the [RIR_KEYWORDS].
    pub fn rir_keywords() -> Self {
        AnswerClassifier::literal(&RIR_KEYWORDS, MarkerPolarity::Registered, false)
            .unwrap_or_else(|_| unreachable!("escaped markers always compile"))
    }

    /// Unregistered when the answer matches [RADB_ERROR_PATTERN] in any case.
    pub fn radb_errors() -> Self {
        AnswerClassifier::pattern(RADB_ERROR_PATTERN, MarkerPolarity::Unregistered, true)
            .unwrap_or_else(|_| unreachable!("constant pattern compiles"))
    }

    pub fn polarity(&self) -> MarkerPolarity {
        self.polarity
    }

    /// Whether a WHOIS answer describes a registered AS.
    pub fn is_registered(&self, text: &str) -> bool {
        let matched = self.markers.as_ref().is_some_and(|re| re.is_match(text));
        match self.polarity {
            MarkerPolarity::Unregistered => !matched,
            MarkerPolarity::Registered => matched,
        }
    }
}

/// Preset server and answer classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum WhoisProfile {
    /// Default server, unregistered on [DEFAULT_UNREGISTERED_MARKERS].
    #[default]
    ErrorMarkers,
    /// Default server, registered when a regional registry is named.
    RirKeywords,
    /// [RADB_SERVER], unregistered on [RADB_ERROR_PATTERN].
    Radb,
}

impl WhoisProfile {
    pub fn classifier(&self) -> AnswerClassifier {
        match self {
            WhoisProfile::ErrorMarkers => AnswerClassifier::error_markers(),
            WhoisProfile::RirKeywords => AnswerClassifier::rir_keywords(),
            WhoisProfile::Radb => AnswerClassifier::radb_errors(),
        }
    }

    pub fn server(&self) -> Option<&'static str> {
        match self {
            WhoisProfile::Radb => Some(RADB_SERVER),
            _ => None,
        }
    }
}

/// Resolves AS registration by running the system `whois` command.
///
/// Any failure to get an answer (missing binary, non-zero exit status) classifies the AS as
/// unregistered.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    server: Option<String>,
    max_concurrency: usize,
    classifier: AnswerClassifier,
}

impl Default for WhoisClient {
    fn default() -> Self {
        WhoisClient {
            server: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            classifier: AnswerClassifier::default(),
        }
    }
}

impl WhoisClient {
    pub fn new() -> WhoisClient {
        WhoisClient::default()
    }

    /// Applies a profile's server and classifier.
    pub fn with_profile(mut self, profile: WhoisProfile) -> Self {
        self.server = profile.server().map(str::to_string);
        self.classifier = profile.classifier();
        self
    }

    /// Queries `server` (`whois -h <server>`) instead of the command's default.
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Bounds the number of concurrent queries. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_classifier(mut self, classifier: AnswerClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the unregistered markers. Markers match literally and case-sensitively; an empty
    /// list treats every answer as registered.
    pub fn with_markers<S: AsRef<str>>(self, markers: &[S]) -> Result<Self, AggregatorError> {
        let classifier = AnswerClassifier::literal(markers, MarkerPolarity::Unregistered, false)?;
        Ok(self.with_classifier(classifier))
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    /// Runs one WHOIS query and classifies the answer.
    pub fn query(&self, asn: Asn) -> bool {
        let mut command = Command::new("whois");
        if let Some(server) = &self.server {
            command.args(["-h", server.as_str()]);
        }
        command.arg(format!("AS{}", asn));

        match command.output() {
            Ok(output) if output.status.success() => {
                let text = decode_output(&output.stdout);
                let registered = self.is_registered_answer(&text);
                debug!("whois AS{}: registered={}", asn, registered);
                registered
            }
            Ok(output) => {
                warn!("whois AS{} exited with {}", asn, output.status);
                false
            }
            Err(e) => {
                warn!("cannot run whois for AS{}: {}", asn, e);
                false
            }
        }
    }

    /// Whether a WHOIS answer describes a registered AS.
    pub fn is_registered_answer(&self, text: &str) -> bool {
        self.classifier.is_registered(text)
    }

    /// Resolves every ASN missing from `cache` and stores the results in it.
    pub fn resolve<I>(&self, asns: I, cache: &mut RegistrationCache) -> Result<(), AggregatorError>
    where
        I: IntoIterator<Item = Asn>,
    {
        let mut pending = asns
            .into_iter()
            .filter(|asn| !cache.contains(*asn))
            .collect::<Vec<_>>();
        pending.sort();
        pending.dedup();
        if pending.is_empty() {
            return Ok(());
        }

        info!(
            "resolving {} ASNs with up to {} concurrent whois queries",
            pending.len(),
            self.max_concurrency
        );
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency.min(pending.len()))
            .build()?;
        let resolved = pool.install(|| {
            pending
                .par_iter()
                .map(|asn| (*asn, self.query(*asn)))
                .collect::<Vec<_>>()
        });
        cache.extend(resolved);
        Ok(())
    }
}

impl RegistrationLookup for WhoisClient {
    /// Uncached single query. Use [WhoisClient::resolve] with a [RegistrationCache] for bulk
    /// lookups.
    fn is_registered(&self, asn: Asn) -> bool {
        self.query(asn)
    }
}

/// Decodes WHOIS output as UTF-8, falling back to Latin-1.
fn decode_output(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let client = WhoisClient::new();
        assert!(client.is_registered_answer("aut-num: AS3356\nas-name: LEVEL3\n"));
        assert!(!client.is_registered_answer("%ERROR:101: no entries found\n"));
        assert!(!client.is_registered_answer("Query rate limit exceeded, access denied"));
        assert!(!client.is_registered_answer("No match for \"AS64496\". Not found."));
        // markers are case-sensitive
        assert!(client.is_registered_answer("error handling notes"));
    }

    #[test]
    fn test_custom_markers() {
        let client = WhoisClient::new()
            .with_markers(&["No data (.*)", "unallocated"])
            .unwrap();
        // markers match literally
        assert!(client.is_registered_answer("No data found"));
        assert!(!client.is_registered_answer("No data (.*) for AS64496"));
        assert!(!client.is_registered_answer("AS64496 is unallocated"));
        assert!(client.is_registered_answer("Not found"));
    }

    #[test]
    fn test_empty_markers_match_nothing() {
        let ripe = "aut-num: AS3333\nas-name: RIPE-NCC-AS\nsource: RIPE\n";
        let client = WhoisClient::new().with_markers::<&str>(&[]).unwrap();
        assert!(client.is_registered_answer(ripe));
        assert!(client.is_registered_answer("%ERROR:101: no entries found\n"));

        let client = WhoisClient::new().with_markers(&["", ""]).unwrap();
        assert!(client.is_registered_answer(ripe));

        let keywords = AnswerClassifier::literal::<&str>(&[], MarkerPolarity::Registered, false)
            .unwrap();
        assert!(!keywords.is_registered(ripe));
    }

    #[test]
    fn test_rir_keywords() {
        let classifier = AnswerClassifier::rir_keywords();
        assert_eq!(classifier.polarity(), MarkerPolarity::Registered);
        assert!(classifier.is_registered("aut-num: AS3333\nsource: RIPE\n"));
        assert!(classifier.is_registered("OrgId: ARIN\n"));
        assert!(classifier.is_registered("owner: LACNIC registry\n"));
        assert!(!classifier.is_registered("%ERROR:101: no entries found\n"));
        assert!(!classifier.is_registered("source: ripe\n"));
    }

    #[test]
    fn test_radb_errors() {
        let classifier = AnswerClassifier::radb_errors();
        assert!(classifier.is_registered("aut-num: AS3356\nsource: RADB\n"));
        assert!(!classifier.is_registered("%  No entries found for the selected source(s).\n"));
        assert!(!classifier.is_registered("Access DENIED\n"));
        assert!(!classifier.is_registered("Error: Invalid query\n"));
        assert!(!classifier.is_registered("object does not exist"));
        // the default markers are case-sensitive and miss these
        assert!(AnswerClassifier::error_markers().is_registered("Access DENIED\n"));
    }

    #[test]
    fn test_pattern_classifier() {
        let classifier =
            AnswerClassifier::pattern("no data .* found", MarkerPolarity::Unregistered, true)
                .unwrap();
        assert!(!classifier.is_registered("No Data was found"));
        assert!(classifier.is_registered("aut-num: AS64496"));

        let empty = AnswerClassifier::pattern("", MarkerPolarity::Unregistered, false).unwrap();
        assert!(empty.is_registered("ERROR"));

        assert!(matches!(
            AnswerClassifier::pattern("(", MarkerPolarity::Unregistered, false),
            Err(AggregatorError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_profiles() {
        let client = WhoisClient::new().with_profile(WhoisProfile::Radb);
        assert_eq!(client.server(), Some(RADB_SERVER));
        assert!(!client.is_registered_answer("no entries found"));
        assert!(!client.is_registered_answer("NOT FOUND"));

        let client = WhoisClient::new()
            .with_profile(WhoisProfile::RirKeywords)
            .with_server("whois.ripe.net");
        assert_eq!(client.server(), Some("whois.ripe.net"));
        assert!(client.is_registered_answer("source: APNIC"));
        assert!(!client.is_registered_answer("aut-num: AS64496"));

        let client = WhoisClient::new().with_profile(WhoisProfile::default());
        assert_eq!(client.server(), None);
        assert!(!client.is_registered_answer("Not found"));
    }

    #[test]
    fn test_builder() {
        let client = WhoisClient::new()
            .with_server("whois.ripe.net")
            .with_max_concurrency(0);
        assert_eq!(client.max_concurrency(), 1);
        assert_eq!(client.server.as_deref(), Some("whois.ripe.net"));
        assert_eq!(WhoisClient::new().max_concurrency(), DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn test_decode_output() {
        assert_eq!(decode_output("descr: Zürich".as_bytes()), "descr: Zürich");
        // invalid UTF-8 is read as Latin-1
        assert_eq!(decode_output(b"descr: Z\xfcrich"), "descr: Zürich");
    }

    #[test]
    fn test_resolve_skips_cached() {
        let mut cache = RegistrationCache::new();
        cache.insert(Asn::new(3356), true);
        cache.insert(Asn::new(64496), false);

        // nothing left to query, so no process is spawned
        WhoisClient::new()
            .resolve([Asn::new(3356), Asn::new(64496), Asn::new(3356)], &mut cache)
            .unwrap();
        assert_eq!(cache.len(), 2);
    }
}
