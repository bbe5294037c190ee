use crate::{
    header::{FieldName, HeaderFields},
    signature::{Canonicalization, DomainName, QueryMethod, Selector, SignatureAlgorithm},
};
use std::{
    collections::{HashMap, HashSet},
    error::Error,
    fmt::{self, Display, Formatter},
    time::SystemTime,
};

/// An error that occurs when a signing configuration is invalid.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ConfigError {
    MissingDomain,
    MissingSelector,
    InvalidDomain,
    InvalidSelector,
    InvalidCanonicalization,
    InvalidTimestamp,
    InvalidHeaders,
    UnsupportedAlgorithm,
    UnsupportedQueryMethod,
    UnknownKey(String),
    DuplicateKey(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDomain => write!(f, "missing signing domain"),
            Self::MissingSelector => write!(f, "missing selector"),
            Self::InvalidDomain => write!(f, "invalid signing domain"),
            Self::InvalidSelector => write!(f, "invalid selector"),
            Self::InvalidCanonicalization => write!(f, "invalid canonicalization"),
            Self::InvalidTimestamp => write!(f, "invalid timestamp"),
            Self::InvalidHeaders => write!(f, "invalid signed header list"),
            Self::UnsupportedAlgorithm => write!(f, "unsupported signature algorithm"),
            Self::UnsupportedQueryMethod => write!(f, "unsupported query method"),
            Self::UnknownKey(key) => write!(f, "unknown configuration key \"{key}\""),
            Self::DuplicateKey(key) => write!(f, "duplicate configuration key \"{key}\""),
        }
    }
}

impl Error for ConfigError {}

/// The timestamp to record in the *t=* tag.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Timestamp {
    /// The current time, taken once at the start of each signing operation.
    #[default]
    Now,
    /// A fixed time in seconds since the Unix epoch.
    Exact(u64),
}

impl Timestamp {
    pub fn resolve(self) -> u64 {
        match self {
            Self::Now => now_unix_secs(),
            Self::Exact(t) => t,
        }
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |t| t.as_secs())
}

/// The selection of header fields to sign.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum HeaderSelection {
    /// Given some `HeaderFields`, select the headers in the default set.
    #[default]
    Auto,
    /// Sign the headers given here, in this order. Names without a matching
    /// header field in the message are left out of the *h=* tag.
    Manual(Vec<FieldName>),
}

pub fn default_signed_headers() -> Vec<FieldName> {
    // The example set from RFC 6376, section 5.4.1 (minus *Sender* and
    // *Resent-Sender*), plus the MIME header fields that determine how the
    // body is interpreted.
    let names = [
        "From",
        "Reply-To",
        "Subject",
        "Date",
        "To",
        "Cc",
        "Resent-Date",
        "Resent-From",
        "Resent-To",
        "Resent-Cc",
        "In-Reply-To",
        "References",
        "List-Id",
        "List-Help",
        "List-Unsubscribe",
        "List-Subscribe",
        "List-Post",
        "List-Owner",
        "List-Archive",
        "Message-ID",
        "MIME-Version",
        "Content-Type",
        "Content-Transfer-Encoding",
    ];

    names
        .into_iter()
        .filter_map(|n| FieldName::new(n).ok())
        .collect()
}

/// Selects the names of header fields that satisfy a predicate, bottom-up.
pub fn select_headers<'a, 'b: 'a>(
    headers: &'a HeaderFields,
    mut pred: impl FnMut(&FieldName) -> bool + 'b,
) -> impl DoubleEndedIterator<Item = &FieldName> + 'a {
    headers
        .as_ref()
        .iter()
        .rev()
        .filter_map(move |(name, _)| if pred(name) { Some(name) } else { None })
}

/// Returns the names to record in the *h=* tag for the given message.
///
/// With manual selection, each configured name is kept only while the message
/// still has an unused occurrence of it.
pub fn signed_header_names(selection: &HeaderSelection, headers: &HeaderFields) -> Vec<FieldName> {
    match selection {
        HeaderSelection::Auto => {
            let def: HashSet<_> = default_signed_headers().into_iter().collect();
            select_headers(headers, move |name| def.contains(name))
                .cloned()
                .collect()
        }
        HeaderSelection::Manual(names) => {
            let mut used: HashMap<&FieldName, usize> = HashMap::new();
            names
                .iter()
                .filter(|&name| {
                    let n = used.entry(name).or_default();
                    if *n < headers.count(name) {
                        *n += 1;
                        true
                    } else {
                        false
                    }
                })
                .cloned()
                .collect()
        }
    }
}

/// A signing configuration.
///
/// The configuration is validated once, when the signer is constructed, and is
/// not changed afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningConfig {
    /// The signing domain to use in the *d=* tag.
    pub domain: DomainName,
    /// The selector to use in the *s=* tag.
    pub selector: Selector,
    /// The signature algorithm to use in the *a=* tag.
    pub algorithm: SignatureAlgorithm,
    /// The canonicalization to use in the *c=* tag.
    pub canonicalization: Canonicalization,
    /// The query method to use in the *q=* tag.
    pub query_method: QueryMethod,
    /// The timestamp value to record in the *t=* tag.
    pub timestamp: Timestamp,
    /// The selection of headers to include in the *h=* tag.
    pub header_selection: HeaderSelection,
}

impl SigningConfig {
    pub fn new(domain: DomainName, selector: Selector) -> Self {
        Self {
            domain,
            selector,
            algorithm: Default::default(),
            canonicalization: Default::default(),
            query_method: Default::default(),
            timestamp: Default::default(),
            header_selection: Default::default(),
        }
    }

    /// Builds a configuration from key-value pairs.
    ///
    /// The keys `domain` and `selector` are required. The optional keys are
    /// `canonicalization`, `timestamp`, `headers` (a colon-separated list of
    /// header names), `algorithm`, and `query_method`. Unknown and repeated
    /// keys are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut domain = None;
        let mut selector = None;
        let mut algorithm = SignatureAlgorithm::default();
        let mut canonicalization = Canonicalization::default();
        let mut query_method = QueryMethod::default();
        let mut timestamp = Timestamp::default();
        let mut header_selection = HeaderSelection::default();

        let mut keys_seen = HashSet::new();

        for (key, value) in pairs {
            let key = key.as_ref().trim().to_ascii_lowercase();
            let value = value.as_ref().trim();

            if !keys_seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateKey(key));
            }

            match key.as_str() {
                "domain" => {
                    if value.is_empty() {
                        return Err(ConfigError::MissingDomain);
                    }
                    let d = DomainName::new(value).map_err(|_| ConfigError::InvalidDomain)?;
                    domain = Some(d);
                }
                "selector" => {
                    if value.is_empty() {
                        return Err(ConfigError::MissingSelector);
                    }
                    let s = Selector::new(value).map_err(|_| ConfigError::InvalidSelector)?;
                    selector = Some(s);
                }
                "canonicalization" => {
                    canonicalization = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidCanonicalization)?;
                }
                "timestamp" => {
                    let t = value.parse().map_err(|_| ConfigError::InvalidTimestamp)?;
                    timestamp = Timestamp::Exact(t);
                }
                "headers" => {
                    header_selection = HeaderSelection::Manual(parse_header_names(value)?);
                }
                "algorithm" => {
                    algorithm = value.parse().map_err(|_| ConfigError::UnsupportedAlgorithm)?;
                }
                "query_method" => {
                    query_method = value
                        .parse()
                        .map_err(|_| ConfigError::UnsupportedQueryMethod)?;
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        let domain = domain.ok_or(ConfigError::MissingDomain)?;
        let selector = selector.ok_or(ConfigError::MissingSelector)?;

        let config = Self {
            domain,
            selector,
            algorithm,
            canonicalization,
            query_method,
            timestamp,
            header_selection,
        };

        config.validate()?;

        Ok(config)
    }

    /// Checks the parts of the configuration not already guaranteed by the
    /// field types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let HeaderSelection::Manual(names) = &self.header_selection {
            // ';' would end the h= tag value
            if names.is_empty() || names.iter().any(|n| n.as_ref().contains(';')) {
                return Err(ConfigError::InvalidHeaders);
            }
        }

        Ok(())
    }
}

fn parse_header_names(value: &str) -> Result<Vec<FieldName>, ConfigError> {
    value
        .split(':')
        .map(|name| FieldName::new(name.trim()).map_err(|_| ConfigError::InvalidHeaders))
        .collect()
}
