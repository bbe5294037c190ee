use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    str::FromStr,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDomainError;

impl Display for ParseDomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse domain name")
    }
}

impl Error for ParseDomainError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseSelectorError;

impl Display for ParseSelectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse selector")
    }
}

impl Error for ParseSelectorError {}

/// A domain name.
///
/// This type is used to wrap the signing domain in the d= tag.
#[derive(Clone, Eq)]
pub struct DomainName(Box<str>);

impl DomainName {
    /// Creates a new domain name from the given string.
    ///
    /// The string is validated and then encapsulated as-is. Single-label names
    /// are accepted. Equivalence comparison is case-insensitive.
    pub fn new(s: &str) -> Result<Self, ParseDomainError> {
        if s.ends_with('.') {
            return Err(ParseDomainError);
        }

        if !is_valid_dns_name(s) {
            return Err(ParseDomainError);
        }

        // U-labels must convert to A-labels for the name to be usable in DNS
        idna::domain_to_ascii(s).map_err(|_| ParseDomainError)?;

        Ok(Self(s.into()))
    }

    /// Returns the domain name in A-label (ASCII) form.
    pub fn to_ascii(&self) -> String {
        idna::domain_to_ascii(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

impl FromStr for DomainName {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for DomainName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for DomainName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

fn is_valid_dns_name(s: &str) -> bool {
    fn is_tld(s: &str) -> bool {
        is_label(s) && !s.chars().all(|c: char| c.is_ascii_digit())
    }

    if !has_valid_domain_len(s) {
        return false;
    }

    let mut labels = s.split('.').rev();

    if matches!(labels.next(), Some(l) if !is_tld(l)) {
        return false;
    }

    labels.all(is_label)
}

fn is_label(s: &str) -> bool {
    has_valid_label_len(s)
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.chars().all(is_tval_char)
}

// printable ASCII without ; or non-ASCII: ; would end the tag value
fn is_tval_char(c: char) -> bool {
    matches!(c, '!'..=':' | '<'..='~') || !c.is_ascii()
}

const MAX_DOMAIN_LENGTH: usize = 253;

fn has_valid_domain_len(s: &str) -> bool {
    matches!(s.len(), 1..=MAX_DOMAIN_LENGTH)
}

fn has_valid_label_len(s: &str) -> bool {
    matches!(s.len(), 1..=63)
}

/// A selector.
///
/// This type is used to wrap a sequence of labels as used in the s= tag.
#[derive(Clone, Eq)]
pub struct Selector(Box<str>);

impl Selector {
    /// Creates a new selector from the given string.
    ///
    /// Note that the string is validated and then encapsulated as-is.
    /// Equivalence comparison is case-insensitive.
    pub fn new(s: &str) -> Result<Self, ParseSelectorError> {
        // lenient parsing of domain name labels, allows things like "dkim_123"
        if !s.split('.').all(is_label) {
            return Err(ParseSelectorError);
        }

        idna::domain_to_ascii(s).map_err(|_| ParseSelectorError)?;

        Ok(Self(s.into()))
    }

    /// Returns the selector in A-label (ASCII) form.
    pub fn to_ascii(&self) -> String {
        idna::domain_to_ascii(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

impl FromStr for Selector {
    type Err = ParseSelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &self.0)
    }
}

impl AsRef<str> for Selector {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for Selector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_name_ok() {
        assert!(DomainName::new("example.com").is_ok());
        assert!(DomainName::new("s3ig.com").is_ok());
        assert!(DomainName::new("domain").is_ok());
        assert!(DomainName::new("example.中国").is_ok());
        assert!(DomainName::new("xn--53h.example.xn--fiqs8s").is_ok());

        assert!(DomainName::new("").is_err());
        assert!(DomainName::new("example.").is_err());
        assert!(DomainName::new("example.com.").is_err());
        assert!(DomainName::new("example..com").is_err());
        assert!(DomainName::new("-example.com").is_err());
        assert!(DomainName::new("exa;mple.com").is_err());
        assert!(DomainName::new("example.123").is_err());
    }

    #[test]
    fn domain_name_eq() {
        assert_eq!(DomainName::new("Example.COM").unwrap(), DomainName::new("example.com").unwrap());
        assert_eq!(DomainName::new("example.中国").unwrap().to_ascii(), "example.xn--fiqs8s");
    }

    #[test]
    fn selector_ok() {
        assert!(Selector::new("dkim").is_ok());
        assert!(Selector::new("selector").is_ok());
        assert!(Selector::new("dkim_123").is_ok());
        assert!(Selector::new("2023.eu").is_ok());

        assert!(Selector::new("").is_err());
        assert!(Selector::new(".").is_err());
        assert!(Selector::new("dkim.").is_err());
        assert!(Selector::new("dk;im").is_err());
    }
}
