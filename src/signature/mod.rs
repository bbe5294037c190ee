//! DKIM signature.

mod names;

pub use names::{DomainName, ParseDomainError, ParseSelectorError, Selector};

use crate::{
    crypto::{HashAlgorithm, KeyType},
    header::FieldName,
    util::{self, CanonicalStr},
};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// The name of the header field carrying a DKIM signature, in the casing used
/// on output.
pub const DKIM_SIGNATURE_NAME: &str = "DKIM-Signature";

/// A signature algorithm.
///
/// Only *rsa-sha256* is supported. Each variant pairs one key type with one
/// hash algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// The *rsa-sha256* signature algorithm.
    #[default]
    RsaSha256,
}

impl SignatureAlgorithm {
    /// Returns this signature algorithm’s key type.
    pub fn key_type(self) -> KeyType {
        match self {
            Self::RsaSha256 => KeyType::Rsa,
        }
    }

    /// Returns this signature algorithm’s hash algorithm.
    pub fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaSha256 => HashAlgorithm::Sha256,
        }
    }
}

impl CanonicalStr for SignatureAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("rsa-sha256") {
            Ok(Self::RsaSha256)
        } else {
            Err("unknown signature algorithm")
        }
    }
}

/// A canonicalization algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CanonicalizationAlgorithm {
    /// The *simple* canonicalization algorithm.
    #[default]
    Simple,
    /// The *relaxed* canonicalization algorithm.
    Relaxed,
}

impl CanonicalStr for CanonicalizationAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Relaxed => "relaxed",
        }
    }
}

impl Display for CanonicalizationAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for CanonicalizationAlgorithm {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("simple") {
            Ok(Self::Simple)
        } else if s.eq_ignore_ascii_case("relaxed") {
            Ok(Self::Relaxed)
        } else {
            Err("unknown canonicalization algorithm")
        }
    }
}

/// A pair of header/body canonicalization algorithms.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Canonicalization {
    /// The header canonicalization.
    pub header: CanonicalizationAlgorithm,
    /// The body canonicalization.
    pub body: CanonicalizationAlgorithm,
}

impl CanonicalStr for Canonicalization {
    fn canonical_str(&self) -> &'static str {
        use CanonicalizationAlgorithm::*;

        match (self.header, self.body) {
            (Simple, Simple) => "simple/simple",
            (Simple, Relaxed) => "simple/relaxed",
            (Relaxed, Simple) => "relaxed/simple",
            (Relaxed, Relaxed) => "relaxed/relaxed",
        }
    }
}

impl Display for Canonicalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl fmt::Debug for Canonicalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", &self.header, &self.body)
    }
}

impl From<(CanonicalizationAlgorithm, CanonicalizationAlgorithm)> for Canonicalization {
    fn from((header, body): (CanonicalizationAlgorithm, CanonicalizationAlgorithm)) -> Self {
        Self { header, body }
    }
}

impl FromStr for Canonicalization {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // a lone algorithm applies to the header, the body defaults to simple
        Ok(if let Some((header, body)) = s.split_once('/') {
            Self {
                header: CanonicalizationAlgorithm::from_str(header)?,
                body: CanonicalizationAlgorithm::from_str(body)?,
            }
        } else {
            Self {
                header: CanonicalizationAlgorithm::from_str(s)?,
                body: Default::default(),
            }
        })
    }
}

/// A query method for retrieving the public key.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum QueryMethod {
    /// The *dns/txt* query method.
    #[default]
    DnsTxt,
}

impl CanonicalStr for QueryMethod {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::DnsTxt => "dns/txt",
        }
    }
}

impl Display for QueryMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for QueryMethod {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("dns/txt") {
            Ok(Self::DnsTxt)
        } else {
            Err("unknown query method")
        }
    }
}

/// A DKIM signature as produced by signing: the values of the tags in a
/// `DKIM-Signature` header field.
#[derive(Clone, Eq, PartialEq)]
pub struct DkimSignature {
    pub algorithm: SignatureAlgorithm,
    pub signature_data: Box<[u8]>,
    pub body_hash: Box<[u8]>,
    pub canonicalization: Canonicalization,
    pub domain: DomainName,
    pub query_method: QueryMethod,
    pub selector: Selector,
    pub timestamp: u64,
    pub signed_headers: Box<[FieldName]>,
}

impl DkimSignature {
    /// Returns the *b=* tag value, the Base64-encoded signature data.
    pub fn signature_data_base64(&self) -> String {
        util::encode_base64(&self.signature_data)
    }

    /// Returns the *bh=* tag value, the Base64-encoded body hash.
    pub fn body_hash_base64(&self) -> String {
        util::encode_base64(&self.body_hash)
    }
}

impl fmt::Debug for DkimSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DkimSignature")
            .field("algorithm", &self.algorithm)
            .field("signature_data", &self.signature_data_base64())
            .field("body_hash", &self.body_hash_base64())
            .field("canonicalization", &self.canonicalization)
            .field("domain", &self.domain)
            .field("query_method", &self.query_method)
            .field("selector", &self.selector)
            .field("timestamp", &self.timestamp)
            .field("signed_headers", &self.signed_headers)
            .finish()
    }
}
