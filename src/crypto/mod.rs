//! Cryptographic utilities.

mod hash;
mod rsa;

pub use self::{
    hash::{digest, digest_slices, CountingHasher},
    rsa::{get_private_key_size, sign_rsa, MIN_RSA_KEY_SIZE},
};

use ::rsa::{pkcs1::DecodeRsaPrivateKey, pkcs8::DecodePrivateKey, RsaPrivateKey};
use bstr::ByteSlice;
use pkcs8::{der::pem::PemLabel, Document, PrivateKeyInfo};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str,
};
use tracing::trace;

/// An error that occurs when reading private key material.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyParseError {
    /// The input is not a well-formed PEM document.
    InvalidPem,
    /// The PEM document does not hold an RSA private key.
    UnsupportedPemLabel,
    /// The key data could not be decoded into an RSA private key.
    InvalidKeyData,
}

impl Display for KeyParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPem => write!(f, "not a PEM document"),
            Self::UnsupportedPemLabel => write!(f, "unsupported PEM document label"),
            Self::InvalidKeyData => write!(f, "invalid private key data"),
        }
    }
}

impl Error for KeyParseError {}

/// An error that occurs when producing a signature.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SigningError {
    InvalidKey,
    InsufficientKeySize,
    SigningFailure,
}

impl Display for SigningError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "invalid key"),
            Self::InsufficientKeySize => write!(f, "key too small"),
            Self::SigningFailure => write!(f, "signing failed"),
        }
    }
}

impl Error for SigningError {}

/// A private key used for signing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SigningKey {
    Rsa(RsaPrivateKey),
}

impl SigningKey {
    /// Reads a key from a PEM document labelled `RSA PRIVATE KEY` (PKCS#1).
    pub fn from_pkcs1_pem(s: &str) -> Result<Self, KeyParseError> {
        let k = RsaPrivateKey::from_pkcs1_pem(s).map_err(|_| KeyParseError::InvalidKeyData)?;
        Ok(Self::Rsa(k))
    }

    /// Reads a key from a PEM document labelled `PRIVATE KEY` (PKCS#8).
    pub fn from_pkcs8_pem(s: &str) -> Result<Self, KeyParseError> {
        let k = RsaPrivateKey::from_pkcs8_pem(s).map_err(|_| KeyParseError::InvalidKeyData)?;
        Ok(Self::Rsa(k))
    }

    /// Reads a key from a PEM document, choosing the format by the label.
    pub fn from_pem(s: &str) -> Result<Self, KeyParseError> {
        let (label, doc) = Document::from_pem(s).map_err(|_| KeyParseError::InvalidPem)?;

        if label == PrivateKeyInfo::PEM_LABEL {
            Self::from_pkcs8_der(doc.as_bytes())
        } else if label == ::rsa::pkcs1::RsaPrivateKey::PEM_LABEL {
            Self::from_pkcs1_der(doc.as_bytes())
        } else {
            trace!(label, "unsupported PEM label");
            Err(KeyParseError::UnsupportedPemLabel)
        }
    }

    pub fn from_pkcs1_der(bytes: &[u8]) -> Result<Self, KeyParseError> {
        let k = RsaPrivateKey::from_pkcs1_der(bytes).map_err(|_| KeyParseError::InvalidKeyData)?;
        Ok(Self::Rsa(k))
    }

    pub fn from_pkcs8_der(bytes: &[u8]) -> Result<Self, KeyParseError> {
        let k = RsaPrivateKey::from_pkcs8_der(bytes).map_err(|_| KeyParseError::InvalidKeyData)?;
        Ok(Self::Rsa(k))
    }

    /// Reads a key from PEM or DER encoded bytes.
    ///
    /// Input starting with `-----BEGIN` is read as PEM, other input as DER in
    /// PKCS#8 or else PKCS#1 format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyParseError> {
        let trimmed = bytes.trim_start();

        if trimmed.starts_with(b"-----BEGIN") {
            let s = str::from_utf8(trimmed).map_err(|_| KeyParseError::InvalidPem)?;
            Self::from_pem(s)
        } else {
            Self::from_pkcs8_der(bytes).or_else(|_| Self::from_pkcs1_der(bytes))
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
        }
    }

    /// Returns the key size in bits.
    pub fn key_size(&self) -> usize {
        match self {
            Self::Rsa(k) => get_private_key_size(k),
        }
    }

    /// Checks that the key is consistent and large enough to sign with.
    pub fn check_usable(&self) -> Result<(), SigningError> {
        match self {
            Self::Rsa(k) => {
                k.validate().map_err(|_| SigningError::InvalidKey)?;

                if get_private_key_size(k) < MIN_RSA_KEY_SIZE {
                    return Err(SigningError::InsufficientKeySize);
                }

                Ok(())
            }
        }
    }

    /// Signs the given data hash, which must have been computed with the
    /// given hash algorithm.
    pub fn sign(&self, hash_alg: HashAlgorithm, data_hash: &[u8]) -> Result<Vec<u8>, SigningError> {
        match self {
            Self::Rsa(k) => sign_rsa(hash_alg, k, data_hash),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyType {
    Rsa,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
}
