//! Signer and supporting types.

mod config;
mod format;
mod sign;

pub use crate::signer::{
    config::{
        default_signed_headers, select_headers, signed_header_names, ConfigError,
        HeaderSelection, SigningConfig, Timestamp,
    },
    format::UnsignedDkimSignature,
    sign::{perform_signing, prepare, PreparedSignature},
};

use crate::{
    body_hash,
    canonicalize,
    crypto::{self, KeyParseError, SigningKey},
    message::{Message, MessageParseError},
    signature::DkimSignature,
    util,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use tracing::debug;

/// An error that occurs when constructing a signer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerError {
    ConfigInvalid(ConfigError),
    KeyParse(KeyParseError),
    SigningKeyInvalid(crypto::SigningError),
}

impl Display for SignerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigInvalid(e) => write!(f, "invalid configuration: {e}"),
            Self::KeyParse(e) => write!(f, "could not read signing key: {e}"),
            Self::SigningKeyInvalid(e) => write!(f, "signing key not usable: {e}"),
        }
    }
}

impl Error for SignerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConfigInvalid(e) => Some(e),
            Self::KeyParse(e) => Some(e),
            Self::SigningKeyInvalid(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SignerError {
    fn from(error: ConfigError) -> Self {
        Self::ConfigInvalid(error)
    }
}

impl From<KeyParseError> for SignerError {
    fn from(error: KeyParseError) -> Self {
        Self::KeyParse(error)
    }
}

/// An error that occurs when signing a message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SigningError {
    MessageParse(MessageParseError),
    SigningKeyInvalid,
    Encoding,
}

impl Display for SigningError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageParse(e) => write!(f, "could not read message: {e}"),
            Self::SigningKeyInvalid => write!(f, "signing key could not produce signature"),
            Self::Encoding => write!(f, "signature header could not be encoded"),
        }
    }
}

impl Error for SigningError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MessageParse(e) => Some(e),
            Self::SigningKeyInvalid | Self::Encoding => None,
        }
    }
}

impl From<MessageParseError> for SigningError {
    fn from(error: MessageParseError) -> Self {
        Self::MessageParse(error)
    }
}

/// The result of signing a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningResult {
    pub signature: DkimSignature,
    // Usage: header_name and header_value are meant to be concatenated with
    // only an intervening colon, no additional whitespace! this is vital for
    // "simple" header canonicalization where whitespace changes are not allowed
    pub header_name: String,
    pub header_value: String,
}

impl SigningResult {
    /// Formats the `DKIM-Signature` header field, without final CRLF.
    pub fn format_header(&self) -> String {
        format!("{}:{}", self.header_name, self.header_value)
    }
}

/// A signer, producing DKIM signatures with one key and configuration.
///
/// A signer holds no state that changes between signing operations, it can be
/// shared between threads and used concurrently.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use dkim_signer::{Signer, SigningConfig};
///
/// let config = SigningConfig::from_pairs([
///     ("domain", "example.com"),
///     ("selector", "mail"),
///     ("canonicalization", "relaxed/relaxed"),
/// ])?;
///
/// let key = std::fs::read("private.pem")?;
///
/// let signer = Signer::from_key_bytes(config, &key)?;
///
/// let signed = signer.sign(b"From: me@example.com\r\nSubject: hi\r\n\r\nHello!\r\n")?;
///
/// assert!(signed.starts_with(b"DKIM-Signature: v=1; a=rsa-sha256;"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Signer {
    config: SigningConfig,
    signing_key: SigningKey,
}

impl Signer {
    /// Creates a signer after validating the configuration and the key.
    pub fn new(config: SigningConfig, signing_key: SigningKey) -> Result<Self, SignerError> {
        config.validate()?;

        signing_key
            .check_usable()
            .map_err(SignerError::SigningKeyInvalid)?;

        if signing_key.key_type() != config.algorithm.key_type() {
            return Err(SignerError::SigningKeyInvalid(crypto::SigningError::InvalidKey));
        }

        debug!(
            domain = %config.domain,
            selector = %config.selector,
            key_size = signing_key.key_size(),
            "signer created"
        );

        Ok(Self { config, signing_key })
    }

    /// Creates a signer with a key read from PEM or DER encoded bytes.
    pub fn from_key_bytes(config: SigningConfig, key: &[u8]) -> Result<Self, SignerError> {
        let signing_key = SigningKey::from_bytes(key)?;
        Self::new(config, signing_key)
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Returns the canonicalized body of the message.
    pub fn canonical_body(&self, message: &Message) -> Vec<u8> {
        canonicalize::canonicalize_body(self.config.canonicalization.body, message.body())
    }

    /// Returns the body hash of the message, the *bh=* tag value.
    pub fn body_hash(&self, message: &Message) -> Box<[u8]> {
        let hash_alg = self.config.algorithm.hash_algorithm();
        body_hash::compute_body_hash(hash_alg, self.config.canonicalization.body, message.body())
    }

    /// Returns the exact bytes that are signed for the message.
    pub fn signable_header_block(&self, message: &Message) -> Vec<u8> {
        sign::prepare(&self.config, message).header_block
    }

    /// Returns the Base64-encoded signature for the message, the *b=* tag
    /// value.
    pub fn signature(&self, message: &Message) -> Result<String, SigningError> {
        let result = self.sign_message(message)?;
        Ok(util::encode_base64(&result.signature.signature_data))
    }

    /// Signs a message, returning the signature and the formatted header.
    pub fn sign_message(&self, message: &Message) -> Result<SigningResult, SigningError> {
        let prepared = sign::prepare(&self.config, message);
        sign::perform_signing(prepared, &self.signing_key)
    }

    /// Signs a raw message, returning the message with the `DKIM-Signature`
    /// header prepended. The input bytes are otherwise left unchanged.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        let parsed = Message::parse(message)?;

        let result = self.sign_message(&parsed)?;

        let header = result.format_header();

        let mut signed = Vec::with_capacity(header.len() + 2 + message.len());
        signed.extend(header.bytes());
        signed.extend(b"\r\n");
        signed.extend(message);

        Ok(signed)
    }
}
