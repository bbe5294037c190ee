use crate::crypto::{HashAlgorithm, SigningError};
use rsa::{traits::PublicKeyParts, Pkcs1v15Sign, RsaPrivateKey};
use sha2::Sha256;
use tracing::trace;

/// The minimum RSA key size in bits accepted for signing (RFC 8301).
pub const MIN_RSA_KEY_SIZE: usize = 1024;

pub fn get_private_key_size(k: &RsaPrivateKey) -> usize {
    k.size() * 8
}

/// Produces an RSASSA-PKCS1-v1_5 signature over a precomputed data hash.
pub fn sign_rsa(
    hash_alg: HashAlgorithm,
    private_key: &RsaPrivateKey,
    data_hash: &[u8],
) -> Result<Vec<u8>, SigningError> {
    let result = match hash_alg {
        HashAlgorithm::Sha256 => private_key.sign(Pkcs1v15Sign::new::<Sha256>(), data_hash),
    };

    result.map_err(|e| {
        trace!("RSA signing failed: {e}");
        SigningError::SigningFailure
    })
}
