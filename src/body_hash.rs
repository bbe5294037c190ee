//! Computation of the body hash.
//!
//! See RFC 6376, section 3.7.

use crate::{
    canonicalize::BodyCanonicalizer,
    crypto::{CountingHasher, HashAlgorithm},
    signature::CanonicalizationAlgorithm,
};

/// A hasher that canonicalizes and digests a message body fed in chunks.
pub struct BodyHasher {
    canonicalizer: BodyCanonicalizer,
    hasher: CountingHasher,
}

impl BodyHasher {
    pub fn new(hash_alg: HashAlgorithm, canon_alg: CanonicalizationAlgorithm) -> Self {
        Self {
            canonicalizer: BodyCanonicalizer::new(canon_alg),
            hasher: CountingHasher::new(hash_alg),
        }
    }

    pub fn hash_chunk(&mut self, chunk: &[u8]) {
        let canonicalized_chunk = self.canonicalizer.canonicalize_chunk(chunk);
        self.hasher.update(&canonicalized_chunk);
    }

    /// Finishes hashing, returning the body hash and the length of the
    /// canonicalized body.
    pub fn finish(self) -> (Box<[u8]>, usize) {
        let Self {
            canonicalizer,
            mut hasher,
        } = self;

        hasher.update(&canonicalizer.finish());
        hasher.finish()
    }
}

/// Computes the hash of a complete message body.
pub fn compute_body_hash(
    hash_alg: HashAlgorithm,
    canon_alg: CanonicalizationAlgorithm,
    body: &[u8],
) -> Box<[u8]> {
    let mut hasher = BodyHasher::new(hash_alg, canon_alg);
    hasher.hash_chunk(body);
    let (hash, _) = hasher.finish();
    hash
}
