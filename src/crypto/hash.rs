use crate::crypto::HashAlgorithm;
use sha2::Sha256;

pub fn digest(hash_alg: HashAlgorithm, bytes: &[u8]) -> Box<[u8]> {
    digest_slices(hash_alg, [bytes])
}

pub fn digest_slices<I, T>(hash_alg: HashAlgorithm, slices: I) -> Box<[u8]>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    use digest::Digest;

    match hash_alg {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            for bytes in slices {
                hasher.update(bytes.as_ref());
            }
            Box::from(&hasher.finalize()[..])
        }
    }
}

/// A hasher that keeps count of the number of bytes digested.
pub struct CountingHasher {
    digest: Box<dyn digest::DynDigest + Send>,
    bytes_written: usize,
}

impl CountingHasher {
    pub fn new(hash_alg: HashAlgorithm) -> Self {
        let digest: Box<dyn digest::DynDigest + Send> = match hash_alg {
            HashAlgorithm::Sha256 => Box::new(Sha256::default()),
        };

        Self {
            digest,
            bytes_written: 0,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
        self.bytes_written += bytes.len();
    }

    /// Returns the digest and the number of bytes digested.
    pub fn finish(self) -> (Box<[u8]>, usize) {
        (self.digest.finalize(), self.bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64ct::{Base64, Encoding};

    #[test]
    fn counting_hasher_ok() {
        let mut hasher = CountingHasher::new(HashAlgorithm::Sha256);
        hasher.update(b"ab");
        hasher.update(b"");
        hasher.update(b"c");

        let (hash, len) = hasher.finish();

        assert_eq!(len, 3);
        assert_eq!(hash, digest(HashAlgorithm::Sha256, b"abc"));
        assert_eq!(hash, digest_slices(HashAlgorithm::Sha256, [&b"a"[..], b"bc"]));
    }

    #[test]
    fn counting_hasher_rfc_examples() {
        // See §3.4.3:
        let (hash, len) = hash_with_counting_hasher(HashAlgorithm::Sha256, b"\r\n");
        assert_eq!(Base64::encode_string(&hash), "frcCV1k9oG9oKj3dpUqdJg1PxRT2RSN/XKdLCPjaYaY=");
        assert_eq!(len, 2);

        // See §3.4.4:
        let (hash, len) = hash_with_counting_hasher(HashAlgorithm::Sha256, b"");
        assert_eq!(Base64::encode_string(&hash), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
        assert_eq!(len, 0);
    }

    fn hash_with_counting_hasher(alg: HashAlgorithm, bytes: &[u8]) -> (Box<[u8]>, usize) {
        let mut hasher = CountingHasher::new(alg);
        hasher.update(bytes);
        hasher.finish()
    }
}
