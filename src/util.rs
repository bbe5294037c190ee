use base64ct::{Base64, Encoding};

/// A trait for entities that have a canonical string representation in DKIM.
pub trait CanonicalStr {
    /// Returns the canonical string representation.
    fn canonical_str(&self) -> &'static str;
}

/// Encodes bytes as a Base64 string, standard alphabet with padding and no
/// line breaks.
pub fn encode_base64(input: impl AsRef<[u8]>) -> String {
    Base64::encode_string(input.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_base64_ok() {
        assert_eq!(encode_base64(b""), "");
        assert_eq!(encode_base64(b"\r\n"), "DQo=");
        assert_eq!(encode_base64([0xfb, 0xff]), "+/8=");
    }
}
