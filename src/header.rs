//! Representation of email header data.

use bstr::ByteSlice;
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
};

/// A header field: name and body, where the body is everything after the
/// colon, without the final line terminator.
pub type HeaderField = (FieldName, FieldBody);

/// An error indicating a malformed header field name or body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderFieldError;

impl Display for HeaderFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "malformed header field")
    }
}

impl Error for HeaderFieldError {}

/// A collection of header fields, in the order in which they appear in the
/// message. The collection may be empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderFields(Box<[HeaderField]>);

impl HeaderFields {
    pub fn new(value: impl Into<Box<[HeaderField]>>) -> Self {
        Self(value.into())
    }

    /// Returns the number of occurrences of the given header name.
    pub fn count(&self, name: &FieldName) -> usize {
        self.0.iter().filter(|(n, _)| n == name).count()
    }
}

impl AsRef<[HeaderField]> for HeaderFields {
    fn as_ref(&self) -> &[HeaderField] {
        &self.0
    }
}

impl From<HeaderFields> for Vec<HeaderField> {
    fn from(header_fields: HeaderFields) -> Self {
        header_fields.0.into_vec()
    }
}

/// A header field name.
///
/// Equivalence comparison is case-insensitive. A name read from a message may
/// retain the (obsolete) whitespace that stood between the name and the colon;
/// that whitespace is ignored in comparisons and reproduced only by simple
/// canonicalization.
#[derive(Clone, Eq)]
pub struct FieldName(Box<str>);

impl FieldName {
    /// Creates a field name, which must be printable ASCII without a colon.
    pub fn new(value: impl Into<Box<str>>) -> Result<Self, HeaderFieldError> {
        let value = value.into();
        if !is_field_name(&value) {
            return Err(HeaderFieldError);
        }
        Ok(Self(value))
    }

    /// Creates a field name as it appeared in the message source, possibly
    /// followed by whitespace.
    pub fn with_trailing_wsp(value: impl Into<Box<str>>) -> Result<Self, HeaderFieldError> {
        let value = value.into();
        if !is_field_name(value.trim_end_matches(is_wsp)) {
            return Err(HeaderFieldError);
        }
        Ok(Self(value))
    }

    /// Returns the name exactly as given, including any trailing whitespace.
    pub fn as_raw_str(&self) -> &str {
        &self.0
    }
}

fn is_field_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_graphic() && c != ':')
}

fn is_wsp(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        self.0.trim_end_matches(is_wsp)
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl Debug for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl PartialEq for FieldName {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref().eq_ignore_ascii_case(other.as_ref())
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        self.as_ref().eq_ignore_ascii_case(other)
    }
}

impl Hash for FieldName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().to_ascii_lowercase().hash(state);
    }
}

/// A header field body.
///
/// Folded lines are joined with CRLF and every continuation line starts with
/// whitespace. A continuation line may consist of whitespace only (obsolete
/// folding whitespace, RFC 5322, section 4.2). There is no final CRLF.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct FieldBody(Box<[u8]>);

impl FieldBody {
    pub fn new(value: impl Into<Box<[u8]>>) -> Result<Self, HeaderFieldError> {
        let value = value.into();
        // only folded continuation lines, no empty lines, no trailing CRLF:
        if !(value.split_str("\r\n").skip(1).all(|line| line.starts_with(b" ") || line.starts_with(b"\t"))) {
            return Err(HeaderFieldError);
        }
        // no stray CR and LF
        if !(value.split_str("\r\n").all(|line| !line.contains(&b'\r') && !line.contains(&b'\n'))) {
            return Err(HeaderFieldError);
        }
        // other bytes are allowed, UTF-8 is not required
        Ok(Self(value))
    }
}

impl AsRef<[u8]> for FieldBody {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for FieldBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldBody")
            .field(&self.0.as_bstr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_ok() {
        assert!(FieldName::new("abc").is_ok());

        assert!(FieldName::new("").is_err());
        assert!(FieldName::new("abc ").is_err());
        assert!(FieldName::new("a:c").is_err());
    }

    #[test]
    fn field_name_trailing_wsp() {
        let name = FieldName::with_trailing_wsp("Subject \t").unwrap();

        assert_eq!(name.as_ref(), "Subject");
        assert_eq!(name.as_raw_str(), "Subject \t");
        assert_eq!(name, FieldName::new("SUBJECT").unwrap());

        assert!(FieldName::with_trailing_wsp(" ").is_err());
        assert!(FieldName::with_trailing_wsp(" Subject").is_err());
    }

    #[test]
    fn field_name_debug() {
        let name = FieldName::with_trailing_wsp("Subject ").unwrap();

        assert_eq!(format!("{name:?}"), "\"Subject \"");
        assert_eq!(format!("{name}"), "Subject");
    }

    #[test]
    fn field_body_ok() {
        assert!(FieldBody::new(*b" ab\r\n\tcd ").is_ok());
        assert!(FieldBody::new(*b"\r\n\ta").is_ok());
        assert!(FieldBody::new(*b"  ").is_ok());
        assert!(FieldBody::new(*b" a\r\n \r\n b").is_ok());
        assert!(FieldBody::new(*b" a\r\n\t ").is_ok());

        assert!(FieldBody::new(*b" \r\na").is_err());
        assert!(FieldBody::new(*b" a\r\n\r\n b").is_err());
        assert!(FieldBody::new(*b" \na").is_err());
        assert!(FieldBody::new(*b" abc\r\n").is_err());
    }

    #[test]
    fn header_fields_ok() {
        let headers = HeaderFields::new([
            (
                FieldName::new("From").unwrap(),
                FieldBody::new(*b" me").unwrap()
            ),
            (
                FieldName::new("To").unwrap(),
                FieldBody::new(*b" you (yes,\r\n\t you!)").unwrap()
            ),
            (
                FieldName::new("to").unwrap(),
                FieldBody::new(*b" and you").unwrap()
            ),
        ]);

        assert_eq!(headers.count(&FieldName::new("TO").unwrap()), 2);
        assert_eq!(headers.count(&FieldName::new("Cc").unwrap()), 0);

        let headers = HeaderFields::new(Vec::<HeaderField>::new());
        assert!(headers.as_ref().is_empty());
    }
}
