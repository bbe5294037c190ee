// dkim-signer – DKIM message signing
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Reading of RFC 5322 messages into header fields and body.

use crate::header::{FieldBody, FieldName, HeaderFields};
use bstr::ByteSlice;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str,
};

/// An error that occurs when reading a message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageParseError {
    /// A header line is neither a continuation line nor contains a colon.
    MissingColon,
    /// A header field name is not well-formed.
    InvalidFieldName,
    /// A header field body is not well-formed.
    InvalidFieldBody,
    /// A continuation line with content appears before the first header field.
    UnexpectedContinuation,
    /// The input is empty.
    EmptyMessage,
}

impl Display for MessageParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColon => write!(f, "header line without colon"),
            Self::InvalidFieldName => write!(f, "invalid header field name"),
            Self::InvalidFieldBody => write!(f, "invalid header field body"),
            Self::UnexpectedContinuation => write!(f, "continuation line before first header field"),
            Self::EmptyMessage => write!(f, "empty message"),
        }
    }
}

impl Error for MessageParseError {}

/// An email message, split into its header fields and its body.
///
/// The header fields are kept in source order with their original name casing
/// and whitespace. The body is kept byte for byte as it appeared in the input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    headers: HeaderFields,
    body: Box<[u8]>,
}

impl Message {
    pub fn new(headers: HeaderFields, body: impl Into<Box<[u8]>>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Reads a message from its raw bytes.
    ///
    /// The header section ends at the first empty line, or at the end of the
    /// input. Header lines may be terminated with CRLF or with a bare LF; in
    /// both cases folded header values are recorded with CRLF line breaks.
    /// Continuation lines consisting of whitespace only are obsolete folding
    /// whitespace: they are kept within a header value, and skipped before
    /// the first header field. The header section may thus be empty.
    pub fn parse(input: &[u8]) -> Result<Self, MessageParseError> {
        if input.is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }

        let mut fields: Vec<(FieldName, Vec<u8>)> = vec![];
        let mut rest = input;

        let body = loop {
            if rest.is_empty() {
                break rest;
            }

            let (line, next) = match rest.find_byte(b'\n') {
                Some(i) => (&rest[..i], &rest[(i + 1)..]),
                None => (rest, &rest[rest.len()..]),
            };
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.is_empty() {
                break next;
            }

            if line.starts_with(b" ") || line.starts_with(b"\t") {
                match fields.last_mut() {
                    Some((_, value)) => {
                        value.extend(b"\r\n");
                        value.extend(line);
                    }
                    None if line.trim_with(|c| matches!(c, ' ' | '\t')).is_empty() => {}
                    None => return Err(MessageParseError::UnexpectedContinuation),
                }
            } else {
                let i = line.find_byte(b':').ok_or(MessageParseError::MissingColon)?;
                let name = str::from_utf8(&line[..i])
                    .map_err(|_| MessageParseError::InvalidFieldName)?;
                let name = FieldName::with_trailing_wsp(name)
                    .map_err(|_| MessageParseError::InvalidFieldName)?;
                fields.push((name, line[(i + 1)..].to_vec()));
            }

            rest = next;
        };

        let headers: Vec<_> = fields
            .into_iter()
            .map(|(name, value)| {
                FieldBody::new(value)
                    .map(|value| (name, value))
                    .map_err(|_| MessageParseError::InvalidFieldBody)
            })
            .collect::<Result<_, _>>()?;

        Ok(Self::new(HeaderFields::new(headers), body))
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ok() {
        let msg = Message::parse(b"A: X \r\nB : Y\t\r\n\tZ  \r\n\r\n C \r\nD \t E\r\n\r\n\r\n").unwrap();

        let headers = msg.headers().as_ref();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0.as_raw_str(), "A");
        assert_eq!(headers[0].1.as_ref(), b" X ");
        assert_eq!(headers[1].0.as_raw_str(), "B ");
        assert_eq!(headers[1].0, "b");
        assert_eq!(headers[1].1.as_ref(), b" Y\t\r\n\tZ  ");

        assert_eq!(msg.body(), b" C \r\nD \t E\r\n\r\n\r\n");
    }

    #[test]
    fn parse_preserves_order_and_repetitions() {
        let msg = Message::parse(b"Received: one\r\nFrom: me\r\nreceived: two\r\n\r\nbody").unwrap();

        let names: Vec<_> = msg.headers().as_ref().iter().map(|(n, _)| n.as_ref()).collect();
        assert_eq!(names, ["Received", "From", "received"]);
        assert_eq!(msg.body(), b"body");
    }

    #[test]
    fn parse_bare_lf() {
        let msg = Message::parse(b"Subject: a\n long one\nTo: you\n\nhi\n").unwrap();

        let headers = msg.headers().as_ref();
        assert_eq!(headers[0].1.as_ref(), b" a\r\n long one");
        assert_eq!(headers[1].1.as_ref(), b" you");
        assert_eq!(msg.body(), b"hi\n");
    }

    #[test]
    fn parse_without_body() {
        let msg = Message::parse(b"From: me\r\n").unwrap();
        assert_eq!(msg.body(), b"");

        let msg = Message::parse(b"From: me").unwrap();
        assert_eq!(msg.headers().as_ref()[0].1.as_ref(), b" me");
        assert_eq!(msg.body(), b"");

        let msg = Message::parse(b"From: me\r\n\r\n").unwrap();
        assert_eq!(msg.body(), b"");
    }

    #[test]
    fn parse_blank_continuation_lines() {
        let msg = Message::parse(b"Subject: a\r\n \r\n b\r\nTo: you\r\n\t\r\n\r\nbody\r\n").unwrap();

        let headers = msg.headers().as_ref();
        assert_eq!(headers[0].1.as_ref(), b" a\r\n \r\n b");
        assert_eq!(headers[1].1.as_ref(), b" you\r\n\t");
        assert_eq!(msg.body(), b"body\r\n");
    }

    #[test]
    fn parse_without_header_fields() {
        let msg = Message::parse(b" ").unwrap();
        assert!(msg.headers().as_ref().is_empty());
        assert_eq!(msg.body(), b"");

        let msg = Message::parse(b" \r\n\t\r\nFrom: me\r\n\r\nhi").unwrap();
        assert_eq!(msg.headers().as_ref()[0].0, "From");
        assert_eq!(msg.body(), b"hi");

        let msg = Message::parse(b"\r\nbody").unwrap();
        assert!(msg.headers().as_ref().is_empty());
        assert_eq!(msg.body(), b"body");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Message::parse(b""), Err(MessageParseError::EmptyMessage));
        assert_eq!(Message::parse(b" x: y\r\n"), Err(MessageParseError::UnexpectedContinuation));
        assert_eq!(Message::parse(b"no colon\r\n"), Err(MessageParseError::MissingColon));
        assert_eq!(Message::parse(b": y\r\n"), Err(MessageParseError::InvalidFieldName));
        assert_eq!(Message::parse(b"A: x\ry\r\n"), Err(MessageParseError::InvalidFieldBody));
    }
}
