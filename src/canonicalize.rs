//! Canonicalization utilities.
//!
//! See RFC 6376, section 3.4.

use crate::{
    header::{FieldName, HeaderFields},
    signature::CanonicalizationAlgorithm,
};
use bstr::ByteSlice;
use std::collections::HashSet;

const SP: u8 = b' ';
const CR: u8 = b'\r';
const LF: u8 = b'\n';
const CRLF: [u8; 2] = [CR, LF];

// which state are we in = what did we see last?
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CanonState {
    Init,
    CrLf,
    Cr,
    Wsp,
    WspCr,
    Byte,
}

/// A canonicalizer using a body canonicalization algorithm.
///
/// The body may be fed in chunks of any size, line breaks split across chunks
/// are handled. Trailing empty lines are held back until either content
/// follows or the body ends.
pub struct BodyCanonicalizer {
    kind: CanonicalizationAlgorithm,
    state: CanonState,
    blank_line: bool,  // whether currently on an empty or blank line
    empty_lines: usize,  // number of empty lines seen and held back
    emitted: bool,  // whether any body content has been produced
}

impl BodyCanonicalizer {
    pub fn simple() -> Self {
        Self::new(CanonicalizationAlgorithm::Simple)
    }

    pub fn relaxed() -> Self {
        Self::new(CanonicalizationAlgorithm::Relaxed)
    }

    pub fn new(kind: CanonicalizationAlgorithm) -> Self {
        Self {
            kind,
            state: CanonState::Init,
            blank_line: true,
            empty_lines: 0,
            emitted: false,
        }
    }

    /// Canonicalizes a chunk of the body, returning the canonical bytes that
    /// can be produced so far.
    // only CRLF is recognised as line separator/terminator, stray CR and LF are
    // treated like other bytes
    pub fn canonicalize_chunk(&mut self, bytes: &[u8]) -> Vec<u8> {
        match self.kind {
            CanonicalizationAlgorithm::Simple => self.canonicalize_chunk_simple(bytes),
            CanonicalizationAlgorithm::Relaxed => self.canonicalize_chunk_relaxed(bytes),
        }
    }

    fn canonicalize_chunk_simple(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut result = vec![];

        for &b in bytes {
            match self.state {
                CanonState::Init | CanonState::CrLf => {
                    if b == CR {
                        self.state = CanonState::Cr;
                    } else {
                        self.flush_empty_lines(&mut result);
                        result.push(b);
                        self.state = CanonState::Byte;
                    }
                }
                CanonState::Cr => {
                    if b == LF {
                        self.end_line(&mut result);
                        continue;
                    }

                    self.flush_empty_lines(&mut result);
                    result.push(CR);

                    if b != CR {
                        result.push(b);
                        self.state = CanonState::Byte;
                    }
                }
                CanonState::Byte => {
                    if b == CR {
                        self.state = CanonState::Cr;
                    } else {
                        result.push(b);
                    }
                }
                CanonState::Wsp | CanonState::WspCr => {
                    unreachable!("whitespace state in simple canonicalization")
                }
            }
        }

        result
    }

    fn canonicalize_chunk_relaxed(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut result = vec![];

        for &b in bytes {
            match self.state {
                CanonState::Init | CanonState::CrLf => {
                    if is_wsp(b) {
                        self.state = CanonState::Wsp;
                    } else if b == CR {
                        self.state = CanonState::Cr;
                    } else {
                        self.flush_empty_lines(&mut result);
                        result.push(b);
                        self.state = CanonState::Byte;
                    }
                }
                CanonState::Wsp => {
                    if b == CR {
                        self.state = CanonState::WspCr;
                    } else if !is_wsp(b) {
                        self.flush_empty_lines(&mut result);
                        result.push(SP);
                        result.push(b);
                        self.state = CanonState::Byte;
                    }
                }
                CanonState::Cr => {
                    if b == LF {
                        self.end_line(&mut result);
                        continue;
                    }

                    self.flush_empty_lines(&mut result);
                    result.push(CR);

                    if is_wsp(b) {
                        self.state = CanonState::Wsp;
                    } else if b != CR {
                        result.push(b);
                        self.state = CanonState::Byte;
                    }
                }
                CanonState::WspCr => {
                    // trailing whitespace before CRLF is dropped
                    if b == LF {
                        self.end_line(&mut result);
                        continue;
                    }

                    self.flush_empty_lines(&mut result);
                    result.push(SP);
                    result.push(CR);

                    if b == CR {
                        self.state = CanonState::Cr;
                    } else if is_wsp(b) {
                        self.state = CanonState::Wsp;
                    } else {
                        result.push(b);
                        self.state = CanonState::Byte;
                    }
                }
                CanonState::Byte => {
                    if is_wsp(b) {
                        self.state = CanonState::Wsp;
                    } else if b == CR {
                        self.state = CanonState::Cr;
                    } else {
                        result.push(b);
                    }
                }
            }
        }

        result
    }

    /// Finishes canonicalization, returning the final canonical bytes.
    pub fn finish(mut self) -> Vec<u8> {
        match self.kind {
            CanonicalizationAlgorithm::Simple => {
                match self.state {
                    CanonState::Init => CRLF.to_vec(),  // empty body is CRLF
                    CanonState::CrLf => {
                        if self.emitted {
                            vec![]
                        } else {
                            CRLF.to_vec()  // body of only empty lines is CRLF
                        }
                    }
                    CanonState::Cr => {
                        let mut result = vec![];
                        self.flush_empty_lines(&mut result);
                        result.push(CR);
                        result.extend(CRLF);  // body needs final CRLF
                        result
                    }
                    CanonState::Byte => CRLF.to_vec(),  // body needs final CRLF
                    CanonState::Wsp | CanonState::WspCr => {
                        unreachable!("whitespace state in simple canonicalization")
                    }
                }
            }
            CanonicalizationAlgorithm::Relaxed => {
                match self.state {
                    CanonState::Init | CanonState::CrLf => vec![],
                    CanonState::Cr => {
                        let mut result = vec![];
                        self.flush_empty_lines(&mut result);
                        result.push(CR);
                        result.extend(CRLF);  // non-empty body needs final CRLF
                        result
                    }
                    CanonState::Wsp => {
                        if self.blank_line {
                            // only whitespace on the final line, which is
                            // therefore empty
                            vec![]
                        } else {
                            CRLF.to_vec()  // non-empty body needs final CRLF
                        }
                    }
                    CanonState::WspCr => {
                        let mut result = vec![];
                        self.flush_empty_lines(&mut result);
                        result.push(SP);
                        result.push(CR);
                        result.extend(CRLF);  // non-empty body needs final CRLF
                        result
                    }
                    CanonState::Byte => CRLF.to_vec(),  // non-empty body needs final CRLF
                }
            }
        }
    }

    fn end_line(&mut self, result: &mut Vec<u8>) {
        if self.blank_line {
            self.empty_lines += 1;
        } else {
            result.extend(CRLF);
            self.blank_line = true;
        }
        self.state = CanonState::CrLf;
    }

    // write out held-back empty lines before processing the byte that ends a
    // run of empty lines
    fn flush_empty_lines(&mut self, result: &mut Vec<u8>) {
        for _ in 0..self.empty_lines {
            result.extend(CRLF);
        }
        self.empty_lines = 0;
        self.blank_line = false;
        self.emitted = true;
    }
}

fn is_wsp(b: u8) -> bool {
    matches!(b, b'\t' | b' ')
}

/// Canonicalizes a complete message body.
pub fn canonicalize_body(algorithm: CanonicalizationAlgorithm, body: &[u8]) -> Vec<u8> {
    let mut canonicalizer = BodyCanonicalizer::new(algorithm);
    let mut result = canonicalizer.canonicalize_chunk(body);
    result.extend(canonicalizer.finish());
    result
}

/// Produces the header canonicalization result for some header fields.
///
/// For each selected name, the bottom-most header field with that name that
/// has not yet been used is canonicalized and terminated with CRLF. Selected
/// names without a remaining occurrence contribute nothing.
pub fn canonicalize_headers(
    algorithm: CanonicalizationAlgorithm,
    headers: &HeaderFields,
    selected_headers: &[FieldName],
) -> Vec<u8> {
    let mut result = vec![];
    let mut processed_indexes = HashSet::with_capacity(selected_headers.len());

    for selected_header in selected_headers {
        for (i, (name, val)) in headers
            .as_ref()
            .iter()
            .enumerate()
            .rev()
            .filter(|(i, _)| !processed_indexes.contains(i))
        {
            if name == selected_header {
                canonicalize_header(&mut result, algorithm, name.as_raw_str(), val);

                result.extend(CRLF);

                processed_indexes.insert(i);

                break;
            }
        }
    }

    result
}

/// Canonicalizes a header field into some result vector, without a final
/// CRLF.
pub fn canonicalize_header(
    result: &mut Vec<u8>,
    algorithm: CanonicalizationAlgorithm,
    name: impl AsRef<str>,
    value: impl AsRef<[u8]>,
) {
    let name = name.as_ref();
    let value = value.as_ref();

    match algorithm {
        CanonicalizationAlgorithm::Simple => {
            result.extend(name.bytes());
            result.push(b':');
            result.extend(value);
        }
        CanonicalizationAlgorithm::Relaxed => {
            let name = name.trim_end_matches(|c| matches!(c, ' ' | '\t'));
            result.extend(name.to_ascii_lowercase().bytes());
            result.push(b':');
            canonicalize_header_relaxed(result, value);
        }
    }
}

fn canonicalize_header_relaxed(result: &mut Vec<u8>, value: &[u8]) {
    fn is_space(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\r' | '\n')
    }

    // unfolding and whitespace compression in one go: CRLF only occurs
    // before continuation whitespace in a well-formed value
    let value = value.trim_with(is_space);

    let mut compressing = false;
    for &b in value {
        if is_space(b.into()) {
            if !compressing {
                result.push(SP);
                compressing = true;
            }
        } else {
            result.push(b);
            compressing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{header::FieldBody, message::Message};
    use bstr::{BStr, ByteSlice};

    #[test]
    fn canonicalize_headers_relaxed_ok() {
        let message = Message::parse(
            b"from: Good \t \r\nto: see   me\r\nDate: Fri 24\r\n\tfoo\r\nTo: another one\r\n\r\n",
        )
        .unwrap();
        let headers = message.headers();

        let selected_headers = vec![
            FieldName::new("to").unwrap(),
            FieldName::new("from").unwrap(),
            FieldName::new("to").unwrap(),
            FieldName::new("date").unwrap(),
            FieldName::new("to").unwrap(),
        ];

        assert_eq!(
            BStr::new(&canonicalize_headers(
                CanonicalizationAlgorithm::Relaxed,
                headers,
                &selected_headers,
            )),
            BStr::new(&b"to:another one\r\nfrom:Good\r\nto:see me\r\ndate:Fri 24 foo\r\n"[..]),
        );
    }

    #[test]
    fn canonicalize_headers_simple_ok() {
        let headers = HeaderFields::new(vec![
            (
                FieldName::with_trailing_wsp("B ").unwrap(),
                FieldBody::new(*b" Y\t\r\n\tZ  ").unwrap(),
            ),
            (
                FieldName::new("Subject").unwrap(),
                FieldBody::new(*b"  Hello ").unwrap(),
            ),
        ]);

        let selected_headers = vec![
            FieldName::new("subject").unwrap(),
            FieldName::new("b").unwrap(),
            FieldName::new("missing").unwrap(),
        ];

        assert_eq!(
            BStr::new(&canonicalize_headers(
                CanonicalizationAlgorithm::Simple,
                &headers,
                &selected_headers,
            )),
            BStr::new(&b"Subject:  Hello \r\nB : Y\t\r\n\tZ  \r\n"[..]),
        );
    }

    #[test]
    fn canonicalize_header_relaxed_unfolds() {
        let mut result = vec![];
        canonicalize_header(&mut result, CanonicalizationAlgorithm::Relaxed, "B ", b" Y\t\r\n\tZ  ");
        result.extend(CRLF);

        assert_eq!(BStr::new(&result), BStr::new(b"b:Y Z\r\n"));
    }

    #[test]
    fn canonicalize_header_relaxed_idempotent() {
        let mut once = vec![];
        canonicalize_header(&mut once, CanonicalizationAlgorithm::Relaxed, "Subject", b"  a \t b\r\n  c ");

        let (name, value) = once.split_at(once.find_byte(b':').unwrap());
        let name = std::str::from_utf8(name).unwrap();

        let mut twice = vec![];
        canonicalize_header(&mut twice, CanonicalizationAlgorithm::Relaxed, name, &value[1..]);

        assert_eq!(BStr::new(&once), BStr::new(b"subject:a b c"));
        assert_eq!(once, twice);
    }

    #[test]
    fn body_canon_simple_ok() {
        let bc = BodyCanonicalizer::simple();

        let body = canonicalize_chunks(
            bc,
            &[b"well  hello \r\n", b"\r\n what agi \r\n\r\n", b"\r\n"],
        );

        assert_eq!(body, b"well  hello \r\n\r\n what agi \r\n");
    }

    #[test]
    fn body_canon_simple_keeps_whitespace_lines() {
        let body = canonicalize_body(CanonicalizationAlgorithm::Simple, b" C \r\nD \t E\r\n \r\n\r\n");

        assert_eq!(body, b" C \r\nD \t E\r\n \r\n");
    }

    #[test]
    fn body_canon_relaxed_basic() {
        let bc = BodyCanonicalizer::relaxed();

        let body = canonicalize_chunks(
            bc,
            &[b"well  hello \r\n", b"\r\n what agi \r\n\r\n", b"\r\n"],
        );

        assert_eq!(body, b"well hello\r\n\r\n what agi\r\n");
    }

    #[test]
    fn body_canon_relaxed_small_chunks() {
        let bc = BodyCanonicalizer::relaxed();

        let body = canonicalize_chunks(
            bc,
            &[
                b"well ",
                b" hello ",
                b"\r",
                b"\n\r",
                b"\n what agi \r\n\r\n",
                b"\r\n",
            ],
        );

        assert_eq!(body, b"well hello\r\n\r\n what agi\r\n");
    }

    #[test]
    fn body_canon_relaxed_initial_empty_lines() {
        let bc = BodyCanonicalizer::relaxed();

        let body = canonicalize_chunks(bc, &[b"\r\n\r\n", b"\ra \r", b"\nb  ", b"c"]);

        assert_eq!(body, b"\r\n\r\n\ra\r\nb c\r\n");
    }

    #[test]
    fn body_canon_relaxed_whitespace_lines_are_empty() {
        let body = canonicalize_body(CanonicalizationAlgorithm::Relaxed, b"a\r\n \t \r\n  ");

        assert_eq!(body, b"a\r\n");
    }

    #[test]
    fn body_canon_quoted_printable_is_opaque() {
        let body = canonicalize_body(
            CanonicalizationAlgorithm::Relaxed,
            b"This is the body of \t the message.=0D=0AThis is the second line\r\n\r\n",
        );

        assert_eq!(
            BStr::new(&body),
            BStr::new(b"This is the body of the message.=0D=0AThis is the second line\r\n"),
        );
    }

    #[test]
    fn body_canon_empty_body() {
        use CanonicalizationAlgorithm::*;

        assert_eq!(canonicalize_body(Simple, b""), b"\r\n");
        assert_eq!(canonicalize_body(Simple, b"\r\n"), b"\r\n");
        assert_eq!(canonicalize_body(Simple, b"\r\n\r\n\r\n"), b"\r\n");

        assert_eq!(canonicalize_body(Relaxed, b""), b"");
        assert_eq!(canonicalize_body(Relaxed, b"\r\n"), b"");
        assert_eq!(canonicalize_body(Relaxed, b" \t\r\n\r\n"), b"");
    }

    #[test]
    fn body_canon_simple_only_empty_lines_chunked() {
        // nothing emitted before the body ends: a single CRLF, as for an empty body
        let body = canonicalize_chunks(BodyCanonicalizer::simple(), &[b"\r\n", b"\r", b"\n\r\n"]);
        assert_eq!(body, b"\r\n");

        // content emitted: trailing empty lines are dropped, nothing is added
        let body = canonicalize_chunks(BodyCanonicalizer::simple(), &[b"a\r\n", b"\r", b"\n"]);
        assert_eq!(body, b"a\r\n");
    }

    #[test]
    fn body_canon_relaxed_final_whitespace_line_chunked() {
        // whitespace-only final line without CRLF counts as an empty line
        let body = canonicalize_chunks(BodyCanonicalizer::relaxed(), &[b"a\r\n", b" \t", b" "]);
        assert_eq!(body, b"a\r\n");

        // a final line with content gets its CRLF
        let body = canonicalize_chunks(BodyCanonicalizer::relaxed(), &[b"a\r\n", b" b", b" "]);
        assert_eq!(body, b"a\r\n b\r\n");
    }

    #[test]
    fn body_canon_idempotent() {
        use CanonicalizationAlgorithm::*;

        let body = b"  Hi  there \r\n\r\n\tyou\t\r\nlast line without CRLF  ";

        for alg in [Simple, Relaxed] {
            let once = canonicalize_body(alg, body);
            let twice = canonicalize_body(alg, &once);
            assert_eq!(once, twice);
        }
    }

    fn canonicalize_chunks(mut bc: BodyCanonicalizer, chunks: &[&[u8]]) -> Vec<u8> {
        let mut result = vec![];
        for c in chunks {
            result.extend(bc.canonicalize_chunk(c));
        }
        result.extend(bc.finish());
        result
    }
}
