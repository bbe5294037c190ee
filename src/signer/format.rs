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

use crate::{
    header::FieldName,
    signature::{
        Canonicalization, DkimSignature, DomainName, QueryMethod, Selector, SignatureAlgorithm,
    },
    util::{self, CanonicalStr},
};

/// A DKIM signature with all tag values except the signature data.
pub struct UnsignedDkimSignature {
    pub algorithm: SignatureAlgorithm,
    pub body_hash: Box<[u8]>,
    pub canonicalization: Canonicalization,
    pub domain: DomainName,
    pub query_method: QueryMethod,
    pub selector: Selector,
    pub timestamp: u64,
    pub signed_headers: Box<[FieldName]>,
}

impl UnsignedDkimSignature {
    /// Returns the formatted header value with an empty *b=* tag, and the index
    /// where the *b=* tag value is to be inserted.
    pub fn format_without_signature(&self) -> (String, usize) {
        format_without_signature(self)
    }

    pub fn into_signature(self, signature_data: Box<[u8]>) -> DkimSignature {
        DkimSignature {
            algorithm: self.algorithm,
            signature_data,
            body_hash: self.body_hash,
            canonicalization: self.canonicalization,
            domain: self.domain,
            query_method: self.query_method,
            selector: self.selector,
            timestamp: self.timestamp,
            signed_headers: self.signed_headers,
        }
    }
}

// The tags are emitted on one line in the fixed order v, a, c, d, q, s, t, bh,
// h, b. The value begins with a space, so that name and value joined by a
// colon read `DKIM-Signature: v=1; ...`.
fn format_without_signature(sig: &UnsignedDkimSignature) -> (String, usize) {
    let mut out = String::new();

    let domain = sig.domain.to_ascii();
    let selector = sig.selector.to_ascii();
    let timestamp = sig.timestamp.to_string();
    let body_hash = util::encode_base64(&sig.body_hash);
    let signed_headers = format_field_names(&sig.signed_headers);

    let tags = [
        ("v", "1"),
        ("a", sig.algorithm.canonical_str()),
        ("c", sig.canonicalization.canonical_str()),
        ("d", select_str_form(&sig.domain, &domain)),
        ("q", sig.query_method.canonical_str()),
        ("s", select_str_form(&sig.selector, &selector)),
        ("t", timestamp.as_str()),
        ("bh", body_hash.as_str()),
        ("h", signed_headers.as_str()),
    ];

    for (name, value) in tags {
        format_tag(&mut out, name, value);
    }

    out.push_str(" b=");

    let insertion_i = out.len();

    (out, insertion_i)
}

fn format_tag(out: &mut String, name: &str, value: &str) {
    debug_assert!(name.is_ascii());

    out.push(' ');
    out.push_str(name);
    out.push('=');
    out.push_str(value);
    out.push(';');
}

fn format_field_names(names: &[FieldName]) -> String {
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(":")
}

// Keep the configured spelling unless it differs from the A-label form in
// more than case, as U-labels do.
fn select_str_form<'a>(orig: &'a impl AsRef<str>, xformed: &'a str) -> &'a str {
    if orig.as_ref().eq_ignore_ascii_case(xformed) {
        orig.as_ref()
    } else {
        xformed
    }
}

/// Inserts the Base64-encoded signature data at the insertion index.
pub fn insert_signature_data(
    formatted_header_value: &mut String,
    insertion_index: usize,
    signature_data: &[u8],
) {
    let s = util::encode_base64(signature_data);
    formatted_header_value.insert_str(insertion_index, &s);
}
