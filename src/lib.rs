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

//! A library for signing email messages with *DomainKeys Identified Mail*
//! (DKIM) signatures as described in [RFC 6376].
//!
//! Signatures use the *rsa-sha256* algorithm. Both the *simple* and the
//! *relaxed* canonicalization algorithms are supported, for header and body
//! independently.
//!
//! # Usage
//!
//! The type [`Signer`] provides the entry point to signing. It is constructed
//! once from a [`SigningConfig`] and a [`SigningKey`], and can then sign any
//! number of messages, also concurrently.
//!
//! Besides the high-level API, the building blocks of the signing process are
//! available in the modules `canonicalize`, `body_hash`, `message_hash`, and
//! `crypto`.
//!
//! [RFC 6376]: https://www.rfc-editor.org/rfc/rfc6376

pub mod body_hash;
pub mod canonicalize;
pub mod crypto;
pub mod header;
pub mod message;
pub mod message_hash;
pub mod signature;
pub mod signer;
mod util;

pub use crate::{
    crypto::{KeyParseError, SigningKey},
    header::{FieldBody, FieldName, HeaderField, HeaderFields},
    message::{Message, MessageParseError},
    signature::{
        Canonicalization, CanonicalizationAlgorithm, DkimSignature, DomainName, Selector,
        SignatureAlgorithm,
    },
    signer::{
        ConfigError, HeaderSelection, Signer, SignerError, SigningConfig, SigningError,
        SigningResult, Timestamp,
    },
    util::{encode_base64, CanonicalStr},
};
