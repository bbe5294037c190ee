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
    body_hash,
    crypto::{self, SigningKey},
    header::FieldBody,
    message::Message,
    message_hash,
    signature::DKIM_SIGNATURE_NAME,
    signer::{
        config::{self, SigningConfig},
        format::{self, UnsignedDkimSignature},
        SigningError, SigningResult,
    },
};
use tracing::{debug, trace, warn};

/// A signature ready to be signed: everything derived from one message except
/// the signature data.
pub struct PreparedSignature {
    pub sig: UnsignedDkimSignature,
    /// The formatted header value with empty *b=* tag.
    pub header_value: String,
    /// The index in `header_value` where the *b=* tag value goes.
    pub insertion_index: usize,
    /// The signable header block, the input to the data hash.
    pub header_block: Vec<u8>,
}

/// Derives body hash, signed header names, tag list, and signable header block
/// for a message. The timestamp is resolved here, once.
pub fn prepare(config: &SigningConfig, message: &Message) -> PreparedSignature {
    let algorithm = config.algorithm;
    let canonicalization = config.canonicalization;
    let headers = message.headers();

    debug!(
        domain = %config.domain,
        selector = %config.selector,
        %canonicalization,
        "preparing DKIM signature"
    );

    // calculate body hash

    let hash_alg = algorithm.hash_algorithm();
    let body_hash = body_hash::compute_body_hash(hash_alg, canonicalization.body, message.body());

    // select headers

    let signed_headers = config::signed_header_names(&config.header_selection, headers);

    if !signed_headers.iter().any(|name| *name == "From") {
        warn!("From header not included in signed headers");
    }

    let timestamp = config.timestamp.resolve();

    // prepare complete formatted signature header with body hash except with contents of b= tag

    let sig = UnsignedDkimSignature {
        algorithm,
        body_hash,
        canonicalization,
        domain: config.domain.clone(),
        query_method: config.query_method,
        selector: config.selector.clone(),
        timestamp,
        signed_headers: signed_headers.into(),
    };

    let (header_value, insertion_index) = sig.format_without_signature();

    let header_block = message_hash::signable_header_block(
        canonicalization.header,
        headers,
        &sig.signed_headers,
        DKIM_SIGNATURE_NAME,
        &header_value,
    );

    PreparedSignature {
        sig,
        header_value,
        insertion_index,
        header_block,
    }
}

/// Signs the header block of a prepared signature and completes the
/// `DKIM-Signature` header.
pub fn perform_signing(
    prepared: PreparedSignature,
    signing_key: &SigningKey,
) -> Result<SigningResult, SigningError> {
    let PreparedSignature {
        sig,
        mut header_value,
        insertion_index,
        header_block,
    } = prepared;

    let hash_alg = sig.algorithm.hash_algorithm();

    if signing_key.key_type() != sig.algorithm.key_type() {
        return Err(SigningError::SigningKeyInvalid);
    }

    let data_hash = crypto::digest(hash_alg, &header_block);

    let signature_data = match signing_key.sign(hash_alg, &data_hash) {
        Ok(s) => {
            trace!("RSA signing successful");
            s.into_boxed_slice()
        }
        Err(e) => {
            trace!("RSA signing failed: {e}");
            return Err(SigningError::SigningKeyInvalid);
        }
    };

    // insert signature into formatted dkim-sig header

    format::insert_signature_data(&mut header_value, insertion_index, &signature_data);

    // the finished header must be representable as a header field
    FieldBody::new(header_value.as_bytes()).map_err(|_| SigningError::Encoding)?;

    let sig = sig.into_signature(signature_data);

    Ok(SigningResult {
        signature: sig,
        header_name: DKIM_SIGNATURE_NAME.into(),
        header_value,
    })
}
