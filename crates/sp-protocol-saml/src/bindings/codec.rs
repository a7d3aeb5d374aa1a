//! DEFLATE and Base64 codec shared by both bindings.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{SamlError, SamlResult};

/// Upper bound on an inflated message. Anything larger is rejected.
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

const INFLATE_CHUNK: usize = 16 * 1024;

/// Generates a protocol message ID (`_` followed by 32 hex digits).
///
/// The leading underscore keeps the ID a valid `xs:ID`, which may not start
/// with a digit.
#[must_use]
pub fn generate_id() -> String {
    sp_crypto::generate_message_id()
}

/// Raw-DEFLATE compresses `message` and Base64 encodes the result.
///
/// No zlib header is written, as the Redirect binding requires.
pub fn compress_and_encode(message: &str) -> SamlResult<String> {
    let compressed = deflate(message.as_bytes())?;
    Ok(STANDARD.encode(compressed))
}

/// Base64 decodes `encoded` and raw-inflates the result.
///
/// A truncated or corrupt stream is an error, never a silently shortened
/// message.
pub fn decode_and_decompress(encoded: &str) -> SamlResult<String> {
    let compressed = base64_bytes(encoded)?;
    let inflated = inflate(&compressed)?;
    String::from_utf8(inflated).map_err(|e| SamlError::malformed(format!("invalid UTF-8: {e}")))
}

/// Base64 encodes `message` (POST binding).
#[must_use]
pub fn encode_base64(message: &str) -> String {
    STANDARD.encode(message)
}

/// Base64 decodes a POST binding value.
pub fn decode_base64(encoded: &str) -> SamlResult<String> {
    let bytes = base64_bytes(encoded)?;
    if bytes.len() > MAX_MESSAGE_LEN {
        return Err(SamlError::malformed("message too large"));
    }
    String::from_utf8(bytes).map_err(|e| SamlError::malformed(format!("invalid UTF-8: {e}")))
}

/// Decodes Base64, tolerating the line breaks some IdPs insert.
fn base64_bytes(encoded: &str) -> SamlResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(SamlError::malformed("empty message"));
    }
    Ok(STANDARD.decode(compact)?)
}

pub(crate) fn deflate(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Raw-inflates `data`, rejecting output above [`MAX_MESSAGE_LEN`] and
/// streams that end before their final block.
pub(crate) fn inflate(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut inflater = Decompress::new(false);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).min(MAX_MESSAGE_LEN));

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_CHUNK);
        }

        let (in_before, out_before) = (inflater.total_in(), inflater.total_out());
        let offset = usize::try_from(in_before).unwrap_or(data.len()).min(data.len());
        // Output grows in chunks, so never flush with Finish here.
        let status = inflater
            .decompress_vec(&data[offset..], &mut out, FlushDecompress::None)
            .map_err(|e| SamlError::malformed(format!("corrupt deflate stream: {e}")))?;

        if out.len() > MAX_MESSAGE_LEN {
            return Err(SamlError::malformed("inflated message too large"));
        }
        if status == Status::StreamEnd {
            return Ok(out);
        }
        if inflater.total_in() == in_before && inflater.total_out() == out_before {
            return Err(SamlError::malformed("truncated deflate stream"));
        }
    }
}
