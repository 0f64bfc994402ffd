// crates/digitalis-harness/src/codec.rs
// ============================================================================
// Module: Payload Codec
// Description: JSON request encoding and status-aware response decoding.
// Purpose: Make "non-success means absent" the only way tests read bodies.
// Dependencies: bytes, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`decode`] and [`decode_text`] return `Ok(None)` for any non-2xx response
//! without looking at the body. Parse failures can only come from success
//! responses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::client::HarnessResponse;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
    /// A success response body did not parse.
    #[error("decode failed for status {status}: {reason}")]
    Decode {
        /// Response status code.
        status: u16,
        /// Parser message.
        reason: String,
    },
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Serializes `value` as a JSON request body.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] when serialization fails, for example on a
/// map with non-string keys.
pub fn encode<T>(value: &T) -> Result<Bytes, CodecError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(value).map(Bytes::from).map_err(|err| CodecError::Encode(err.to_string()))
}

/// Parses a JSON body from a success response.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] when a success body is not valid `T`.
pub fn decode<T>(response: &HarnessResponse) -> Result<Option<T>, CodecError>
where
    T: DeserializeOwned,
{
    if !response.is_success() {
        return Ok(None);
    }
    serde_json::from_slice(response.body()).map(Some).map_err(|err| CodecError::Decode {
        status: response.status().as_u16(),
        reason: err.to_string(),
    })
}

/// Reads a UTF-8 text body from a success response.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] when a success body is not UTF-8.
pub fn decode_text(response: &HarnessResponse) -> Result<Option<String>, CodecError> {
    if !response.is_success() {
        return Ok(None);
    }
    std::str::from_utf8(response.body()).map(|text| Some(text.to_string())).map_err(|err| {
        CodecError::Decode {
            status: response.status().as_u16(),
            reason: err.to_string(),
        }
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
