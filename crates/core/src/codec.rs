//! Metadata payload encodings
//!
//! Payloads are opaque bytes to the store. All scalars are little-endian:
//! record counts are `i64`, column sizes and counts are `i32`, array cells are
//! `f64`. Strings are raw UTF-8 without a terminator.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Failure to interpret a metadata payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload has the wrong size for its type
    #[error("payload for {what} has {actual} bytes, expected {expected}")]
    Length {
        /// What was being decoded
        what: &'static str,
        /// Expected byte count
        expected: usize,
        /// Actual byte count
        actual: usize,
    },

    /// Boundary code outside the known set
    #[error("unknown boundary code {0}")]
    UnknownBoundary(i32),

    /// Triclinic flag other than 0 or 1
    #[error("invalid triclinic flag {0}")]
    InvalidFlag(i32),

    /// String payload is not UTF-8
    #[error("payload for {0} is not valid UTF-8")]
    Utf8(&'static str),
}

fn expect_len(what: &'static str, bytes: &[u8], expected: usize) -> Result<(), DecodeError> {
    if bytes.len() != expected {
        return Err(DecodeError::Length {
            what,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Encode an `i64` scalar.
pub fn encode_i64(value: i64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    LittleEndian::write_i64(&mut buf, value);
    buf
}

/// Decode an `i64` scalar.
pub fn decode_i64(bytes: &[u8]) -> Result<i64, DecodeError> {
    expect_len("i64", bytes, 8)?;
    Ok(LittleEndian::read_i64(bytes))
}

/// Encode an `i32` scalar.
pub fn encode_i32(value: i32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    LittleEndian::write_i32(&mut buf, value);
    buf
}

/// Decode an `i32` scalar.
pub fn decode_i32(bytes: &[u8]) -> Result<i32, DecodeError> {
    expect_len("i32", bytes, 4)?;
    Ok(LittleEndian::read_i32(bytes))
}

/// Decode a UTF-8 string payload.
pub fn decode_str(what: &'static str, bytes: &[u8]) -> Result<String, DecodeError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::Utf8(what))
}

/// Serialize `values` into `out`, reusing its allocation.
///
/// `out` is resized to exactly `values.len() * 8` bytes; its capacity only grows.
pub fn encode_f64s_into(values: &[f64], out: &mut Vec<u8>) {
    out.resize(values.len() * 8, 0);
    LittleEndian::write_f64_into(values, out);
}

/// Deserialize a packed `f64` array.
pub fn decode_f64s(bytes: &[u8]) -> Result<Vec<f64>, DecodeError> {
    if bytes.len() % 8 != 0 {
        return Err(DecodeError::Length {
            what: "f64 array",
            expected: bytes.len() / 8 * 8,
            actual: bytes.len(),
        });
    }
    let mut values = vec![0.0; bytes.len() / 8];
    LittleEndian::read_f64_into(bytes, &mut values);
    Ok(values)
}
