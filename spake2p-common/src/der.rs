// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! DER/ASN.1 integer and ECDSA signature codec.
//!
//! Converts between the fixed-width big-endian integers elliptic-curve math works
//! with and their minimal DER `INTEGER` encoding, and between raw `r || s` ECDSA
//! signatures and the X9.62 `SEQUENCE { INTEGER r, INTEGER s }` form.
//!
//! Only content lengths up to 127 bytes are produced for integers, which covers
//! every NIST prime curve scalar. Decoding is strict: any non-minimal length,
//! oversized integer or trailing byte is rejected.

use bytes::Buf;

use crate::error::{CryptoError, Result};
use crate::types::MAX_FE_LENGTH;

/// ASN.1 `INTEGER` tag
pub const TAG_INTEGER: u8 = 0x02;

/// ASN.1 constructed `SEQUENCE` tag
pub const TAG_SEQUENCE: u8 = 0x30;

/// Largest content length that still uses the short length form
const SHORT_FORM_MAX: usize = 0x7f;

/// Worst-case size of one DER-encoded scalar: tag, length, stuffing byte, value
const MAX_DER_INTEGER_LENGTH: usize = MAX_FE_LENGTH + 3;

fn read_u8<B: Buf>(reader: &mut B) -> Result<u8> {
    if !reader.has_remaining() {
        return Err(CryptoError::BufferTooSmall);
    }
    Ok(reader.get_u8())
}

/// Read a DER length field.
///
/// Short form (`< 0x80`) returns the byte itself. Long form reads up to
/// `size_of::<usize>()` big-endian length bytes and rejects anything DER would
/// have encoded shorter: a single long-form byte below `0x80`, or a leading
/// zero byte in a multi-byte length.
///
/// # Errors
///
/// `InvalidArgument` on non-minimal or unsupported encodings, `BufferTooSmall`
/// if the reader runs out of bytes.
pub fn read_der_length<B: Buf>(reader: &mut B) -> Result<usize> {
    let first = read_u8(reader)?;
    if first & 0x80 == 0 {
        return Ok(usize::from(first));
    }

    let length_bytes = usize::from(first & 0x7f);
    // Zero length bytes is the BER indefinite form, never valid in DER
    if length_bytes == 0 || length_bytes > core::mem::size_of::<usize>() {
        return Err(CryptoError::InvalidArgument);
    }

    let mut length: usize = 0;
    for i in 0..length_bytes {
        let byte = read_u8(reader)?;
        if i == 0 && length_bytes > 1 && byte == 0 {
            return Err(CryptoError::InvalidArgument);
        }
        length = (length << 8) | usize::from(byte);
    }

    if length_bytes == 1 && length <= SHORT_FORM_MAX {
        return Err(CryptoError::InvalidArgument);
    }

    Ok(length)
}

fn convert_integer_raw_to_der_internal(
    raw_integer: &[u8],
    out: &mut [u8],
    include_tag_and_length: bool,
) -> Result<usize> {
    if raw_integer.is_empty() || out.is_empty() {
        return Err(CryptoError::InvalidArgument);
    }

    // Keep at least one byte so that zero still encodes as 0x00
    let first_significant = raw_integer
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(raw_integer.len() - 1);
    let value = &raw_integer[first_significant..];

    let needs_stuffing = value[0] & 0x80 != 0;
    let payload_len = value.len() + usize::from(needs_stuffing);
    if payload_len > SHORT_FORM_MAX {
        return Err(CryptoError::InvalidArgument);
    }

    let header_len = if include_tag_and_length { 2 } else { 0 };
    let encoded_len = header_len + payload_len;
    if out.len() < encoded_len {
        return Err(CryptoError::BufferTooSmall);
    }

    let mut pos = 0;
    if include_tag_and_length {
        out[0] = TAG_INTEGER;
        out[1] = u8::try_from(payload_len).map_err(|_| CryptoError::InvalidArgument)?;
        pos = 2;
    }
    if needs_stuffing {
        out[pos] = 0x00;
        pos += 1;
    }
    out[pos..pos + value.len()].copy_from_slice(value);

    Ok(encoded_len)
}

/// Encode a big-endian unsigned integer as a full DER `INTEGER` (tag, length, content).
///
/// Leading zero bytes are stripped and a `0x00` is prepended when the most
/// significant remaining bit is set. Returns the number of bytes written.
pub fn convert_integer_raw_to_der(raw_integer: &[u8], out: &mut [u8]) -> Result<usize> {
    convert_integer_raw_to_der_internal(raw_integer, out, true)
}

/// Same as [`convert_integer_raw_to_der`], but writes only the content octets.
pub fn convert_integer_raw_to_der_without_tag(raw_integer: &[u8], out: &mut [u8]) -> Result<usize> {
    convert_integer_raw_to_der_internal(raw_integer, out, false)
}

/// Read a DER `INTEGER` into a fixed-width big-endian buffer.
///
/// The integer may be at most one byte longer than `raw_out`, in which case that
/// extra leading byte must be the zero stuffing byte. Shorter integers are
/// left-padded with zeros.
///
/// # Errors
///
/// `InvalidArgument` for a wrong tag, an empty or oversized integer, or a
/// non-zero extra byte; `BufferTooSmall` if the reader is truncated.
pub fn read_der_unsigned_integer_into_raw<B: Buf>(reader: &mut B, raw_out: &mut [u8]) -> Result<()> {
    if raw_out.is_empty() {
        return Err(CryptoError::InvalidArgument);
    }

    if read_u8(reader)? != TAG_INTEGER {
        return Err(CryptoError::InvalidArgument);
    }

    let mut integer_len = read_der_length(reader)?;
    if integer_len == 0 || integer_len > raw_out.len() + 1 {
        return Err(CryptoError::InvalidArgument);
    }
    if reader.remaining() < integer_len {
        return Err(CryptoError::BufferTooSmall);
    }

    if integer_len == raw_out.len() + 1 {
        if reader.get_u8() != 0x00 {
            return Err(CryptoError::InvalidArgument);
        }
        integer_len -= 1;
    }

    let offset = raw_out.len() - integer_len;
    raw_out[..offset].fill(0);
    reader.copy_to_slice(&mut raw_out[offset..]);

    Ok(())
}

/// Convert a raw `r || s` ECDSA signature into X9.62 DER form.
///
/// `fe_length` is the size of each scalar; `raw_signature` must be exactly twice
/// that. Returns the number of bytes written to `out_der`.
pub fn ecdsa_raw_signature_to_asn1(
    fe_length: usize,
    raw_signature: &[u8],
    out_der: &mut [u8],
) -> Result<usize> {
    if fe_length == 0 || fe_length > MAX_FE_LENGTH || raw_signature.len() != 2 * fe_length {
        return Err(CryptoError::InvalidArgument);
    }

    let (raw_r, raw_s) = raw_signature.split_at(fe_length);

    let mut r_der = [0u8; MAX_DER_INTEGER_LENGTH];
    let r_len = convert_integer_raw_to_der(raw_r, &mut r_der)?;
    let mut s_der = [0u8; MAX_DER_INTEGER_LENGTH];
    let s_len = convert_integer_raw_to_der(raw_s, &mut s_der)?;

    let sequence_len = r_len + s_len;
    let mut header = [0u8; 3];
    let header_len = if sequence_len <= SHORT_FORM_MAX {
        header[0] = TAG_SEQUENCE;
        header[1] = u8::try_from(sequence_len).map_err(|_| CryptoError::InvalidArgument)?;
        2
    } else {
        header[0] = TAG_SEQUENCE;
        header[1] = 0x81;
        header[2] = u8::try_from(sequence_len).map_err(|_| CryptoError::InvalidArgument)?;
        3
    };

    let total_len = header_len + sequence_len;
    if out_der.len() < total_len {
        return Err(CryptoError::BufferTooSmall);
    }

    out_der[..header_len].copy_from_slice(&header[..header_len]);
    out_der[header_len..header_len + r_len].copy_from_slice(&r_der[..r_len]);
    out_der[header_len + r_len..total_len].copy_from_slice(&s_der[..s_len]);

    Ok(total_len)
}

/// Convert an X9.62 DER ECDSA signature into raw `r || s` form.
///
/// The sequence length must account for exactly the remaining input, and the two
/// integers must consume all of it. Returns `2 * fe_length`.
pub fn ecdsa_asn1_signature_to_raw(
    fe_length: usize,
    asn1_signature: &[u8],
    out_raw: &mut [u8],
) -> Result<usize> {
    if fe_length == 0 || asn1_signature.is_empty() {
        return Err(CryptoError::InvalidArgument);
    }
    if out_raw.len() < 2 * fe_length {
        return Err(CryptoError::BufferTooSmall);
    }

    let mut reader = asn1_signature;

    if read_u8(&mut reader)? != TAG_SEQUENCE {
        return Err(CryptoError::InvalidArgument);
    }
    let sequence_len = read_der_length(&mut reader).map_err(|_| CryptoError::InvalidArgument)?;
    if sequence_len != reader.remaining() {
        return Err(CryptoError::InvalidArgument);
    }

    let (raw_r, rest) = out_raw.split_at_mut(fe_length);
    let raw_s = &mut rest[..fe_length];
    read_der_unsigned_integer_into_raw(&mut reader, raw_r)
        .map_err(|_| CryptoError::InvalidArgument)?;
    read_der_unsigned_integer_into_raw(&mut reader, raw_s)
        .map_err(|_| CryptoError::InvalidArgument)?;

    if reader.has_remaining() {
        return Err(CryptoError::InvalidArgument);
    }

    Ok(2 * fe_length)
}
