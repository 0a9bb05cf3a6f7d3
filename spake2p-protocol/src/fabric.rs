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

//! Compressed fabric identifier

use spake2p_common::{CryptoError, Result, COMPRESSED_FABRIC_ID_LENGTH, P256_POINT_LENGTH};
use spake2p_crypto::Kdf;

/// KDF info string for the compressed fabric id
pub const COMPRESSED_FABRIC_INFO: &[u8] = b"CompressedFabric";

const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// `KDF(ikm = X || Y of the root key, salt = BE fabric id, "CompressedFabric", 8)`
///
/// # Errors
///
/// `InvalidArgument` unless `root_public_key` is a 65-byte uncompressed P-256 point.
pub fn generate_compressed_fabric_id<K: Kdf>(
    kdf: &K,
    root_public_key: &[u8],
    fabric_id: u64,
) -> Result<[u8; COMPRESSED_FABRIC_ID_LENGTH]> {
    let coordinates = match root_public_key {
        [UNCOMPRESSED_POINT_TAG, rest @ ..] if root_public_key.len() == P256_POINT_LENGTH => rest,
        _ => return Err(CryptoError::InvalidArgument),
    };

    let mut out = [0u8; COMPRESSED_FABRIC_ID_LENGTH];
    kdf.kdf(
        coordinates,
        &fabric_id.to_be_bytes(),
        COMPRESSED_FABRIC_INFO,
        &mut out,
    )?;
    Ok(out)
}
