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

//! Group key derivation
//!
//! ```text
//! encryption_key = KDF(epoch_key, compressed_fabric_id, "GroupKey v1.0", 16)
//! session_id     = BE u16 of KDF(encryption_key, "", "GroupKeyHash", 2)
//! privacy_key    = KDF(encryption_key, "", "PrivacyKey", 16)
//! ```

use spake2p_common::{Result, COMPRESSED_FABRIC_ID_LENGTH, SYMMETRIC_KEY_LENGTH};
use spake2p_crypto::Kdf;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Info string for the operational (encryption) key
pub const GROUP_KEY_INFO: &[u8] = b"GroupKey v1.0";
/// Info string for the group session id
pub const GROUP_KEY_HASH_INFO: &[u8] = b"GroupKeyHash";
/// Info string for the privacy key
pub const GROUP_PRIVACY_INFO: &[u8] = b"PrivacyKey";

/// Epoch key with its activation time
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EpochKey {
    /// Activation time, opaque to this module
    pub start_time: u64,
    /// Raw epoch key
    pub key: [u8; SYMMETRIC_KEY_LENGTH],
}

/// Operational credentials derived from one epoch key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct GroupOperationalCredentials {
    /// Copied from the epoch key
    pub start_time: u64,
    /// Group session id
    pub hash: u16,
    /// Operational encryption key
    pub encryption_key: [u8; SYMMETRIC_KEY_LENGTH],
    /// Privacy key
    pub privacy_key: [u8; SYMMETRIC_KEY_LENGTH],
}

impl core::fmt::Debug for GroupOperationalCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GroupOperationalCredentials")
            .field("start_time", &self.start_time)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// Derive the operational key for `epoch_key` within a fabric.
pub fn derive_group_operational_key<K: Kdf>(
    kdf: &K,
    epoch_key: &[u8; SYMMETRIC_KEY_LENGTH],
    compressed_fabric_id: &[u8; COMPRESSED_FABRIC_ID_LENGTH],
) -> Result<Zeroizing<[u8; SYMMETRIC_KEY_LENGTH]>> {
    let mut out = Zeroizing::new([0u8; SYMMETRIC_KEY_LENGTH]);
    kdf.kdf(epoch_key, compressed_fabric_id, GROUP_KEY_INFO, &mut out[..])?;
    Ok(out)
}

/// Derive the 16-bit group session id from an operational key.
pub fn derive_group_session_id<K: Kdf>(
    kdf: &K,
    operational_key: &[u8; SYMMETRIC_KEY_LENGTH],
) -> Result<u16> {
    let mut out = [0u8; 2];
    kdf.kdf(operational_key, &[], GROUP_KEY_HASH_INFO, &mut out)?;
    Ok(u16::from_be_bytes(out))
}

/// Derive the privacy key from an operational key.
pub fn derive_group_privacy_key<K: Kdf>(
    kdf: &K,
    operational_key: &[u8; SYMMETRIC_KEY_LENGTH],
) -> Result<Zeroizing<[u8; SYMMETRIC_KEY_LENGTH]>> {
    let mut out = Zeroizing::new([0u8; SYMMETRIC_KEY_LENGTH]);
    kdf.kdf(operational_key, &[], GROUP_PRIVACY_INFO, &mut out[..])?;
    Ok(out)
}

/// Derive the full credential set for `epoch_key`.
pub fn derive_group_operational_credentials<K: Kdf>(
    kdf: &K,
    epoch_key: &EpochKey,
    compressed_fabric_id: &[u8; COMPRESSED_FABRIC_ID_LENGTH],
) -> Result<GroupOperationalCredentials> {
    let encryption_key = derive_group_operational_key(kdf, &epoch_key.key, compressed_fabric_id)?;
    let hash = derive_group_session_id(kdf, &encryption_key)?;
    let privacy_key = derive_group_privacy_key(kdf, &encryption_key)?;

    log::debug!("derived group credentials: session_id={:#06x}", hash);
    Ok(GroupOperationalCredentials {
        start_time: epoch_key.start_time,
        hash,
        encryption_key: *encryption_key,
        privacy_key: *privacy_key,
    })
}
