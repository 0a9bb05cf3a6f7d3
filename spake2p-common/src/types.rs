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

//! Sizes shared across the SPAKE2+ layers.

/// Length of a P-256 field element / scalar in bytes
pub const P256_FE_LENGTH: usize = 32;

/// Length of an uncompressed P-256 point (`0x04 || X || Y`)
pub const P256_POINT_LENGTH: usize = 2 * P256_FE_LENGTH + 1;

/// Length of a raw `r || s` P-256 ECDSA signature
pub const P256_ECDSA_SIGNATURE_LENGTH_RAW: usize = 2 * P256_FE_LENGTH;

/// Length of a SHA-256 digest
pub const SHA256_HASH_LENGTH: usize = 32;

/// Length of symmetric keys (session keys, group keys)
pub const SYMMETRIC_KEY_LENGTH: usize = 16;

/// Length of a compressed fabric identifier
pub const COMPRESSED_FABRIC_ID_LENGTH: usize = 8;

/// Minimum output buffer capacity for CSR generation
pub const MIN_CSR_BUFFER_SIZE: usize = 255;

/// Largest field element any supported suite uses (P-521 rounds up to 66)
pub const MAX_FE_LENGTH: usize = 66;

/// Largest uncompressed point any supported suite uses
pub const MAX_POINT_LENGTH: usize = 2 * MAX_FE_LENGTH + 1;

/// Largest digest any supported suite uses (SHA-512)
pub const MAX_HASH_LENGTH: usize = 64;
