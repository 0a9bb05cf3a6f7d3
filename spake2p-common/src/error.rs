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

//! Error types shared across the SPAKE2+ layers.

/// Error kinds for cryptographic and codec operations
///
/// Protocol-order violations, backend failures, invalid curve points and key
/// confirmation mismatches all surface as `Internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Malformed or out-of-range input
    #[error("invalid argument")]
    InvalidArgument,
    /// Output buffer too small; retry with a larger buffer
    #[error("buffer too small")]
    BufferTooSmall,
    /// State machine misuse, backend failure or failed security check
    #[error("internal error")]
    Internal,
    /// Certificate or CSR is not in a supported format
    #[error("unsupported certificate format")]
    UnsupportedCertFormat,
    /// Certificate distinguished name does not match expectations
    #[error("wrong certificate distinguished name")]
    WrongCertDn,
    /// ECDSA signature did not verify
    #[error("invalid signature")]
    InvalidSignature,
}

/// Result alias used throughout the workspace.
pub type Result<T> = core::result::Result<T, CryptoError>;
