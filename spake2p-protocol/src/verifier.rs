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

//! PIN-derived SPAKE2+ verifier `(w0, L)` and its persisted forms.
//!
//! `PBKDF2(pin as u32 LE, salt, iterations)` yields 80 bytes, split into
//! `w0s || w1s`. `w0 = w0s mod n`, `L = (w1s mod n) * G`. The prover keeps
//! the raw halves ([`Spake2pVerifier::compute_ws`]); the device keeps `(w0, L)`.

use core::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use heapless::{String, Vec};
use spake2p_common::{CryptoError, Result, P256_FE_LENGTH, P256_POINT_LENGTH};
use spake2p_crypto::Spake2pSuite;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Smallest accepted PBKDF2 salt
pub const SPAKE2P_MIN_PBKDF_SALT_LENGTH: usize = 16;
/// Largest accepted PBKDF2 salt
pub const SPAKE2P_MAX_PBKDF_SALT_LENGTH: usize = 32;
/// Smallest accepted PBKDF2 iteration count
pub const SPAKE2P_MIN_PBKDF_ITERATIONS: u32 = 1_000;
/// Largest accepted PBKDF2 iteration count
pub const SPAKE2P_MAX_PBKDF_ITERATIONS: u32 = 100_000;

/// Length of each PBKDF2 half; 8 extra bytes keep the reduction mod n unbiased
pub const SPAKE2P_WS_LENGTH: usize = P256_FE_LENGTH + 8;

/// Serialized verifier: `w0 || L`
pub const SPAKE2P_VERIFIER_SERIALIZED_LENGTH: usize = P256_FE_LENGTH + P256_POINT_LENGTH;

/// Base64 length of the serialized verifier
pub const SPAKE2P_VERIFIER_BASE64_LENGTH: usize = SPAKE2P_VERIFIER_SERIALIZED_LENGTH.div_ceil(3) * 4;

/// Decoding scratch: what a full base64 string of that length could hold
const BASE64_DECODE_SCRATCH_LENGTH: usize = SPAKE2P_VERIFIER_BASE64_LENGTH / 4 * 3;

/// Validated PBKDF2 parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbkdfParameters {
    iterations: u32,
    salt: Vec<u8, SPAKE2P_MAX_PBKDF_SALT_LENGTH>,
}

impl PbkdfParameters {
    /// Validate and store `(iterations, salt)`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the salt is not 16..=32 bytes or the iteration count is
    /// outside 1,000..=100,000.
    pub fn new(iterations: u32, salt: &[u8]) -> Result<Self> {
        if !(SPAKE2P_MIN_PBKDF_ITERATIONS..=SPAKE2P_MAX_PBKDF_ITERATIONS).contains(&iterations) {
            log::warn!("PBKDF2 iteration count {} out of range", iterations);
            return Err(CryptoError::InvalidArgument);
        }
        if !(SPAKE2P_MIN_PBKDF_SALT_LENGTH..=SPAKE2P_MAX_PBKDF_SALT_LENGTH).contains(&salt.len()) {
            log::warn!("PBKDF2 salt length {} out of range", salt.len());
            return Err(CryptoError::InvalidArgument);
        }
        let salt = Vec::from_slice(salt).map_err(|_| CryptoError::InvalidArgument)?;
        Ok(Self { iterations, salt })
    }

    /// Iteration count
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Salt bytes
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }
}

/// Raw PBKDF2 output `w0s || w1s`, zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Spake2pWs([u8; 2 * SPAKE2P_WS_LENGTH]);

impl Spake2pWs {
    /// `w0s`, the first half
    pub fn w0s(&self) -> &[u8] {
        &self.0[..SPAKE2P_WS_LENGTH]
    }

    /// `w1s`, the second half
    pub fn w1s(&self) -> &[u8] {
        &self.0[SPAKE2P_WS_LENGTH..]
    }
}

/// Verifier record `(w0, L)` held by the device side
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Spake2pVerifier {
    /// `w0`, big-endian, reduced mod the group order
    pub w0: [u8; P256_FE_LENGTH],
    /// `L = w1 * G`, uncompressed
    pub l: [u8; P256_POINT_LENGTH],
}

impl fmt::Debug for Spake2pVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spake2pVerifier").finish_non_exhaustive()
    }
}

fn check_p256_sizes<S: Spake2pSuite>() -> Result<()> {
    if S::FE_SIZE != P256_FE_LENGTH || S::POINT_SIZE != P256_POINT_LENGTH {
        return Err(CryptoError::InvalidArgument);
    }
    Ok(())
}

impl Spake2pVerifier {
    /// Run PBKDF2 over the little-endian PIN and return `w0s || w1s`.
    pub fn compute_ws<S: Spake2pSuite>(
        suite: &S,
        params: &PbkdfParameters,
        pin: u32,
    ) -> Result<Spake2pWs> {
        let mut ws = Spake2pWs([0u8; 2 * SPAKE2P_WS_LENGTH]);
        let password = Zeroizing::new(pin.to_le_bytes());
        suite.pbkdf2(&password[..], params.salt(), params.iterations(), &mut ws.0)?;
        Ok(ws)
    }

    /// Derive the verifier for `pin`. Deterministic for identical inputs.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for out-of-range PBKDF2 parameters or a non-P-256 suite.
    pub fn generate<S: Spake2pSuite>(suite: &S, iterations: u32, salt: &[u8], pin: u32) -> Result<Self> {
        let params = PbkdfParameters::new(iterations, salt)?;
        Self::generate_with(suite, &params, pin)
    }

    /// Same as [`Spake2pVerifier::generate`] with pre-validated parameters.
    pub fn generate_with<S: Spake2pSuite>(suite: &S, params: &PbkdfParameters, pin: u32) -> Result<Self> {
        check_p256_sizes::<S>()?;
        let ws = Self::compute_ws(suite, params, pin)?;

        let w0 = Zeroizing::new(suite.compute_w0(ws.w0s())?);
        let l = Zeroizing::new(suite.compute_l(ws.w1s())?);

        let mut verifier = Self {
            w0: [0u8; P256_FE_LENGTH],
            l: [0u8; P256_POINT_LENGTH],
        };
        suite.fe_write(&w0, &mut verifier.w0)?;
        suite.point_write(&l, &mut verifier.l)?;
        Ok(verifier)
    }

    /// Flat `w0 || L` encoding
    pub fn serialize(&self) -> Zeroizing<[u8; SPAKE2P_VERIFIER_SERIALIZED_LENGTH]> {
        let mut out = Zeroizing::new([0u8; SPAKE2P_VERIFIER_SERIALIZED_LENGTH]);
        out[..P256_FE_LENGTH].copy_from_slice(&self.w0);
        out[P256_FE_LENGTH..].copy_from_slice(&self.l);
        out
    }

    /// Parse the flat encoding.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `input` is exactly 97 bytes.
    pub fn deserialize(input: &[u8]) -> Result<Self> {
        if input.len() != SPAKE2P_VERIFIER_SERIALIZED_LENGTH {
            return Err(CryptoError::InvalidArgument);
        }
        let mut verifier = Self {
            w0: [0u8; P256_FE_LENGTH],
            l: [0u8; P256_POINT_LENGTH],
        };
        verifier.w0.copy_from_slice(&input[..P256_FE_LENGTH]);
        verifier.l.copy_from_slice(&input[P256_FE_LENGTH..]);
        Ok(verifier)
    }

    /// Standard base64 of the flat encoding
    pub fn to_base64(&self) -> Result<String<SPAKE2P_VERIFIER_BASE64_LENGTH>> {
        let mut encoded = [0u8; SPAKE2P_VERIFIER_BASE64_LENGTH];
        let len = STANDARD
            .encode_slice(&self.serialize()[..], &mut encoded)
            .map_err(|_| CryptoError::BufferTooSmall)?;
        let text = core::str::from_utf8(&encoded[..len]).map_err(|_| CryptoError::Internal)?;

        let mut out = String::new();
        out.push_str(text).map_err(|_| CryptoError::BufferTooSmall)?;
        Ok(out)
    }

    /// Parse the base64 form produced by [`Spake2pVerifier::to_base64`].
    pub fn from_base64(text: &str) -> Result<Self> {
        if text.len() != SPAKE2P_VERIFIER_BASE64_LENGTH {
            return Err(CryptoError::InvalidArgument);
        }
        let mut decoded = Zeroizing::new([0u8; BASE64_DECODE_SCRATCH_LENGTH]);
        let len = STANDARD
            .decode_slice(text, &mut decoded[..])
            .map_err(|_| CryptoError::InvalidArgument)?;
        Self::deserialize(&decoded[..len])
    }
}
