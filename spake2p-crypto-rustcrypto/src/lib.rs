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

//! SPAKE2+ Cryptography - RustCrypto Implementation
//!
//! This crate provides the `P256Sha256HkdfHmac` suite, an implementation of
//! [`Spake2pSuite`] using the RustCrypto ecosystem:
//! - `p256` for the curve arithmetic
//! - `crypto-bigint` for the wide reduction of PBKDF2 output mod the group order
//! - `sha2` for SHA-256 over the buffered transcript
//! - `hmac` for HMAC-SHA256 key confirmation
//! - `hkdf` and `pbkdf2` for key derivation
//!
//! It also carries the P-256 ECDSA key pair used for operational certificates,
//! including PKCS#10 CSR generation and verification (see [`keypair`]).
//!
//! ## Usage
//!
//! ```
//! use spake2p_crypto_rustcrypto::P256Sha256HkdfHmac;
//!
//! let suite = P256Sha256HkdfHmac::default();
//! // Hand to spake2p_protocol::Spake2p::new
//! ```

pub mod keypair;

pub use keypair::{verify_certificate_signing_request, verify_raw_signature, P256Keypair};

use crypto_bigint::{Encoding, NonZero, U384};
use hex_literal::hex;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use p256::elliptic_curve::ff::PrimeField;
use p256::elliptic_curve::group::Group;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use rand_core::{CryptoRngCore, OsRng, RngCore};
use sha2::{Digest, Sha256};
use spake2p_common::{CryptoError, Result, P256_FE_LENGTH, P256_POINT_LENGTH, SHA256_HASH_LENGTH};
use spake2p_crypto::{Kdf, PbKdf, Spake2pSuite};
use subtle::ConstantTimeEq;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha256 = Hmac<Sha256>;

/// SPAKE2+ `M` for P-256 (compressed SEC1)
pub const SPAKE2P_M_P256: [u8; 33] =
    hex!("02886e2f97ace46e55ba9dd7242579f2993b64e16ef3dcab95afd497333d8fa12f");

/// SPAKE2+ `N` for P-256 (compressed SEC1)
pub const SPAKE2P_N_P256: [u8; 33] =
    hex!("03d8bbd6c639c62937b04d997f38c3770719c629d7014d49a24b4f98baa1292b49");

/// Widest scalar input accepted by `fe_load` (FE + 16 bytes)
const WIDE_FE_LENGTH: usize = 48;

/// P-256 group order, widened to 384 bits for reduction
const P256_ORDER: U384 = U384::from_be_hex(concat!(
    "00000000000000000000000000000000",
    "ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"
));

/// P-256 + SHA-256 + HKDF-SHA256 + HMAC-SHA256 suite
///
/// Owns the RNG used for the ephemeral round-one scalar.
pub struct P256Sha256HkdfHmac<R = OsRng> {
    rng: R,
}

impl<R: CryptoRngCore> P256Sha256HkdfHmac<R> {
    /// Create a suite drawing randomness from `rng`
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl Default for P256Sha256HkdfHmac<OsRng> {
    fn default() -> Self {
        Self::new(OsRng)
    }
}

/// Initial transcript capacity; a commissioning transcript fits without growing
const TRANSCRIPT_INITIAL_CAPACITY: usize = 512;

/// SPAKE2+ transcript, buffered and hashed in one pass by `hash_finalize`
///
/// Growth copies into a fresh allocation and zeroizes the old one, so no
/// absorbed byte is left behind in freed memory.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct TranscriptBuffer(Vec<u8>);

impl TranscriptBuffer {
    fn absorb(&mut self, data: &[u8]) {
        let needed = self.0.len() + data.len();
        if needed > self.0.capacity() {
            let capacity = needed
                .max(2 * self.0.capacity())
                .max(TRANSCRIPT_INITIAL_CAPACITY);
            let mut grown = Vec::with_capacity(capacity);
            grown.extend_from_slice(&self.0);
            self.0.zeroize();
            self.0 = grown;
        }
        self.0.extend_from_slice(data);
    }

    /// Number of bytes absorbed since the last reset
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been absorbed since the last reset
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn decode_constant(compressed: &[u8]) -> Result<ProjectivePoint> {
    let encoded = EncodedPoint::from_bytes(compressed).map_err(|_| CryptoError::Internal)?;
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .map(ProjectivePoint::from)
        .ok_or(CryptoError::Internal)
}

impl<R> Kdf for P256Sha256HkdfHmac<R> {
    fn kdf(&self, ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<()> {
        trace!(
            "HKDF-SHA256: ikm_len={}, salt_len={}, info_len={}, out_len={}",
            ikm.len(),
            salt.len(),
            info.len(),
            out.len()
        );
        let salt = if salt.is_empty() { None } else { Some(salt) };
        Hkdf::<Sha256>::new(salt, ikm)
            .expand(info, out)
            .map_err(|_| CryptoError::InvalidArgument)
    }
}

impl<R> PbKdf for P256Sha256HkdfHmac<R> {
    fn pbkdf2(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<()> {
        if iterations == 0 || out.is_empty() {
            return Err(CryptoError::InvalidArgument);
        }
        trace!(
            "PBKDF2-HMAC-SHA256: salt_len={}, iterations={}, out_len={}",
            salt.len(),
            iterations,
            out.len()
        );
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out);
        Ok(())
    }
}

impl<R: CryptoRngCore> Spake2pSuite for P256Sha256HkdfHmac<R> {
    const FE_SIZE: usize = P256_FE_LENGTH;
    const POINT_SIZE: usize = P256_POINT_LENGTH;
    const HASH_SIZE: usize = SHA256_HASH_LENGTH;

    type FieldElement = Scalar;
    type Point = ProjectivePoint;
    type Hash = TranscriptBuffer;

    fn fe_load(&self, input: &[u8]) -> Result<Scalar> {
        if input.is_empty() || input.len() > WIDE_FE_LENGTH {
            return Err(CryptoError::InvalidArgument);
        }

        let mut padded = Zeroizing::new([0u8; WIDE_FE_LENGTH]);
        padded[WIDE_FE_LENGTH - input.len()..].copy_from_slice(input);

        let order = Option::<NonZero<U384>>::from(NonZero::new(P256_ORDER))
            .ok_or(CryptoError::Internal)?;
        let wide = Zeroizing::new(U384::from_be_slice(&padded[..]));
        let reduced = Zeroizing::new(wide.rem(&order).to_be_bytes());

        let mut repr = FieldBytes::default();
        repr.copy_from_slice(&reduced[WIDE_FE_LENGTH - P256_FE_LENGTH..]);
        Option::<Scalar>::from(Scalar::from_repr(repr)).ok_or(CryptoError::Internal)
    }

    fn fe_write(&self, fe: &Scalar, out: &mut [u8]) -> Result<usize> {
        let out = out
            .get_mut(..P256_FE_LENGTH)
            .ok_or(CryptoError::BufferTooSmall)?;
        out.copy_from_slice(&fe.to_bytes());
        Ok(P256_FE_LENGTH)
    }

    fn fe_generate(&mut self) -> Result<Scalar> {
        // Rejection sampling: draw 32 bytes until they are below the order
        let mut bytes = Zeroizing::new([0u8; P256_FE_LENGTH]);
        loop {
            self.rng
                .try_fill_bytes(&mut bytes[..])
                .map_err(|_| CryptoError::Internal)?;
            let repr = FieldBytes::from(*bytes);
            if let Some(scalar) = Option::<Scalar>::from(Scalar::from_repr(repr)) {
                return Ok(scalar);
            }
        }
    }

    fn fe_mul(&self, a: &Scalar, b: &Scalar) -> Scalar {
        *a * b
    }

    fn point_load(&self, input: &[u8]) -> Result<ProjectivePoint> {
        if input.len() != P256_POINT_LENGTH {
            trace!("Rejecting point: len={}", input.len());
            return Err(CryptoError::Internal);
        }
        let encoded = EncodedPoint::from_bytes(input).map_err(|_| {
            trace!("Rejecting point: bad SEC1 tag 0x{:02x}", input[0]);
            CryptoError::Internal
        })?;
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| {
                trace!("Rejecting point: not on curve");
                CryptoError::Internal
            })?;
        Ok(affine.into())
    }

    fn point_write(&self, point: &ProjectivePoint, out: &mut [u8]) -> Result<usize> {
        let out = out
            .get_mut(..P256_POINT_LENGTH)
            .ok_or(CryptoError::BufferTooSmall)?;
        let encoded = point.to_affine().to_encoded_point(false);
        // The identity has a one-byte encoding and is never a protocol value
        if encoded.len() != P256_POINT_LENGTH {
            return Err(CryptoError::Internal);
        }
        out.copy_from_slice(encoded.as_bytes());
        Ok(P256_POINT_LENGTH)
    }

    fn point_mul(&self, point: &ProjectivePoint, fe: &Scalar) -> ProjectivePoint {
        *point * fe
    }

    fn point_add_mul(
        &self,
        p1: &ProjectivePoint,
        fe1: &Scalar,
        p2: &ProjectivePoint,
        fe2: &Scalar,
    ) -> ProjectivePoint {
        (*p1 * fe1) + (*p2 * fe2)
    }

    fn point_invert(&self, point: &ProjectivePoint) -> ProjectivePoint {
        -*point
    }

    fn point_cofactor_mul(&self, point: &ProjectivePoint) -> ProjectivePoint {
        // P-256 has cofactor 1
        *point
    }

    fn point_is_valid(&self, point: &ProjectivePoint) -> bool {
        !bool::from(point.is_identity())
    }

    fn generator(&self) -> ProjectivePoint {
        ProjectivePoint::generator()
    }

    fn m_point(&self) -> Result<ProjectivePoint> {
        decode_constant(&SPAKE2P_M_P256)
    }

    fn n_point(&self) -> Result<ProjectivePoint> {
        decode_constant(&SPAKE2P_N_P256)
    }

    fn hash(&self, hash: &mut TranscriptBuffer, data: &[u8]) -> Result<()> {
        hash.absorb(data);
        Ok(())
    }

    fn hash_finalize(&self, hash: &mut TranscriptBuffer, out: &mut [u8]) -> Result<()> {
        let out = out
            .get_mut(..SHA256_HASH_LENGTH)
            .ok_or(CryptoError::BufferTooSmall)?;
        out.copy_from_slice(&Sha256::digest(&hash.0));
        hash.zeroize();
        Ok(())
    }

    fn mac(&self, key: &[u8], data: &[u8], out: &mut [u8]) -> Result<usize> {
        let out = out
            .get_mut(..SHA256_HASH_LENGTH)
            .ok_or(CryptoError::BufferTooSmall)?;
        let mut mac =
            <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CryptoError::InvalidArgument)?;
        mac.update(data);
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(SHA256_HASH_LENGTH)
    }

    fn mac_verify(&self, key: &[u8], data: &[u8], mac: &[u8]) -> bool {
        let mut expected = Zeroizing::new([0u8; SHA256_HASH_LENGTH]);
        if self.mac(key, data, &mut expected[..]).is_err() {
            return false;
        }
        expected[..].ct_eq(mac).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_valid_points() {
        let suite = P256Sha256HkdfHmac::default();
        let m = suite.m_point().unwrap();
        let n = suite.n_point().unwrap();
        assert!(suite.point_is_valid(&m));
        assert!(suite.point_is_valid(&n));
        assert_ne!(m, n);
    }

    #[test]
    fn test_fe_load_reduces_order_to_zero() {
        let suite = P256Sha256HkdfHmac::default();
        let order = hex!("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551");
        assert_eq!(suite.fe_load(&order).unwrap(), Scalar::ZERO);

        let mut order_plus_one = order;
        order_plus_one[31] += 1;
        assert_eq!(suite.fe_load(&order_plus_one).unwrap(), Scalar::ONE);
    }

    #[test]
    fn test_fe_load_wide_input() {
        let suite = P256Sha256HkdfHmac::default();
        // 40 bytes: the value 1 with 39 bytes of leading zeros
        let mut wide = [0u8; 40];
        wide[39] = 1;
        assert_eq!(suite.fe_load(&wide).unwrap(), Scalar::ONE);

        assert_eq!(suite.fe_load(&[]), Err(CryptoError::InvalidArgument));
        assert_eq!(suite.fe_load(&[1u8; 49]), Err(CryptoError::InvalidArgument));
    }

    #[test]
    fn test_fe_write_roundtrip() {
        let mut suite = P256Sha256HkdfHmac::default();
        let fe = suite.fe_generate().unwrap();
        let mut out = [0u8; 32];
        assert_eq!(suite.fe_write(&fe, &mut out), Ok(32));
        assert_eq!(suite.fe_load(&out).unwrap(), fe);

        let mut short = [0u8; 31];
        assert_eq!(suite.fe_write(&fe, &mut short), Err(CryptoError::BufferTooSmall));
    }

    #[test]
    fn test_point_load_rejects_garbage() {
        let suite = P256Sha256HkdfHmac::default();
        assert_eq!(suite.point_load(&[0u8; 65]), Err(CryptoError::Internal));
        assert_eq!(suite.point_load(&[0u8; 64]), Err(CryptoError::Internal));

        // Generator with a corrupted Y coordinate
        let mut encoded = [0u8; 65];
        suite.point_write(&suite.generator(), &mut encoded).unwrap();
        encoded[64] ^= 1;
        assert_eq!(suite.point_load(&encoded), Err(CryptoError::Internal));
    }

    #[test]
    fn test_point_write_rejects_identity() {
        let suite = P256Sha256HkdfHmac::default();
        let mut out = [0u8; 65];
        assert_eq!(
            suite.point_write(&ProjectivePoint::identity(), &mut out),
            Err(CryptoError::Internal)
        );
        assert!(!suite.point_is_valid(&ProjectivePoint::identity()));
    }

    #[test]
    fn test_point_add_mul_matches_separate_ops() {
        let mut suite = P256Sha256HkdfHmac::default();
        let a = suite.fe_generate().unwrap();
        let b = suite.fe_generate().unwrap();
        let g = suite.generator();
        let m = suite.m_point().unwrap();

        let combined = suite.point_add_mul(&g, &a, &m, &b);
        let separate = suite.point_mul(&g, &a) + suite.point_mul(&m, &b);
        assert_eq!(combined, separate);

        // P + (-P) is the identity
        let p = suite.point_mul(&g, &a);
        assert!(!suite.point_is_valid(&(p + suite.point_invert(&p))));
    }

    #[test]
    fn test_compute_l_matches_generator_mul() {
        let suite = P256Sha256HkdfHmac::default();
        let w1s = [0x42u8; 40];
        let w1 = suite.fe_load(&w1s).unwrap();
        assert_eq!(
            suite.compute_l(&w1s).unwrap(),
            ProjectivePoint::generator() * w1
        );
    }

    #[test]
    fn test_hash_finalize_resets_state() {
        let suite = P256Sha256HkdfHmac::default();
        let mut hash = TranscriptBuffer::default();
        suite.hash(&mut hash, b"con").unwrap();
        suite.hash(&mut hash, b"text").unwrap();
        assert_eq!(hash.len(), 7);

        let mut first = [0u8; 32];
        suite.hash_finalize(&mut hash, &mut first).unwrap();
        assert_eq!(first[..], Sha256::digest(b"context")[..]);
        assert!(hash.is_empty());

        let mut second = [0u8; 32];
        suite.hash_finalize(&mut hash, &mut second).unwrap();
        assert_eq!(second[..], Sha256::digest(b"")[..]);
    }

    #[test]
    fn test_transcript_growth_keeps_contents() {
        let suite = P256Sha256HkdfHmac::default();
        let mut hash = TranscriptBuffer::default();
        let chunk = [0xa5u8; 300];
        let mut expected = Sha256::new();
        for _ in 0..5 {
            suite.hash(&mut hash, &chunk).unwrap();
            expected.update(chunk);
        }
        assert_eq!(hash.len(), 1_500);

        let mut out = [0u8; 32];
        suite.hash_finalize(&mut hash, &mut out).unwrap();
        assert_eq!(out[..], expected.finalize()[..]);
    }

    #[test]
    fn test_fe_generate_rejects_out_of_range_draws() {
        // First draw is all-ones (above the order), second is 1
        let mut stream = vec![0xffu8; 32];
        stream.extend_from_slice(&[0u8; 31]);
        stream.push(1);
        let mut suite = P256Sha256HkdfHmac::new(FixedBytes(stream, 0));
        assert_eq!(suite.fe_generate().unwrap(), Scalar::ONE);
    }

    struct FixedBytes(Vec<u8>, usize);

    impl RngCore for FixedBytes {
        fn next_u32(&mut self) -> u32 {
            rand_core::impls::next_u32_via_fill(self)
        }

        fn next_u64(&mut self) -> u64 {
            rand_core::impls::next_u64_via_fill(self)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let end = self.1 + dest.len();
            dest.copy_from_slice(&self.0[self.1..end]);
            self.1 = end;
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl rand_core::CryptoRng for FixedBytes {}

    #[test]
    fn test_mac_verify() {
        let suite = P256Sha256HkdfHmac::default();
        let mut tag = [0u8; 32];
        assert_eq!(suite.mac(b"secret_key", b"message", &mut tag), Ok(32));
        assert!(suite.mac_verify(b"secret_key", b"message", &tag));
        assert!(!suite.mac_verify(b"secret_key", b"massage", &tag));
        assert!(!suite.mac_verify(b"secret_key", b"message", &tag[..31]));
    }

    #[test]
    fn test_hkdf_empty_salt_equals_no_salt() {
        let suite = P256Sha256HkdfHmac::default();
        let mut ours = [0u8; 32];
        suite.kdf(b"ikm", &[], b"ConfirmationKeys", &mut ours).unwrap();

        let mut direct = [0u8; 32];
        Hkdf::<Sha256>::new(None, b"ikm")
            .expand(b"ConfirmationKeys", &mut direct)
            .unwrap();
        assert_eq!(ours, direct);

        // HKDF-SHA256 cannot expand beyond 255 blocks
        let mut too_long = [0u8; 255 * 32 + 1];
        assert_eq!(
            suite.kdf(b"ikm", &[], b"", &mut too_long),
            Err(CryptoError::InvalidArgument)
        );
    }

    #[test]
    fn test_pbkdf2_rejects_zero_iterations() {
        let suite = P256Sha256HkdfHmac::default();
        let mut out = [0u8; 80];
        assert_eq!(
            suite.pbkdf2(b"pin", b"SPAKE2P Key Salt", 0, &mut out),
            Err(CryptoError::InvalidArgument)
        );
        assert!(suite.pbkdf2(b"pin", b"SPAKE2P Key Salt", 1000, &mut out).is_ok());
        assert_ne!(out, [0u8; 80]);
    }
}
