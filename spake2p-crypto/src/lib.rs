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

//! SPAKE2+ - Cryptographic Suite Definitions
//!
//! This crate defines the traits for the cryptographic operations the SPAKE2+
//! engine needs. It contains NO implementations - only trait definitions.
//!
//! The actual implementations are provided by separate crates like:
//! - `spake2p-crypto-rustcrypto` (pure Rust using the RustCrypto ecosystem)
//!
//! ## Architecture
//!
//! The protocol engine is generic over [`Spake2pSuite`]:
//! - Field elements and points are opaque associated types owned by the engine
//! - The suite supplies the curve algebra, the transcript hash, the MAC and the KDFs
//! - Nothing in the engine assumes a particular curve or library
//!
//! A suite owns its RNG; [`Spake2pSuite::fe_generate`] is the only method taking
//! `&mut self`.

#![cfg_attr(not(test), no_std)]

use zeroize::{Zeroize, Zeroizing};

pub use spake2p_common::{CryptoError, Result};

/// HKDF-style key derivation
pub trait Kdf {
    /// Derive `out.len()` bytes from `ikm`, `salt` and `info`.
    ///
    /// An empty `salt` means "no salt" (a hash-length block of zeros per RFC 5869).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the requested output length is not supported.
    fn kdf(&self, ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<()>;
}

/// Password-based key derivation (PBKDF2)
pub trait PbKdf {
    /// Stretch `password` into `out.len()` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `iterations` is zero or the output is empty.
    fn pbkdf2(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<()>;
}

/// Curve, hash, MAC and KDF capabilities consumed by the SPAKE2+ engine
///
/// Implementations fix the element sizes at compile time through the associated
/// constants. All `*_write` methods fail with `BufferTooSmall` when `out` cannot
/// hold the encoding and return the number of bytes written otherwise.
pub trait Spake2pSuite: Kdf + PbKdf {
    /// Size of an encoded field element (scalar)
    const FE_SIZE: usize;
    /// Size of an uncompressed encoded point
    const POINT_SIZE: usize;
    /// Size of the transcript digest and of MAC tags
    const HASH_SIZE: usize;

    /// Scalar modulo the group order
    type FieldElement: Clone + Default + Zeroize;
    /// Curve point
    type Point: Clone + Default + Zeroize;
    /// Running transcript hash state; zeroizing it must erase everything absorbed
    type Hash: Clone + Default + Zeroize;

    /// Load a big-endian integer of up to `FE_SIZE + 16` bytes, reduced mod the group order.
    fn fe_load(&self, input: &[u8]) -> Result<Self::FieldElement>;

    /// Write `fe` as exactly `FE_SIZE` big-endian bytes.
    fn fe_write(&self, fe: &Self::FieldElement, out: &mut [u8]) -> Result<usize>;

    /// Generate a fresh uniformly random scalar.
    fn fe_generate(&mut self) -> Result<Self::FieldElement>;

    /// `a * b mod order`
    fn fe_mul(&self, a: &Self::FieldElement, b: &Self::FieldElement) -> Self::FieldElement;

    /// Decode an uncompressed point. Fails with `Internal` for anything not on the curve.
    fn point_load(&self, input: &[u8]) -> Result<Self::Point>;

    /// Write `point` in uncompressed form (`POINT_SIZE` bytes).
    fn point_write(&self, point: &Self::Point, out: &mut [u8]) -> Result<usize>;

    /// `fe * point`
    fn point_mul(&self, point: &Self::Point, fe: &Self::FieldElement) -> Self::Point;

    /// `fe1 * p1 + fe2 * p2`
    fn point_add_mul(
        &self,
        p1: &Self::Point,
        fe1: &Self::FieldElement,
        p2: &Self::Point,
        fe2: &Self::FieldElement,
    ) -> Self::Point;

    /// `-point`
    fn point_invert(&self, point: &Self::Point) -> Self::Point;

    /// Multiply by the curve cofactor. Curves with cofactor 1 return the point unchanged.
    fn point_cofactor_mul(&self, point: &Self::Point) -> Self::Point;

    /// Whether `point` is a usable protocol element (on the curve, not the identity).
    fn point_is_valid(&self, point: &Self::Point) -> bool;

    /// Curve generator `G`
    fn generator(&self) -> Self::Point;

    /// SPAKE2+ constant `M`. Fails with `Internal` if the suite cannot materialize it.
    fn m_point(&self) -> Result<Self::Point>;

    /// SPAKE2+ constant `N`
    fn n_point(&self) -> Result<Self::Point>;

    /// Absorb `data` into the transcript.
    fn hash(&self, hash: &mut Self::Hash, data: &[u8]) -> Result<()>;

    /// Finalize the transcript into `out` (at least `HASH_SIZE` bytes) and zeroize `hash`.
    fn hash_finalize(&self, hash: &mut Self::Hash, out: &mut [u8]) -> Result<()>;

    /// MAC `data` under `key` into `out`, returning the tag length.
    fn mac(&self, key: &[u8], data: &[u8], out: &mut [u8]) -> Result<usize>;

    /// Constant-time check of `mac` against the MAC of `data` under `key`.
    fn mac_verify(&self, key: &[u8], data: &[u8], mac: &[u8]) -> bool;

    /// Derive `w0` from its PBKDF2 half.
    fn compute_w0(&self, w0s: &[u8]) -> Result<Self::FieldElement> {
        self.fe_load(w0s)
    }

    /// Derive the verifier point `L = w1 * G` from the PBKDF2 half of `w1`.
    fn compute_l(&self, w1s: &[u8]) -> Result<Self::Point> {
        let w1 = Zeroizing::new(self.fe_load(w1s)?);
        Ok(self.point_mul(&self.generator(), &w1))
    }
}

#[cfg(test)]
mod tests {
    //! Toy suite over the additive group of integers mod a small prime.
    //!
    //! "Points" are multiples of a generator, so scalar math can be checked by hand.

    use super::*;

    const ORDER: u64 = 1_000_003;

    #[derive(Clone, Default, Zeroize)]
    struct ToyHash(u64);

    #[derive(Default)]
    struct ToySuite {
        counter: u64,
    }

    impl Kdf for ToySuite {
        fn kdf(&self, ikm: &[u8], salt: &[u8], info: &[u8], out: &mut [u8]) -> Result<()> {
            let seed = ikm.iter().chain(salt).chain(info).fold(0u8, |a, b| a ^ b);
            out.fill(seed);
            Ok(())
        }
    }

    impl PbKdf for ToySuite {
        fn pbkdf2(&self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) -> Result<()> {
            if iterations == 0 {
                return Err(CryptoError::InvalidArgument);
            }
            self.kdf(password, salt, &[], out)
        }
    }

    impl Spake2pSuite for ToySuite {
        const FE_SIZE: usize = 8;
        const POINT_SIZE: usize = 8;
        const HASH_SIZE: usize = 8;

        type FieldElement = u64;
        type Point = u64;
        type Hash = ToyHash;

        fn fe_load(&self, input: &[u8]) -> Result<u64> {
            if input.is_empty() || input.len() > Self::FE_SIZE + 16 {
                return Err(CryptoError::InvalidArgument);
            }
            Ok(input
                .iter()
                .fold(0u64, |acc, &b| (acc * 256 + u64::from(b)) % ORDER))
        }

        fn fe_write(&self, fe: &u64, out: &mut [u8]) -> Result<usize> {
            let out = out.get_mut(..8).ok_or(CryptoError::BufferTooSmall)?;
            out.copy_from_slice(&fe.to_be_bytes());
            Ok(8)
        }

        fn fe_generate(&mut self) -> Result<u64> {
            self.counter += 1;
            Ok(self.counter % ORDER)
        }

        fn fe_mul(&self, a: &u64, b: &u64) -> u64 {
            a * b % ORDER
        }

        fn point_load(&self, input: &[u8]) -> Result<u64> {
            let bytes: [u8; 8] = input.try_into().map_err(|_| CryptoError::Internal)?;
            let point = u64::from_be_bytes(bytes);
            if point >= ORDER {
                return Err(CryptoError::Internal);
            }
            Ok(point)
        }

        fn point_write(&self, point: &u64, out: &mut [u8]) -> Result<usize> {
            self.fe_write(point, out)
        }

        fn point_mul(&self, point: &u64, fe: &u64) -> u64 {
            point * fe % ORDER
        }

        fn point_add_mul(&self, p1: &u64, fe1: &u64, p2: &u64, fe2: &u64) -> u64 {
            (self.point_mul(p1, fe1) + self.point_mul(p2, fe2)) % ORDER
        }

        fn point_invert(&self, point: &u64) -> u64 {
            (ORDER - point) % ORDER
        }

        fn point_cofactor_mul(&self, point: &u64) -> u64 {
            *point
        }

        fn point_is_valid(&self, point: &u64) -> bool {
            *point != 0 && *point < ORDER
        }

        fn generator(&self) -> u64 {
            7
        }

        fn m_point(&self) -> Result<u64> {
            Ok(11)
        }

        fn n_point(&self) -> Result<u64> {
            Ok(13)
        }

        fn hash(&self, hash: &mut ToyHash, data: &[u8]) -> Result<()> {
            for &b in data {
                hash.0 = hash.0.wrapping_mul(31).wrapping_add(u64::from(b));
            }
            Ok(())
        }

        fn hash_finalize(&self, hash: &mut ToyHash, out: &mut [u8]) -> Result<()> {
            let out = out.get_mut(..8).ok_or(CryptoError::BufferTooSmall)?;
            out.copy_from_slice(&hash.0.to_be_bytes());
            hash.zeroize();
            Ok(())
        }

        fn mac(&self, key: &[u8], data: &[u8], out: &mut [u8]) -> Result<usize> {
            let mut state = ToyHash::default();
            self.hash(&mut state, key)?;
            self.hash(&mut state, data)?;
            self.hash_finalize(&mut state, out)?;
            Ok(8)
        }

        fn mac_verify(&self, key: &[u8], data: &[u8], mac: &[u8]) -> bool {
            let mut expected = [0u8; 8];
            self.mac(key, data, &mut expected).is_ok() && expected[..] == *mac
        }
    }

    #[test]
    fn test_compute_w0_reduces() {
        let suite = ToySuite::default();
        // 1_000_004 = ORDER + 1
        let w0 = suite.compute_w0(&1_000_004u64.to_be_bytes()).unwrap();
        assert_eq!(w0, 1);
    }

    #[test]
    fn test_compute_l_is_generator_multiple() {
        let suite = ToySuite::default();
        let l = suite.compute_l(&[0x00, 0x05]).unwrap();
        assert_eq!(l, 35);
    }

    #[test]
    fn test_compute_l_rejects_empty_input() {
        let suite = ToySuite::default();
        assert_eq!(suite.compute_l(&[]), Err(CryptoError::InvalidArgument));
    }

    #[test]
    fn test_hash_finalize_resets() {
        let suite = ToySuite::default();
        let mut hash = ToyHash::default();
        suite.hash(&mut hash, b"transcript").unwrap();

        let mut first = [0u8; 8];
        suite.hash_finalize(&mut hash, &mut first).unwrap();
        assert_ne!(first, [0u8; 8]);
        assert_eq!(hash.0, 0);
    }

    #[test]
    fn test_mac_verify_detects_tampering() {
        let suite = ToySuite::default();
        let mut tag = [0u8; 8];
        suite.mac(b"key", b"data", &mut tag).unwrap();
        assert!(suite.mac_verify(b"key", b"data", &tag));

        tag[0] ^= 1;
        assert!(!suite.mac_verify(b"key", b"data", &tag));
    }
}
