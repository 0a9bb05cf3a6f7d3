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

//! SPAKE2+ engine
//!
//! A synchronous, single-session state machine over any [`Spake2pSuite`].
//!
//! ## Transcript
//!
//! Every transcript element is absorbed as its 8-byte little-endian length
//! followed by its bytes, in this order:
//!
//! ```text
//! context
//! prover id, verifier id
//! M, N                      (uncompressed encodings)
//! X (prover share), Y (verifier share)
//! Z, V, w0
//! ```
//!
//! The digest is `Ka || Ke`. `Kca || Kcb = KDF(Ka, "", "ConfirmationKeys")`.
//! The prover MACs `Y` under `Kca`, the verifier MACs `X` under `Kcb`, and
//! `Ke` is the session key handed to the caller.
//!
//! ## Failure semantics
//!
//! A failed call leaves the state untouched, so a corrected retry is valid.
//! Out-of-order calls fail with `Internal`.

use heapless::Vec;
use spake2p_common::{CryptoError, Result, MAX_FE_LENGTH, MAX_HASH_LENGTH, MAX_POINT_LENGTH};
use spake2p_crypto::Spake2pSuite;
use zeroize::{Zeroize, Zeroizing};

use crate::state::{Spake2pRole, Spake2pState};

/// KDF info string for the confirmation keys
pub const SPAKE2P_CONFIRMATION_KEYS_INFO: &[u8] = b"ConfirmationKeys";

/// SPAKE2+ protocol engine
///
/// Owns its suite and all secret intermediate values; they are zeroed by
/// [`Spake2p::clear`] and on drop.
pub struct Spake2p<S: Spake2pSuite> {
    suite: S,
    state: Spake2pState,
    role: Option<Spake2pRole>,
    m: S::Point,
    n: S::Point,
    w0: S::FieldElement,
    w1: S::FieldElement,
    xy: S::FieldElement,
    l: S::Point,
    own_share: Vec<u8, MAX_POINT_LENGTH>,
    transcript: S::Hash,
    kae: [u8; MAX_HASH_LENGTH],
    kcab: [u8; MAX_HASH_LENGTH],
}

/// Absorb `data` with its 8-byte little-endian length prefix.
fn hash_framed<S: Spake2pSuite>(suite: &S, transcript: &mut S::Hash, data: &[u8]) -> Result<()> {
    let len = u64::try_from(data.len()).map_err(|_| CryptoError::InvalidArgument)?;
    suite.hash(transcript, &len.to_le_bytes())?;
    suite.hash(transcript, data)
}

fn hash_point<S: Spake2pSuite>(suite: &S, transcript: &mut S::Hash, point: &S::Point) -> Result<()> {
    let mut encoded = Zeroizing::new([0u8; MAX_POINT_LENGTH]);
    let len = suite.point_write(point, &mut encoded[..])?;
    hash_framed(suite, transcript, &encoded[..len])
}

impl<S: Spake2pSuite> Spake2p<S> {
    /// Create an engine in the `PreInit` state
    pub fn new(suite: S) -> Self {
        Self {
            suite,
            state: Spake2pState::PreInit,
            role: None,
            m: S::Point::default(),
            n: S::Point::default(),
            w0: S::FieldElement::default(),
            w1: S::FieldElement::default(),
            xy: S::FieldElement::default(),
            l: S::Point::default(),
            own_share: Vec::new(),
            transcript: S::Hash::default(),
            kae: [0u8; MAX_HASH_LENGTH],
            kcab: [0u8; MAX_HASH_LENGTH],
        }
    }

    /// Current state
    pub fn state(&self) -> Spake2pState {
        self.state
    }

    /// Role, once `begin_prover` or `begin_verifier` succeeded
    pub fn role(&self) -> Option<Spake2pRole> {
        self.role
    }

    fn expect_state(&self, expected: Spake2pState, operation: &str) -> Result<()> {
        if self.state != expected {
            log::error!(
                "SPAKE2+ {} called in state {} (expected {})",
                operation,
                self.state,
                expected
            );
            return Err(CryptoError::Internal);
        }
        Ok(())
    }

    fn transition(&mut self, next: Spake2pState) {
        log::trace!("STATE_TRANSITION: {} -> {}", self.state, next);
        self.state = next;
    }

    fn current_role(&self) -> Result<Spake2pRole> {
        self.role.ok_or(CryptoError::Internal)
    }

    /// Start the transcript with `context` and load the `M`/`N` constants.
    ///
    /// # Errors
    ///
    /// `Internal` if not in `PreInit` or the suite cannot provide its constants.
    pub fn init(&mut self, context: &[u8]) -> Result<()> {
        self.expect_state(Spake2pState::PreInit, "init")?;

        if S::FE_SIZE > MAX_FE_LENGTH
            || S::POINT_SIZE > MAX_POINT_LENGTH
            || S::HASH_SIZE > MAX_HASH_LENGTH
            || S::HASH_SIZE % 2 != 0
        {
            return Err(CryptoError::Internal);
        }

        let m = self.suite.m_point()?;
        let n = self.suite.n_point()?;

        let mut transcript = S::Hash::default();
        hash_framed(&self.suite, &mut transcript, context)?;

        self.m = m;
        self.n = n;
        self.transcript = transcript;
        self.transition(Spake2pState::Init);
        Ok(())
    }

    /// Hash identities in role order, then `M` and `N`.
    fn begin_transcript(
        &self,
        role: Spake2pRole,
        my_identity: &[u8],
        peer_identity: &[u8],
    ) -> Result<S::Hash> {
        let mut transcript = self.transcript.clone();
        let (prover_id, verifier_id) = match role {
            Spake2pRole::Prover => (my_identity, peer_identity),
            Spake2pRole::Verifier => (peer_identity, my_identity),
        };
        hash_framed(&self.suite, &mut transcript, prover_id)?;
        hash_framed(&self.suite, &mut transcript, verifier_id)?;
        hash_point(&self.suite, &mut transcript, &self.m)?;
        hash_point(&self.suite, &mut transcript, &self.n)?;
        Ok(transcript)
    }

    /// Load the prover's password material.
    ///
    /// `w0s` and `w1s` are big-endian and reduced mod the group order, so both the
    /// raw PBKDF2 halves and already-reduced scalars are accepted.
    pub fn begin_prover(
        &mut self,
        my_identity: &[u8],
        peer_identity: &[u8],
        w0s: &[u8],
        w1s: &[u8],
    ) -> Result<()> {
        self.expect_state(Spake2pState::Init, "begin_prover")?;

        let w0 = Zeroizing::new(self.suite.compute_w0(w0s)?);
        let w1 = Zeroizing::new(self.suite.fe_load(w1s)?);
        let transcript = self.begin_transcript(Spake2pRole::Prover, my_identity, peer_identity)?;

        self.w0 = (*w0).clone();
        self.w1 = (*w1).clone();
        self.transcript = transcript;
        self.role = Some(Spake2pRole::Prover);
        self.transition(Spake2pState::Started);
        Ok(())
    }

    /// Load the verifier's record: `w0` and the uncompressed point `L`.
    pub fn begin_verifier(
        &mut self,
        my_identity: &[u8],
        peer_identity: &[u8],
        w0: &[u8],
        l: &[u8],
    ) -> Result<()> {
        self.expect_state(Spake2pState::Init, "begin_verifier")?;

        let w0 = Zeroizing::new(self.suite.compute_w0(w0)?);
        let l = Zeroizing::new(self.suite.point_load(l)?);
        if !self.suite.point_is_valid(&l) {
            return Err(CryptoError::Internal);
        }
        let transcript =
            self.begin_transcript(Spake2pRole::Verifier, my_identity, peer_identity)?;

        self.w0 = (*w0).clone();
        self.l = (*l).clone();
        self.transcript = transcript;
        self.role = Some(Spake2pRole::Verifier);
        self.transition(Spake2pState::Started);
        Ok(())
    }

    /// Produce the local share `X = x*G + w0*M` (prover) or `Y = y*G + w0*N` (verifier).
    ///
    /// A prover must pass `None`. A verifier may pass the prover's share, which is
    /// only validated here. Returns the number of bytes written (`POINT_SIZE`).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a prover given a peer share or a wrong-length share,
    /// `Internal` for an invalid point, a short `out` or a wrong state.
    pub fn compute_round_one(&mut self, peer_share: Option<&[u8]>, out: &mut [u8]) -> Result<usize> {
        self.expect_state(Spake2pState::Started, "compute_round_one")?;
        let role = self.current_role()?;

        match (role, peer_share) {
            (Spake2pRole::Prover, Some(_)) => return Err(CryptoError::InvalidArgument),
            (Spake2pRole::Verifier, Some(share)) => {
                if share.len() != S::POINT_SIZE {
                    return Err(CryptoError::InvalidArgument);
                }
                let point = Zeroizing::new(self.suite.point_load(share)?);
                if !self.suite.point_is_valid(&point) {
                    return Err(CryptoError::Internal);
                }
            }
            (_, None) => {}
        }

        if out.len() < S::POINT_SIZE {
            return Err(CryptoError::Internal);
        }

        let mut xy = Zeroizing::new(self.suite.fe_generate()?);
        let mn = match role {
            Spake2pRole::Prover => &self.m,
            Spake2pRole::Verifier => &self.n,
        };
        let share = Zeroizing::new(self.suite.point_add_mul(
            &self.suite.generator(),
            &xy,
            mn,
            &self.w0,
        ));

        let mut encoded = [0u8; MAX_POINT_LENGTH];
        let len = self.suite.point_write(&share, &mut encoded)?;
        if len != S::POINT_SIZE {
            return Err(CryptoError::Internal);
        }
        let own_share = Vec::from_slice(&encoded[..len]).map_err(|_| CryptoError::Internal)?;

        out[..len].copy_from_slice(&encoded[..len]);
        self.own_share = own_share;
        self.xy = core::mem::take(&mut *xy);
        log::debug!("SPAKE2+ {} round one: share_len={}", role, len);
        self.transition(Spake2pState::Round1);
        Ok(len)
    }

    /// Consume the peer's share, derive the keys and produce our confirmation MAC.
    ///
    /// Returns the number of bytes written (`HASH_SIZE`).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a wrong-length share, `Internal` for an invalid point,
    /// a short `out` or a wrong state.
    pub fn compute_round_two(&mut self, peer_share: &[u8], out: &mut [u8]) -> Result<usize> {
        self.expect_state(Spake2pState::Round1, "compute_round_two")?;
        let role = self.current_role()?;

        if peer_share.len() != S::POINT_SIZE {
            return Err(CryptoError::InvalidArgument);
        }
        if out.len() < S::HASH_SIZE {
            return Err(CryptoError::Internal);
        }

        let mut transcript = Zeroizing::new(self.transcript.clone());
        match role {
            Spake2pRole::Prover => {
                hash_framed(&self.suite, &mut transcript, &self.own_share)?;
                hash_framed(&self.suite, &mut transcript, peer_share)?;
            }
            Spake2pRole::Verifier => {
                hash_framed(&self.suite, &mut transcript, peer_share)?;
                hash_framed(&self.suite, &mut transcript, &self.own_share)?;
            }
        }

        let peer = Zeroizing::new(self.suite.point_load(peer_share)?);
        if !self.suite.point_is_valid(&peer) {
            log::warn!("SPAKE2+ {} rejected peer share: identity point", role);
            return Err(CryptoError::Internal);
        }

        // The peer blinded its share with the other role's constant
        let peer_mn = match role {
            Spake2pRole::Prover => &self.n,
            Spake2pRole::Verifier => &self.m,
        };
        let neg_mn = Zeroizing::new(self.suite.point_invert(peer_mn));

        let xy_w0 = Zeroizing::new(self.suite.fe_mul(&self.xy, &self.w0));
        let z = Zeroizing::new(self.suite.point_add_mul(&peer, &self.xy, &neg_mn, &xy_w0));
        let z = Zeroizing::new(self.suite.point_cofactor_mul(&z));

        let v = match role {
            Spake2pRole::Prover => {
                let w1_w0 = Zeroizing::new(self.suite.fe_mul(&self.w1, &self.w0));
                Zeroizing::new(self.suite.point_add_mul(&peer, &self.w1, &neg_mn, &w1_w0))
            }
            Spake2pRole::Verifier => Zeroizing::new(self.suite.point_mul(&self.l, &self.xy)),
        };
        let v = Zeroizing::new(self.suite.point_cofactor_mul(&v));

        hash_point(&self.suite, &mut transcript, &z)?;
        hash_point(&self.suite, &mut transcript, &v)?;
        let mut w0_bytes = Zeroizing::new([0u8; MAX_FE_LENGTH]);
        let w0_len = self.suite.fe_write(&self.w0, &mut w0_bytes[..])?;
        hash_framed(&self.suite, &mut transcript, &w0_bytes[..w0_len])?;

        let half = S::HASH_SIZE / 2;
        let mut kae = Zeroizing::new([0u8; MAX_HASH_LENGTH]);
        self.suite
            .hash_finalize(&mut transcript, &mut kae[..S::HASH_SIZE])?;
        transcript.zeroize();

        let mut kcab = Zeroizing::new([0u8; MAX_HASH_LENGTH]);
        self.suite.kdf(
            &kae[..half],
            &[],
            SPAKE2P_CONFIRMATION_KEYS_INFO,
            &mut kcab[..S::HASH_SIZE],
        )?;

        let confirmation_key = match role {
            Spake2pRole::Prover => &kcab[..half],
            Spake2pRole::Verifier => &kcab[half..S::HASH_SIZE],
        };
        let mac_len = self.suite.mac(confirmation_key, peer_share, out)?;

        self.kae = *kae;
        self.kcab = *kcab;
        self.transcript.zeroize();
        self.transition(Spake2pState::Round2);
        Ok(mac_len)
    }

    /// Verify the peer's confirmation MAC over our own share.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a wrong-length MAC; `Internal` for a mismatch or a
    /// wrong state. A mismatch is logged since it usually means a wrong passcode.
    pub fn key_confirm(&mut self, peer_mac: &[u8]) -> Result<()> {
        self.expect_state(Spake2pState::Round2, "key_confirm")?;
        let role = self.current_role()?;

        if peer_mac.len() != S::HASH_SIZE {
            return Err(CryptoError::InvalidArgument);
        }

        let half = S::HASH_SIZE / 2;
        let peer_key = match role {
            Spake2pRole::Prover => &self.kcab[half..S::HASH_SIZE],
            Spake2pRole::Verifier => &self.kcab[..half],
        };
        if !self.suite.mac_verify(peer_key, &self.own_share, peer_mac) {
            log::error!("SPAKE2+ {} key confirmation failed; likely wrong passcode", role);
            return Err(CryptoError::Internal);
        }

        self.transition(Spake2pState::KeyConfirmed);
        Ok(())
    }

    /// Copy the session key `Ke` into `out`, returning its length (`HASH_SIZE / 2`).
    ///
    /// # Errors
    ///
    /// `Internal` before key confirmation, `BufferTooSmall` for a short `out`.
    pub fn get_keys(&self, out: &mut [u8]) -> Result<usize> {
        self.expect_state(Spake2pState::KeyConfirmed, "get_keys")?;

        let half = S::HASH_SIZE / 2;
        let out = out.get_mut(..half).ok_or(CryptoError::BufferTooSmall)?;
        out.copy_from_slice(&self.kae[half..S::HASH_SIZE]);
        Ok(half)
    }

    /// Zero every secret and return to `PreInit`.
    pub fn clear(&mut self) {
        self.w0.zeroize();
        self.w1.zeroize();
        self.xy.zeroize();
        self.l.zeroize();
        self.own_share.as_mut_slice().zeroize();
        self.own_share.clear();
        self.kae.zeroize();
        self.kcab.zeroize();
        self.transcript.zeroize();
        self.role = None;
        if self.state != Spake2pState::PreInit {
            self.transition(Spake2pState::PreInit);
        }
    }
}

impl<S: Spake2pSuite> Drop for Spake2p<S> {
    fn drop(&mut self) {
        self.clear();
    }
}
