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

//! SPAKE2+ protocol layer
//!
//! Sans-IO: every operation takes byte slices in and writes byte slices out.
//! The caller moves shares and MACs between the two parties.
//!
//! - [`Spake2p`]: the two-round engine with key confirmation
//! - [`Spake2pVerifier`]: PBKDF2 derivation of `(w0, L)` from a PIN
//! - [`group_keys`]: operational group key, session id and privacy key
//! - [`fabric`]: compressed fabric identifier

#![cfg_attr(not(test), no_std)]

pub mod engine;
pub mod fabric;
pub mod group_keys;
pub mod state;
pub mod verifier;

pub use engine::{Spake2p, SPAKE2P_CONFIRMATION_KEYS_INFO};
pub use fabric::generate_compressed_fabric_id;
pub use group_keys::{
    derive_group_operational_credentials, derive_group_operational_key, derive_group_privacy_key,
    derive_group_session_id, EpochKey, GroupOperationalCredentials,
};
pub use state::{Spake2pRole, Spake2pState};
pub use verifier::{PbkdfParameters, Spake2pVerifier, Spake2pWs};

pub use spake2p_common::{CryptoError, Result};
