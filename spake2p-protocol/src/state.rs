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

//! State machine types for the SPAKE2+ engine

use core::fmt;

/// Engine lifecycle states
///
/// Transitions only move forward, one step at a time:
///
/// ```text
/// PreInit --init--> Init --begin_prover|begin_verifier--> Started
///   --compute_round_one--> Round1 --compute_round_two--> Round2
///   --key_confirm--> KeyConfirmed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Spake2pState {
    /// Constructed, transcript not started
    PreInit,
    /// Context hashed, constants loaded
    Init,
    /// Identities and password material loaded
    Started,
    /// Own share produced
    Round1,
    /// Keys derived, own confirmation MAC produced
    Round2,
    /// Peer confirmation MAC verified (terminal)
    KeyConfirmed,
}

impl Spake2pState {
    /// Name used in transition logs
    pub fn name(self) -> &'static str {
        match self {
            Self::PreInit => "PreInit",
            Self::Init => "Init",
            Self::Started => "Started",
            Self::Round1 => "Round1",
            Self::Round2 => "Round2",
            Self::KeyConfirmed => "KeyConfirmed",
        }
    }
}

impl fmt::Display for Spake2pState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Protocol role, fixed at `begin_prover` / `begin_verifier`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spake2pRole {
    /// Holds `(w0, w1)`; usually the commissioner
    Prover,
    /// Holds `(w0, L)`; usually the device being commissioned
    Verifier,
}

impl fmt::Display for Spake2pRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prover => f.write_str("Prover"),
            Self::Verifier => f.write_str("Verifier"),
        }
    }
}
