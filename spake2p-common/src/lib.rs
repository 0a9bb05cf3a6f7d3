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

#![cfg_attr(not(test), no_std)]

//! Shared types for the SPAKE2+ workspace.
//!
//! This crate holds the pieces every other layer agrees on:
//! - the error taxonomy ([`CryptoError`])
//! - fixed sizes of the P-256 / SHA-256 suite ([`types`])
//! - the DER/ASN.1 integer and ECDSA signature codec ([`der`])

pub mod der;
pub mod error;
pub mod types;

pub use error::{CryptoError, Result};
pub use types::*;
