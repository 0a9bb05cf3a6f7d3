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

//! Published test vectors
//!
//! - the Matter default commissioning verifier (PIN 20202021)
//! - the P-256 / SHA-256 / HKDF / HMAC vector from draft-bar-cfrg-spake2plus-01,
//!   with the ephemeral scalars fed in through a fixed RNG

use hex_literal::hex;
use rand_core::{CryptoRng, RngCore};
use spake2p_crypto_rustcrypto::P256Sha256HkdfHmac;
use spake2p_protocol::{PbkdfParameters, Spake2p, Spake2pState, Spake2pVerifier};

const MATTER_PIN: u32 = 20_202_021;
const MATTER_SALT: &[u8] = b"SPAKE2P Key Salt";
const MATTER_ITERATIONS: u32 = 1_000;

const MATTER_WS: [u8; 80] = hex!(
    "aba60c30416b8f4177f5e16ad514cfd9577513f02fd60506b1049d0f2c731001"
    "0e5e40bfd86b4ef681a88b71e9e2a853985a7def916ea30e01b8722fbf7d0e38"
    "856c12cd64c225bb24ef21417e0e44e5"
);
const MATTER_W0: [u8; 32] =
    hex!("b96170aae803346884724fe9a3b287c30330c2a660375d17bb205a8cf1aecb35");
const MATTER_L: [u8; 65] = hex!(
    "0457f8ab79ee253ab6a8e46bb09e543ae422736de501e3db37d441fe344920d095"
    "48e4c18240630c4ff4913c53513839b7c07fcc0627a1b8573a149fcd1fa466cf"
);
const MATTER_VERIFIER_BASE64: &str = "uWFwqugDNGiEck/po7KHwwMwwqZgN10XuyBajPGuyzUEV/iree4lOrao5GuwnlQ65CJzbeUB49s31EH+NEkg0JVI5MGCQGMMT/SRPFNRODm3wH/MBiehuFc6FJ/NH6Rmzw==";

const DRAFT_CONTEXT: &[u8] = b"SPAKE2+-P256-SHA256-HKDF draft-01";
const DRAFT_W0: [u8; 32] =
    hex!("e6887cf9bdfb7579c69bf47928a84514b5e355ac034863f7ffaf4390e67d798c");
const DRAFT_W1: [u8; 32] =
    hex!("24b5ae4abda868ec9336ffc3b78ee31c5755bef1759227ef5372ca139b94e512");
const DRAFT_L: [u8; 65] = hex!(
    "0495645cfb74df6e58f9748bb83a86620bab7c82e107f57d6870da8cbcb2ff9f70"
    "63a14b6402c62f99afcb9706a4d1a143273259fe76f1c605a3639745a92154b9"
);
const DRAFT_X_SCALAR: [u8; 32] =
    hex!("8b0f3f383905cf3a3bb955ef8fb62e24849dd349a05ca79aafb18041d30cbdb6");
const DRAFT_Y_SCALAR: [u8; 32] =
    hex!("2e0895b0e763d6d5a9564433e64ac3cac74ff897f6c3445247ba1bab40082a91");
const DRAFT_X: [u8; 65] = hex!(
    "04af09987a593d3bac8694b123839422c3cc87e37d6b41c1d630f000dd64980e53"
    "7ae704bcede04ea3bec9b7475b32fa2ca3b684be14d11645e38ea6609eb39e7e"
);
const DRAFT_Y: [u8; 65] = hex!(
    "04417592620aebf9fd203616bbb9f121b730c258b286f890c5f19fea833a9c900c"
    "be9057bc549a3e19975be9927f0e7614f08d1f0a108eede5fd7eb5624584a4f4"
);
const DRAFT_CA: [u8; 32] =
    hex!("d4376f2da9c72226dd151b77c2919071155fc22a2068d90b5faa6c78c11e77dd");
const DRAFT_CB: [u8; 32] =
    hex!("0660a680663e8c5695956fb22dff298b1d07a526cf3cc591adfecd1f6ef6e02e");
const DRAFT_KE: [u8; 16] = hex!("801db297654816eb4f02868129b9dc89");

/// Hands out a fixed byte string, then panics if asked for more
struct FixedRng {
    bytes: Vec<u8>,
    pos: usize,
}

impl FixedRng {
    fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            pos: 0,
        }
    }
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let end = self.pos + dest.len();
        dest.copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for FixedRng {}

#[test]
fn test_matter_default_verifier() {
    let suite = P256Sha256HkdfHmac::default();
    let params = PbkdfParameters::new(MATTER_ITERATIONS, MATTER_SALT).unwrap();

    let ws = Spake2pVerifier::compute_ws(&suite, &params, MATTER_PIN).unwrap();
    assert_eq!(ws.w0s(), &MATTER_WS[..40]);
    assert_eq!(ws.w1s(), &MATTER_WS[40..]);

    let record = Spake2pVerifier::generate_with(&suite, &params, MATTER_PIN).unwrap();
    assert_eq!(record.w0, MATTER_W0);
    assert_eq!(record.l, MATTER_L);
    assert_eq!(record.to_base64().unwrap().as_str(), MATTER_VERIFIER_BASE64);
    assert_eq!(
        Spake2pVerifier::from_base64(MATTER_VERIFIER_BASE64).unwrap(),
        record
    );
}

#[test]
fn test_draft_vector_exchange() {
    let mut prover = Spake2p::new(P256Sha256HkdfHmac::new(FixedRng::new(&DRAFT_X_SCALAR)));
    prover.init(DRAFT_CONTEXT).unwrap();
    prover
        .begin_prover(b"client", b"server", &DRAFT_W0, &DRAFT_W1)
        .unwrap();

    let mut verifier = Spake2p::new(P256Sha256HkdfHmac::new(FixedRng::new(&DRAFT_Y_SCALAR)));
    verifier.init(DRAFT_CONTEXT).unwrap();
    verifier
        .begin_verifier(b"server", b"client", &DRAFT_W0, &DRAFT_L)
        .unwrap();

    let mut x = [0u8; 65];
    let mut y = [0u8; 65];
    prover.compute_round_one(None, &mut x).unwrap();
    verifier.compute_round_one(Some(&x[..]), &mut y).unwrap();
    assert_eq!(x, DRAFT_X);
    assert_eq!(y, DRAFT_Y);

    let mut c_a = [0u8; 32];
    let mut c_b = [0u8; 32];
    prover.compute_round_two(&y, &mut c_a).unwrap();
    verifier.compute_round_two(&x, &mut c_b).unwrap();
    assert_eq!(c_a, DRAFT_CA);
    assert_eq!(c_b, DRAFT_CB);

    prover.key_confirm(&c_b).unwrap();
    verifier.key_confirm(&c_a).unwrap();
    assert_eq!(prover.state(), Spake2pState::KeyConfirmed);

    let mut ke_prover = [0u8; 16];
    let mut ke_verifier = [0u8; 16];
    prover.get_keys(&mut ke_prover).unwrap();
    verifier.get_keys(&mut ke_verifier).unwrap();
    assert_eq!(ke_prover, DRAFT_KE);
    assert_eq!(ke_verifier, DRAFT_KE);
}
