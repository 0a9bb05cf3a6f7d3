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

//! P-256 ECDSA key pair and PKCS#10 certificate signing requests.
//!
//! Signatures leave this module either as raw `r || s` or as X9.62 DER produced
//! by [`spake2p_common::der`]; the CSR embeds the DER form.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_core::CryptoRngCore;
use spake2p_common::der::{ecdsa_asn1_signature_to_raw, ecdsa_raw_signature_to_asn1};
use spake2p_common::{
    CryptoError, Result, MIN_CSR_BUFFER_SIZE, P256_ECDSA_SIGNATURE_LENGTH_RAW, P256_FE_LENGTH,
    P256_POINT_LENGTH,
};
use tracing::{debug, trace};
use x509_cert::attr::{AttributeTypeAndValue, AttributeValue};
use x509_cert::der::asn1::{BitString, ObjectIdentifier};
use x509_cert::der::{Any, Decode, Encode, Tag};
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

/// organizationName
const OID_ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
/// id-ecPublicKey
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// prime256v1
const OID_PRIME256V1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// ecdsa-with-SHA256
const OID_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

/// Placeholder subject organization
const CSR_SUBJECT_ORGANIZATION: &str = "CSR";

/// Largest DER encoding of a P-256 signature: two stuffed 33-byte integers plus headers
const MAX_P256_DER_SIGNATURE_LENGTH: usize = 2 * (P256_FE_LENGTH + 3) + 2;

/// P-256 ECDSA signing key with its cached uncompressed public key
pub struct P256Keypair {
    secret: SigningKey,
    public_key: [u8; P256_POINT_LENGTH],
}

impl P256Keypair {
    /// Generate a new key pair
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Result<Self> {
        Self::from_signing_key(SigningKey::random(rng))
    }

    /// Import a key pair from its 32-byte big-endian secret scalar
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self> {
        if secret.len() != P256_FE_LENGTH {
            return Err(CryptoError::InvalidArgument);
        }
        let key = SigningKey::from_slice(secret).map_err(|_| CryptoError::InvalidArgument)?;
        Self::from_signing_key(key)
    }

    fn from_signing_key(secret: SigningKey) -> Result<Self> {
        let encoded = secret.verifying_key().to_encoded_point(false);
        let public_key = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::Internal)?;
        Ok(Self { secret, public_key })
    }

    /// Uncompressed SEC1 public key (`0x04 || X || Y`)
    pub fn public_key(&self) -> &[u8; P256_POINT_LENGTH] {
        &self.public_key
    }

    /// Sign `message` (hashed with SHA-256), writing the raw 64-byte `r || s` signature.
    pub fn sign_raw(&self, message: &[u8], out: &mut [u8]) -> Result<usize> {
        let out = out
            .get_mut(..P256_ECDSA_SIGNATURE_LENGTH_RAW)
            .ok_or(CryptoError::BufferTooSmall)?;
        let signature: Signature = self
            .secret
            .try_sign(message)
            .map_err(|_| CryptoError::Internal)?;
        out.copy_from_slice(&signature.to_bytes());
        Ok(P256_ECDSA_SIGNATURE_LENGTH_RAW)
    }

    /// Sign `message`, writing an X9.62 DER signature. Returns the DER length.
    pub fn sign_der(&self, message: &[u8], out: &mut [u8]) -> Result<usize> {
        let mut raw = [0u8; P256_ECDSA_SIGNATURE_LENGTH_RAW];
        self.sign_raw(message, &mut raw)?;
        ecdsa_raw_signature_to_asn1(P256_FE_LENGTH, &raw, out)
    }

    /// Build a DER PKCS#10 CSR for this key into `out`, returning its length.
    ///
    /// The subject is the fixed placeholder `O=CSR` and the attribute set is empty.
    ///
    /// # Errors
    ///
    /// `BufferTooSmall` if `out` is shorter than [`MIN_CSR_BUFFER_SIZE`].
    pub fn new_certificate_signing_request(&self, out: &mut [u8]) -> Result<usize> {
        if out.len() < MIN_CSR_BUFFER_SIZE {
            return Err(CryptoError::BufferTooSmall);
        }

        let organization = AttributeTypeAndValue {
            oid: OID_ORGANIZATION_NAME,
            value: AttributeValue::new(Tag::Utf8String, CSR_SUBJECT_ORGANIZATION.as_bytes())
                .map_err(|_| CryptoError::Internal)?,
        };
        let rdn = vec![organization]
            .try_into()
            .map_err(|_| CryptoError::Internal)?;
        let subject = RdnSequence(vec![RelativeDistinguishedName(rdn)]);

        let info = CertReqInfo {
            version: Version::V1,
            subject,
            public_key: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: OID_EC_PUBLIC_KEY,
                    parameters: Some(
                        Any::new(Tag::ObjectIdentifier, OID_PRIME256V1.as_bytes())
                            .map_err(|_| CryptoError::Internal)?,
                    ),
                },
                subject_public_key: BitString::from_bytes(&self.public_key)
                    .map_err(|_| CryptoError::Internal)?,
            },
            attributes: Default::default(),
        };

        let tbs = info.to_der().map_err(|_| CryptoError::Internal)?;
        let mut signature = [0u8; MAX_P256_DER_SIGNATURE_LENGTH];
        let signature_len = self.sign_der(&tbs, &mut signature)?;

        let csr = CertReq {
            info,
            algorithm: AlgorithmIdentifierOwned {
                oid: OID_ECDSA_WITH_SHA256,
                parameters: None,
            },
            signature: BitString::from_bytes(&signature[..signature_len])
                .map_err(|_| CryptoError::Internal)?,
        };

        let encoded = csr
            .encode_to_slice(out)
            .map_err(|_| CryptoError::BufferTooSmall)?;
        debug!("Generated CSR: len={}", encoded.len());
        Ok(encoded.len())
    }
}

/// Verify a raw `r || s` P-256 signature over `message`.
///
/// # Errors
///
/// `InvalidArgument` for a malformed public key, `InvalidSignature` if the
/// signature is malformed or does not verify.
pub fn verify_raw_signature(public_key: &[u8], message: &[u8], raw_signature: &[u8]) -> Result<()> {
    let key =
        VerifyingKey::from_sec1_bytes(public_key).map_err(|_| CryptoError::InvalidArgument)?;
    let signature =
        Signature::from_slice(raw_signature).map_err(|_| CryptoError::InvalidSignature)?;
    key.verify(message, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

/// Parse and verify a DER PKCS#10 CSR, returning the requester's public key.
///
/// Only P-256 keys signed with `ecdsa-with-SHA256` are accepted.
///
/// # Errors
///
/// `UnsupportedCertFormat` on any parse or algorithm mismatch, `InvalidSignature`
/// if the self-signature does not verify.
pub fn verify_certificate_signing_request(csr: &[u8]) -> Result<[u8; P256_POINT_LENGTH]> {
    let request = CertReq::from_der(csr).map_err(|_| {
        trace!("CSR: DER parse failed, len={}", csr.len());
        CryptoError::UnsupportedCertFormat
    })?;

    if request.algorithm.oid != OID_ECDSA_WITH_SHA256 {
        trace!("CSR: unexpected signature algorithm {}", request.algorithm.oid);
        return Err(CryptoError::UnsupportedCertFormat);
    }

    let spki = &request.info.public_key;
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.decode_as::<ObjectIdentifier>().ok());
    if spki.algorithm.oid != OID_EC_PUBLIC_KEY || curve != Some(OID_PRIME256V1) {
        trace!("CSR: unsupported key algorithm {}", spki.algorithm.oid);
        return Err(CryptoError::UnsupportedCertFormat);
    }

    let public_key: [u8; P256_POINT_LENGTH] = spki
        .subject_public_key
        .as_bytes()
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(CryptoError::UnsupportedCertFormat)?;

    let der_signature = request
        .signature
        .as_bytes()
        .ok_or(CryptoError::UnsupportedCertFormat)?;
    let mut raw_signature = [0u8; P256_ECDSA_SIGNATURE_LENGTH_RAW];
    ecdsa_asn1_signature_to_raw(P256_FE_LENGTH, der_signature, &mut raw_signature)
        .map_err(|_| CryptoError::UnsupportedCertFormat)?;

    let tbs = request
        .info
        .to_der()
        .map_err(|_| CryptoError::UnsupportedCertFormat)?;
    verify_raw_signature(&public_key, &tbs, &raw_signature).map_err(|e| match e {
        CryptoError::InvalidArgument => CryptoError::UnsupportedCertFormat,
        other => other,
    })?;

    Ok(public_key)
}
