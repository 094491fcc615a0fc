//! EIP-712 Signing
//!
//! Thin secp256k1 adapter around the digest: signs a finished digest and
//! checks signatures against a public key or an expected address.

use super::hasher::hash_typed_data;
use super::types::*;
use crate::utils::crypto::{address_from_uncompressed, to_checksum_address};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId, Signature};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Produces signatures over a finished digest
pub trait DigestSigner {
    fn sign_digest(&self, digest: &Digest) -> Result<Eip712Signature, Eip712Error>;

    /// Checksummed address of the signing key
    fn address(&self) -> String;
}

/// Checks signatures over a finished digest
pub trait DigestVerifier {
    fn verify_digest(&self, digest: &Digest, signature: &Eip712Signature) -> Result<bool, Eip712Error>;
}

/// In-memory secp256k1 key
pub struct LocalKeySigner {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl LocalKeySigner {
    pub fn from_bytes(private_key: &[u8]) -> Result<Self, Eip712Error> {
        if private_key.len() != 32 {
            return Err(Eip712Error::SigningError(format!(
                "invalid private key length: expected 32, got {}",
                private_key.len()
            )));
        }

        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| Eip712Error::SigningError(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Parse a hex private key (with or without 0x)
    pub fn from_hex(private_key: &str) -> Result<Self, Eip712Error> {
        let digits = private_key.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let mut bytes = hex::decode(digits)
            .map_err(|e| Eip712Error::SigningError(format!("invalid private key hex: {}", e)))?;
        let signer = Self::from_bytes(&bytes);
        zeroize::Zeroize::zeroize(&mut bytes);
        signer
    }

    /// Fresh random key
    pub fn random() -> Self {
        Self::from_secret_key(SecretKey::new(&mut rand::rngs::OsRng))
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Uncompressed SEC1 public key (65 bytes)
    pub fn public_key_bytes(&self) -> [u8; 65] {
        self.public_key.serialize_uncompressed()
    }
}

impl Drop for LocalKeySigner {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}

impl DigestSigner for LocalKeySigner {
    fn sign_digest(&self, digest: &Digest) -> Result<Eip712Signature, Eip712Error> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(*digest.as_bytes());

        let (recovery_id, signature) = secp
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&signature[0..32]);
        s.copy_from_slice(&signature[32..64]);

        // v is recovery_id + 27 (Ethereum standard)
        let v = recovery_id.to_i32() as u8 + 27;

        crate::log_debug!(
            "eip712::signer",
            "Signed digest",
            digest = digest.to_hex(),
            signer = self.address(),
        );

        Ok(Eip712Signature::new(r, s, v))
    }

    fn address(&self) -> String {
        to_checksum_address(&address_from_uncompressed(&self.public_key_bytes()))
    }
}

/// Verifies the 64-byte (r, s) part of a signature against a known public key
pub struct PublicKeyVerifier {
    public_key: PublicKey,
}

impl PublicKeyVerifier {
    /// Accepts compressed (33 bytes) or uncompressed (65 bytes) SEC1 keys
    pub fn from_slice(public_key: &[u8]) -> Result<Self, Eip712Error> {
        let public_key = PublicKey::from_slice(public_key)
            .map_err(|e| Eip712Error::InvalidSignature(format!("invalid public key: {}", e)))?;
        Ok(Self { public_key })
    }

    pub fn from_hex(public_key: &str) -> Result<Self, Eip712Error> {
        let digits = public_key.strip_prefix("0x").unwrap_or(public_key);
        let bytes = hex::decode(digits)
            .map_err(|e| Eip712Error::InvalidSignature(format!("invalid public key hex: {}", e)))?;
        Self::from_slice(&bytes)
    }
}

impl DigestVerifier for PublicKeyVerifier {
    fn verify_digest(&self, digest: &Digest, signature: &Eip712Signature) -> Result<bool, Eip712Error> {
        let secp = Secp256k1::verification_only();
        let message = Message::from_digest(*digest.as_bytes());
        let compact = Signature::from_compact(&signature.compact())
            .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

        Ok(secp.verify_ecdsa(&message, &compact, &self.public_key).is_ok())
    }
}

/// Recovers the signer and compares it with an expected address
pub struct AddressVerifier {
    expected: String,
}

impl AddressVerifier {
    pub fn new(expected_address: &str) -> Self {
        Self {
            expected: normalize_address(expected_address),
        }
    }
}

impl DigestVerifier for AddressVerifier {
    fn verify_digest(&self, digest: &Digest, signature: &Eip712Signature) -> Result<bool, Eip712Error> {
        let recovered = recover_address(digest.as_bytes(), signature)?;
        Ok(normalize_address(&recovered) == self.expected)
    }
}

fn normalize_address(address: &str) -> String {
    let lower = address.trim().to_lowercase();
    lower.strip_prefix("0x").unwrap_or(&lower).to_string()
}

/// Sign EIP-712 typed data
pub fn sign_typed_data(
    typed_data: &TypedData,
    private_key: &[u8],
) -> Result<Eip712Signature, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    sign_hash(&hash, private_key)
}

/// Sign a pre-computed hash
pub fn sign_hash(hash: &[u8; 32], private_key: &[u8]) -> Result<Eip712Signature, Eip712Error> {
    LocalKeySigner::from_bytes(private_key)?.sign_digest(&Digest(*hash))
}

/// Verify an EIP-712 signature against the expected signer address
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &Eip712Signature,
    expected_address: &str,
) -> Result<bool, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    verify_signature(&hash, signature, expected_address)
}

/// Verify a signature against a hash and expected address
pub fn verify_signature(
    hash: &[u8; 32],
    signature: &Eip712Signature,
    expected_address: &str,
) -> Result<bool, Eip712Error> {
    AddressVerifier::new(expected_address).verify_digest(&Digest(*hash), signature)
}

/// Recover the signer's public key (uncompressed, 65 bytes)
pub fn recover_public_key(
    hash: &[u8; 32],
    signature: &Eip712Signature,
) -> Result<[u8; 65], Eip712Error> {
    let secp = Secp256k1::verification_only();

    let recovery_id = RecoveryId::from_i32(signature.recovery_id()?)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;
    let recoverable_sig = RecoverableSignature::from_compact(&signature.compact(), recovery_id)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest(*hash);
    let public_key = secp
        .recover_ecdsa(&message, &recoverable_sig)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    Ok(public_key.serialize_uncompressed())
}

/// Recover the signer's checksummed address from a signature
pub fn recover_address(hash: &[u8; 32], signature: &Eip712Signature) -> Result<String, Eip712Error> {
    let public_key = recover_public_key(hash, signature)?;
    Ok(to_checksum_address(&address_from_uncompressed(&public_key)))
}
