//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data hashing.

use super::registry::TypeRegistry;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// Name of the reserved domain pseudo-type
pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "Person[]")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The EIP-712 domain separator data
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The current major version of the signing domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The EIP-155 chain ID (number, decimal string or hex string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<serde_json::Value>,

    /// The address of the contract that will verify the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    /// An optional disambiguating salt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// Synthesize the `EIP712Domain` fields in canonical order,
    /// keeping only the populated ones
    pub fn type_fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }

    /// Render the populated fields as a message value
    pub fn to_value(&self) -> Result<serde_json::Value, Eip712Error> {
        serde_json::to_value(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }
}

/// Complete EIP-712 typed data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: TypeRegistry,

    /// The name of the primary type being signed
    pub primary_type: String,

    /// The EIP-712 domain
    pub domain: Eip712Domain,

    /// The actual message data to hash
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// The `EIP712Domain` fields used for this envelope: the declared entry
    /// when present, otherwise synthesized from the domain.
    pub fn domain_type(&self) -> Vec<TypedDataField> {
        match self.types.get(EIP712_DOMAIN_TYPE) {
            Some(fields) => fields.to_vec(),
            None => self.domain.type_fields(),
        }
    }

    /// Validate the typed data structure
    pub fn validate(&self) -> Result<(), Eip712Error> {
        if self.primary_type == EIP712_DOMAIN_TYPE || !self.types.contains(&self.primary_type) {
            return Err(Eip712Error::InvalidPrimaryType(self.primary_type.clone()));
        }

        self.types.validate()
    }
}

/// Final 32-byte signing digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex (66 chars)
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| Eip712Error::InvalidPrimitiveEncoding {
            type_name: "bytes32".to_string(),
            reason: e.to_string(),
        })?;
        let array: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            Eip712Error::InvalidPrimitiveEncoding {
                type_name: "bytes32".to_string(),
                reason: format!("expected 32 bytes, got {}", b.len()),
            }
        })?;
        Ok(Self(array))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// EIP-712 signature components
#[derive(Debug, Clone, Zeroize)]
#[zeroize(drop)]
pub struct Eip712Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// v component (recovery id, 27 or 28)
    pub v: u8,
}

impl Eip712Signature {
    /// Create from raw components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Create from 65-byte signature (r || s || v); v may be 0/1 or 27/28
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() != 65 {
            return Err(Eip712Error::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = match bytes[64] {
            v @ (0 | 1) => v + 27,
            v => v,
        };

        Ok(Self { r, s, v })
    }

    /// Parse a hex signature (with or without 0x)
    pub fn from_hex(s: &str) -> Result<Self, Eip712Error> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Convert to 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// The 64-byte compact form (r || s)
    pub fn compact(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes
    }

    /// Recovery id in 0..=3
    pub fn recovery_id(&self) -> Result<i32, Eip712Error> {
        match self.v {
            27..=30 => Ok(i32::from(self.v - 27)),
            0..=3 => Ok(i32::from(self.v)),
            v => Err(Eip712Error::InvalidSignature(format!("invalid v: {}", v))),
        }
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Invalid primary type: {0}")]
    InvalidPrimaryType(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Integer out of range for {type_name}: {value}")]
    IntegerOutOfRange { type_name: String, value: String },

    #[error("Array length mismatch for {type_name}: expected {expected}, got {actual}")]
    ArrayLengthMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cyclic type reference at {type_name}: nesting exceeds {max_depth}")]
    CyclicTypeReference { type_name: String, max_depth: usize },

    #[error("Invalid {type_name} encoding: {reason}")]
    InvalidPrimitiveEncoding { type_name: String, reason: String },

    #[error("Invalid value for type {type_name}: {value}")]
    InvalidValue { type_name: String, value: String },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Parse the bit width of `uintN`/`intN`, if the name has that shape
pub fn integer_width(type_name: &str) -> Option<(bool, u32)> {
    let (signed, bits) = if let Some(bits) = type_name.strip_prefix("uint") {
        (false, bits)
    } else if let Some(bits) = type_name.strip_prefix("int") {
        (true, bits)
    } else {
        return None;
    };

    if bits.is_empty() || bits.starts_with('0') || !bits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = bits.parse().ok()?;
    (n > 0 && n <= 256 && n % 8 == 0).then_some((signed, n))
}

/// Parse the size of fixed `bytesK`
pub fn fixed_bytes_size(type_name: &str) -> Option<usize> {
    let size = type_name.strip_prefix("bytes")?;
    if size.is_empty() || size.starts_with('0') || !size.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: usize = size.parse().ok()?;
    (n > 0 && n <= 32).then_some(n)
}

/// Check if a type is an atomic (fixed-size) type
pub fn is_atomic_type(type_name: &str) -> bool {
    type_name == "address"
        || type_name == "bool"
        || integer_width(type_name).is_some()
        || fixed_bytes_size(type_name).is_some()
}

/// Check if a type is a dynamic type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}

/// Check if a type is any primitive
pub fn is_primitive_type(type_name: &str) -> bool {
    is_atomic_type(type_name) || is_dynamic_type(type_name)
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_atomic_types() {
        assert!(is_atomic_type("address"));
        assert!(is_atomic_type("bool"));
        assert!(is_atomic_type("uint256"));
        assert!(is_atomic_type("uint8"));
        assert!(is_atomic_type("int256"));
        assert!(is_atomic_type("bytes32"));
        assert!(is_atomic_type("bytes1"));

        assert!(!is_atomic_type("string"));
        assert!(!is_atomic_type("bytes"));
        assert!(!is_atomic_type("uint"));
        assert!(!is_atomic_type("uint257"));
        assert!(!is_atomic_type("uint7"));
        assert!(!is_atomic_type("uint08"));
        assert!(!is_atomic_type("bytes33"));
        assert!(!is_atomic_type("bytes0"));
    }

    #[test]
    fn test_dynamic_types() {
        assert!(is_dynamic_type("bytes"));
        assert!(is_dynamic_type("string"));

        assert!(!is_dynamic_type("bytes32"));
        assert!(!is_dynamic_type("address"));
    }

    #[test]
    fn test_integer_width() {
        assert_eq!(integer_width("uint256"), Some((false, 256)));
        assert_eq!(integer_width("int8"), Some((true, 8)));
        assert_eq!(integer_width("uint"), None);
        assert_eq!(integer_width("Person"), None);
    }

    #[test]
    fn test_signature_conversion() {
        let sig = Eip712Signature::new([1u8; 32], [2u8; 32], 27);
        let bytes = sig.to_bytes();
        let recovered = Eip712Signature::from_bytes(&bytes).unwrap();

        assert_eq!(sig.r, recovered.r);
        assert_eq!(sig.s, recovered.s);
        assert_eq!(sig.v, recovered.v);
    }

    #[test]
    fn test_signature_normalizes_v() {
        let mut bytes = [0u8; 65];
        bytes[64] = 1;
        let sig = Eip712Signature::from_bytes(&bytes).unwrap();
        assert_eq!(sig.v, 28);
        assert_eq!(sig.recovery_id().unwrap(), 1);

        assert!(Eip712Signature::from_bytes(&bytes[..64]).is_err());
    }

    #[test]
    fn test_domain_type_fields_follow_canonical_order() {
        let domain = Eip712Domain {
            chain_id: Some(serde_json::json!(1)),
            name: Some("Test".to_string()),
            ..Default::default()
        };
        let names: Vec<_> = domain.type_fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "chainId"]);
    }

    #[test]
    fn test_digest_hex() {
        let digest = Digest([0xab; 32]);
        let hex = digest.to_hex();
        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("0xabab"));
        assert_eq!(hex.parse::<Digest>().unwrap(), digest);
        assert!("0x1234".parse::<Digest>().is_err());
    }
}
