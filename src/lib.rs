//! EIP-712 Digest Library
//!
//! Typed structured-data hashing per EIP-712: reduces a typed-data envelope
//! (`types`, `primaryType`, `domain`, `message`) to the 32-byte digest that a
//! wallet signs.
//!
//! # Architecture
//!
//! This crate provides:
//! - **eip712**: type registry, type hashing, value encoding, domain
//!   separator and digest assembly, plus a secp256k1 signature adapter
//! - **error**: serializable error codes for the command-line tool
//! - **utils**: keccak256 and address helpers, settings, redacting logger
//!
//! The hashing engine is pure: no I/O, no logging, no shared mutable state.
//! Independent envelopes can be hashed concurrently.
//!
//! # Example
//!
//! ```rust,ignore
//! use eip712_digest::{TypedData, get_pre_image};
//!
//! let typed_data = TypedData::from_json(json)?;
//! let pre_image = get_pre_image(&typed_data)?;
//! println!("digest: {}", pre_image.digest);
//! ```

pub mod error;
pub mod eip712;
pub mod utils;

// Re-export key types for convenience
pub use error::{ErrorCode, ToolError, ToolResult};
pub use eip712::{
    domain_separator, encode_data, encode_type, final_digest, get_pre_image, get_pre_image_with,
    hash_struct, hash_typed_data, type_hash, Digest, DigestSigner, DigestVerifier, Eip712Domain,
    Eip712Error, Eip712PreImage, Eip712Signature, LocalKeySigner, PublicKeyVerifier, TypeRegistry,
    TypedData, TypedDataField,
};
pub use utils::crypto::{keccak256, to_checksum_address};
pub use utils::settings::HasherSettings;
