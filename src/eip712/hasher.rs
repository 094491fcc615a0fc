//! EIP-712 Hashing
//!
//! Implements domain separator, struct hashing and the final signing digest.

use super::encoder::encode_data_with;
use super::registry::TypeRegistry;
use super::types::*;
use crate::utils::crypto::keccak256;
use crate::utils::settings::{DomainTypeSource, HasherSettings};

/// Magic prefix for EIP-712 encoding
pub const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// Hash a struct according to EIP-712
///
/// hashStruct(s) = keccak256(typeHash || encodeData(s))
pub fn hash_struct(
    type_name: &str,
    data: &serde_json::Value,
    registry: &TypeRegistry,
) -> Result<[u8; 32], Eip712Error> {
    hash_struct_with(type_name, data, registry, &HasherSettings::default())
}

/// [`hash_struct`] with explicit settings
pub fn hash_struct_with(
    type_name: &str,
    data: &serde_json::Value,
    registry: &TypeRegistry,
    settings: &HasherSettings,
) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_data_with(type_name, data, registry, settings)?;
    Ok(keccak256(&encoded))
}

/// Calculate the domain separator hash
///
/// domainSeparator = hashStruct(eip712Domain), with `EIP712Domain`
/// synthesized from the populated fields in canonical order.
pub fn domain_separator(domain: &Eip712Domain) -> Result<[u8; 32], Eip712Error> {
    domain_separator_with_fields(domain, domain.type_fields(), &HasherSettings::default())
}

fn domain_separator_with_fields(
    domain: &Eip712Domain,
    fields: Vec<TypedDataField>,
    settings: &HasherSettings,
) -> Result<[u8; 32], Eip712Error> {
    let registry = TypeRegistry::new().with_type(EIP712_DOMAIN_TYPE, fields);
    hash_struct_with(EIP712_DOMAIN_TYPE, &domain.to_value()?, &registry, settings)
}

/// Domain separator for an envelope, honoring a declared `EIP712Domain`
/// entry unless the settings ask for synthesis
pub fn typed_data_domain_separator(
    typed_data: &TypedData,
    settings: &HasherSettings,
) -> Result<[u8; 32], Eip712Error> {
    let fields = match settings.domain_type {
        DomainTypeSource::DeclaredIfPresent => typed_data.domain_type(),
        DomainTypeSource::Synthesized => typed_data.domain.type_fields(),
    };
    domain_separator_with_fields(&typed_data.domain, fields, settings)
}

/// Build the 66-byte pre-image "\x19\x01" || domainSeparator || structHash
pub fn digest_pre_image(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 66] {
    let mut data = [0u8; 66];
    data[..2].copy_from_slice(EIP712_PREFIX);
    data[2..34].copy_from_slice(domain_separator);
    data[34..].copy_from_slice(struct_hash);
    data
}

/// Combine a domain separator and struct hash into the signing digest
///
/// digest = keccak256("\x19\x01" || domainSeparator || structHash)
pub fn final_digest(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> Digest {
    Digest(keccak256(&digest_pre_image(domain_separator, struct_hash)))
}

/// Calculate the final EIP-712 hash for signing
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    Ok(get_pre_image(typed_data)?.digest.0)
}

/// Pre-image components (for external signing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712PreImage {
    pub domain_separator: [u8; 32],
    pub struct_hash: [u8; 32],
    pub digest: Digest,
    /// "\x19\x01" || domainSeparator || structHash
    pub raw: Vec<u8>,
}

impl Eip712PreImage {
    pub fn domain_separator_hex(&self) -> String {
        format!("0x{}", hex::encode(self.domain_separator))
    }

    pub fn struct_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.struct_hash))
    }
}

/// Calculate the pre-image components for EIP-712
pub fn get_pre_image(typed_data: &TypedData) -> Result<Eip712PreImage, Eip712Error> {
    get_pre_image_with(typed_data, &HasherSettings::default())
}

/// [`get_pre_image`] with explicit settings
pub fn get_pre_image_with(
    typed_data: &TypedData,
    settings: &HasherSettings,
) -> Result<Eip712PreImage, Eip712Error> {
    settings.validate()?;
    typed_data.validate()?;

    let domain_separator = typed_data_domain_separator(typed_data, settings)?;

    let struct_hash = hash_struct_with(
        &typed_data.primary_type,
        &typed_data.message,
        &typed_data.types,
        settings,
    )?;

    let raw = digest_pre_image(&domain_separator, &struct_hash);
    Ok(Eip712PreImage {
        domain_separator,
        struct_hash,
        digest: Digest(keccak256(&raw)),
        raw: raw.to_vec(),
    })
}
