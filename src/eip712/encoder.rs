//! EIP-712 Type Encoding
//!
//! Implements `encodeType`, `typeHash` and `encodeData` for EIP-712 typed data.

use super::registry::{split_array, ArrayLength, TypeRegistry};
use super::types::*;
use crate::utils::crypto::keccak256;
use crate::utils::settings::HasherSettings;
use ethers_core::types::U256;
use serde_json::Value;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)" followed by every
/// referenced struct type in ASCII order of name
pub fn encode_type(type_name: &str, registry: &TypeRegistry) -> Result<String, Eip712Error> {
    let dependencies = registry.dependencies(type_name)?;

    let mut result = format_type_string(type_name, registry)?;
    for dep in dependencies.iter().filter(|dep| dep.as_str() != type_name) {
        result.push_str(&format_type_string(dep, registry)?);
    }

    Ok(result)
}

/// Format a single type string
fn format_type_string(type_name: &str, registry: &TypeRegistry) -> Result<String, Eip712Error> {
    let fields = registry.resolve(type_name)?;

    let mut field_strs = Vec::with_capacity(fields.len());
    for field in fields {
        let mut element = field.type_name.as_str();
        while let Some((inner, _)) = split_array(element)? {
            element = inner;
        }
        if !is_primitive_type(element) && !registry.contains(element) {
            return Err(Eip712Error::UnknownType(element.to_string()));
        }
        field_strs.push(format!("{} {}", field.type_name, field.name));
    }

    Ok(format!("{}({})", type_name, field_strs.join(",")))
}

/// Calculate the type hash for a struct type
/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, registry: &TypeRegistry) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_type(type_name, registry)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// Encode a struct value: typeHash || enc(field_1) || ... || enc(field_n)
pub fn encode_data(
    type_name: &str,
    value: &Value,
    registry: &TypeRegistry,
) -> Result<Vec<u8>, Eip712Error> {
    encode_data_with(type_name, value, registry, &HasherSettings::default())
}

/// [`encode_data`] with explicit settings
pub fn encode_data_with(
    type_name: &str,
    value: &Value,
    registry: &TypeRegistry,
    settings: &HasherSettings,
) -> Result<Vec<u8>, Eip712Error> {
    ValueEncoder { registry, settings }.encode_struct(type_name, value, 0)
}

/// Encode a single field value into its 32-byte slot
pub fn encode_field(
    type_name: &str,
    value: &Value,
    registry: &TypeRegistry,
    settings: &HasherSettings,
) -> Result<[u8; 32], Eip712Error> {
    ValueEncoder { registry, settings }.encode_field(type_name, value, 0)
}

struct ValueEncoder<'a> {
    registry: &'a TypeRegistry,
    settings: &'a HasherSettings,
}

impl ValueEncoder<'_> {
    fn check_depth(&self, type_name: &str, depth: usize) -> Result<(), Eip712Error> {
        if depth > self.settings.max_depth {
            return Err(Eip712Error::CyclicTypeReference {
                type_name: type_name.to_string(),
                max_depth: self.settings.max_depth,
            });
        }
        Ok(())
    }

    fn encode_struct(&self, type_name: &str, value: &Value, depth: usize) -> Result<Vec<u8>, Eip712Error> {
        self.check_depth(type_name, depth)?;

        let fields = self.registry.resolve(type_name)?;
        let obj = value.as_object().ok_or_else(|| invalid_value(type_name, value))?;

        let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
        encoded.extend_from_slice(&type_hash(type_name, self.registry)?);

        // Undeclared keys in `obj` are ignored
        for field in fields {
            let field_value = match obj.get(&field.name) {
                Some(Value::Null) | None => {
                    return Err(Eip712Error::MissingField(format!("{}.{}", type_name, field.name)));
                }
                Some(v) => v,
            };
            encoded.extend_from_slice(&self.encode_field(&field.type_name, field_value, depth + 1)?);
        }

        Ok(encoded)
    }

    fn encode_field(&self, type_name: &str, value: &Value, depth: usize) -> Result<[u8; 32], Eip712Error> {
        self.check_depth(type_name, depth)?;

        if let Some((element_type, length)) = split_array(type_name)? {
            return self.encode_array(type_name, element_type, length, value, depth);
        }

        // Structs nest by their hash
        if self.registry.contains(type_name) {
            return Ok(keccak256(&self.encode_struct(type_name, value, depth)?));
        }

        match type_name {
            "string" => {
                let s = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
                Ok(keccak256(s.as_bytes()))
            }
            "bytes" => Ok(keccak256(&parse_bytes(type_name, value)?)),
            _ => self.encode_atomic(type_name, value),
        }
    }

    fn encode_array(
        &self,
        type_name: &str,
        element_type: &str,
        length: ArrayLength,
        value: &Value,
        depth: usize,
    ) -> Result<[u8; 32], Eip712Error> {
        let items = value.as_array().ok_or_else(|| invalid_value(type_name, value))?;

        if let ArrayLength::Fixed(expected) = length {
            if items.len() != expected {
                return Err(Eip712Error::ArrayLengthMismatch {
                    type_name: type_name.to_string(),
                    expected,
                    actual: items.len(),
                });
            }
        }

        let mut encoded = Vec::with_capacity(32 * items.len());
        for item in items {
            encoded.extend_from_slice(&self.encode_field(element_type, item, depth + 1)?);
        }

        Ok(keccak256(&encoded))
    }

    /// Encode an atomic (fixed-size) value
    fn encode_atomic(&self, type_name: &str, value: &Value) -> Result<[u8; 32], Eip712Error> {
        let mut result = [0u8; 32];

        // address - 20 bytes, left-padded to 32
        if type_name == "address" {
            let addr = value.as_str().ok_or_else(|| invalid_value(type_name, value))?;
            result[12..].copy_from_slice(&parse_address(addr)?);
            return Ok(result);
        }

        if type_name == "bool" {
            let b = value.as_bool().ok_or_else(|| invalid_value(type_name, value))?;
            result[31] = u8::from(b);
            return Ok(result);
        }

        if let Some((signed, bits)) = integer_width(type_name) {
            let (negative, magnitude) = parse_integer(type_name, value, self.settings.accept_hex_integers)?;
            check_integer_range(type_name, value, signed, bits, negative, magnitude)?;

            let word = if negative {
                // 256-bit two's complement; sign extension is implicit
                (!magnitude).overflowing_add(U256::one()).0
            } else {
                magnitude
            };
            word.to_big_endian(&mut result);
            return Ok(result);
        }

        // bytesN: exactly N bytes, right-padded into the slot
        if let Some(size) = fixed_bytes_size(type_name) {
            let bytes = parse_bytes(type_name, value)?;
            if bytes.len() != size {
                return Err(Eip712Error::InvalidPrimitiveEncoding {
                    type_name: type_name.to_string(),
                    reason: format!("expected {} bytes, got {}", size, bytes.len()),
                });
            }
            result[..size].copy_from_slice(&bytes);
            return Ok(result);
        }

        Err(Eip712Error::UnknownType(type_name.to_string()))
    }
}

fn invalid_value(type_name: &str, value: &Value) -> Eip712Error {
    Eip712Error::InvalidValue {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}

fn invalid_encoding(type_name: &str, reason: impl Into<String>) -> Eip712Error {
    Eip712Error::InvalidPrimitiveEncoding {
        type_name: type_name.to_string(),
        reason: reason.into(),
    }
}

/// Parse an Ethereum address
pub fn parse_address(addr: &str) -> Result<[u8; 20], Eip712Error> {
    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);

    if digits.len() != 40 {
        return Err(invalid_encoding(
            "address",
            format!("invalid length: expected 40 hex chars, got {}", digits.len()),
        ));
    }

    let bytes = hex::decode(digits).map_err(|e| invalid_encoding("address", format!("invalid hex: {}", e)))?;

    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Parse a byte value: hex string (with or without 0x) or an array of byte numbers
fn parse_bytes(type_name: &str, value: &Value) -> Result<Vec<u8>, Eip712Error> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
            hex::decode(digits).map_err(|e| invalid_encoding(type_name, format!("invalid hex: {}", e)))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| invalid_encoding(type_name, format!("not a byte: {}", item)))
            })
            .collect(),
        _ => Err(invalid_value(type_name, value)),
    }
}

/// Parse an integer into (is_negative, magnitude).
///
/// Accepts JSON integers, decimal strings and (optionally) 0x hex strings.
fn parse_integer(type_name: &str, value: &Value, accept_hex: bool) -> Result<(bool, U256), Eip712Error> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok((false, U256::from(u)));
            }
            if let Some(i) = n.as_i64() {
                return Ok((i < 0, U256::from(i.unsigned_abs())));
            }
            // Floats never carry amounts
            Err(invalid_encoding(type_name, format!("not an integer: {}", n)))
        }
        Value::String(s) => {
            let (negative, unsigned) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s.as_str()),
            };

            let magnitude = match unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
                Some(hex_digits) => {
                    if !accept_hex {
                        return Err(invalid_encoding(type_name, "hex integers are disabled"));
                    }
                    parse_hex_magnitude(type_name, value, hex_digits)?
                }
                None => {
                    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(invalid_encoding(type_name, format!("not a decimal integer: {}", s)));
                    }
                    // Digits are valid, so the only failure left is overflow
                    U256::from_dec_str(unsigned).map_err(|_| out_of_range(type_name, value))?
                }
            };

            Ok((negative && !magnitude.is_zero(), magnitude))
        }
        _ => Err(invalid_value(type_name, value)),
    }
}

fn parse_hex_magnitude(type_name: &str, value: &Value, digits: &str) -> Result<U256, Eip712Error> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid_encoding(type_name, format!("not a hex integer: {}", value)));
    }

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(U256::zero());
    }
    if significant.len() > 64 {
        return Err(out_of_range(type_name, value));
    }

    U256::from_str_radix(significant, 16).map_err(|_| invalid_encoding(type_name, format!("not a hex integer: {}", value)))
}

fn check_integer_range(
    type_name: &str,
    value: &Value,
    signed: bool,
    bits: u32,
    negative: bool,
    magnitude: U256,
) -> Result<(), Eip712Error> {
    let fits = if !signed {
        !negative && magnitude.bits() <= bits as usize
    } else {
        let limit = U256::one() << (bits as usize - 1);
        if negative {
            magnitude <= limit
        } else {
            magnitude < limit
        }
    };

    if fits {
        Ok(())
    } else {
        Err(out_of_range(type_name, value))
    }
}

fn out_of_range(type_name: &str, value: &Value) -> Eip712Error {
    Eip712Error::IntegerOutOfRange {
        type_name: type_name.to_string(),
        value: value.to_string(),
    }
}
