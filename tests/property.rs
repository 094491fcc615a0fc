use eip712_digest::eip712::encode_field;
use eip712_digest::{
    get_pre_image, keccak256, to_checksum_address, Eip712Error, HasherSettings, TypeRegistry,
    TypedData, TypedDataField,
};
use ethers_core::types::U256;
use proptest::prelude::*;
use serde_json::{json, Value};

fn mail_envelope(name: &str, contents: &str, amount: u64, chain_id: u64) -> Value {
    json!({
        "types": {
            "Person": [
                {"name": "name", "type": "string"},
                {"name": "wallet", "type": "address"}
            ],
            "Mail": [
                {"name": "from", "type": "Person"},
                {"name": "to", "type": "Person"},
                {"name": "contents", "type": "string"},
                {"name": "amount", "type": "uint256"}
            ]
        },
        "primaryType": "Mail",
        "domain": {
            "name": name,
            "version": "1",
            "chainId": chain_id,
            "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
        },
        "message": {
            "from": {"name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"},
            "to": {"name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"},
            "contents": contents,
            "amount": amount.to_string()
        }
    })
}

fn typed_data(envelope: &Value) -> TypedData {
    serde_json::from_value(envelope.clone()).expect("envelope parses")
}

fn uint_max(bits: u32) -> U256 {
    if bits == 256 {
        U256::MAX
    } else {
        (U256::one() << bits) - U256::one()
    }
}

fn settings() -> HasherSettings {
    HasherSettings::standard()
}

proptest! {
    #[test]
    fn digest_is_deterministic(
        name in "[a-zA-Z ]{0,24}",
        contents in ".{0,64}",
        amount in any::<u64>(),
        chain_id in 1u64..100_000,
    ) {
        let envelope = mail_envelope(&name, &contents, amount, chain_id);
        let first = get_pre_image(&typed_data(&envelope)).expect("hashes");
        let second = get_pre_image(&typed_data(&envelope)).expect("hashes");

        prop_assert_eq!(first.digest, second.digest);
        prop_assert_eq!(first.domain_separator, second.domain_separator);
        prop_assert_eq!(first.struct_hash, second.struct_hash);
    }

    #[test]
    fn unused_types_do_not_change_hashes(extra_name in "Z[a-z]{1,12}", extra_field in "[a-z]{1,12}") {
        let envelope = mail_envelope("Ether Mail", "Hello, Bob!", 7, 1);
        let baseline = get_pre_image(&typed_data(&envelope)).expect("hashes");

        let mut widened = typed_data(&envelope);
        widened
            .types
            .insert(extra_name, vec![TypedDataField::new(extra_field, "uint256")]);
        let pre_image = get_pre_image(&widened).expect("hashes");

        prop_assert_eq!(baseline.digest, pre_image.digest);
        prop_assert_eq!(baseline.struct_hash, pre_image.struct_hash);
    }

    #[test]
    fn changing_a_leaf_changes_the_digest(amount in any::<u64>(), delta in 1u64..1_000) {
        let original = mail_envelope("Ether Mail", "Hello, Bob!", amount, 1);
        let altered = mail_envelope("Ether Mail", "Hello, Bob!", amount.wrapping_add(delta), 1);

        let a = get_pre_image(&typed_data(&original)).expect("hashes");
        let b = get_pre_image(&typed_data(&altered)).expect("hashes");

        prop_assert_eq!(a.domain_separator, b.domain_separator);
        prop_assert_ne!(a.struct_hash, b.struct_hash);
        prop_assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn domain_key_order_is_irrelevant(chain_id in any::<u32>(), rotate in 0usize..4) {
        let mut entries = vec![
            "\"name\":\"Ether Mail\"".to_string(),
            "\"version\":\"1\"".to_string(),
            format!("\"chainId\":{}", chain_id),
            "\"verifyingContract\":\"0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC\"".to_string(),
        ];
        let canonical = format!("{{{}}}", entries.join(","));
        entries.rotate_left(rotate);
        let permuted = format!("{{{}}}", entries.join(","));

        let envelope = |domain: &str| {
            format!(
                r#"{{"types":{{"Note":[{{"name":"body","type":"string"}}]}},"primaryType":"Note","domain":{},"message":{{"body":"hi"}}}}"#,
                domain
            )
        };

        let a = get_pre_image(&TypedData::from_json(&envelope(&canonical)).expect("parses")).expect("hashes");
        let b = get_pre_image(&TypedData::from_json(&envelope(&permuted)).expect("parses")).expect("hashes");
        prop_assert_eq!(a.domain_separator, b.domain_separator);
        prop_assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn uint_bounds_are_enforced(width in 1u32..=32) {
        let bits = width * 8;
        let type_name = format!("uint{}", bits);
        let registry = TypeRegistry::new();
        let max = uint_max(bits);

        let slot = encode_field(&type_name, &json!(max.to_string()), &registry, &settings())
            .expect("maximum is accepted");
        let mut expected = [0u8; 32];
        max.to_big_endian(&mut expected);
        prop_assert_eq!(slot, expected);

        if bits < 256 {
            let over = max + U256::one();
            let result = encode_field(&type_name, &json!(over.to_string()), &registry, &settings());
            let out_of_range = matches!(result, Err(Eip712Error::IntegerOutOfRange { .. }));
            prop_assert!(out_of_range);
        }

        let negative = encode_field(&type_name, &json!(-1), &registry, &settings());
        let rejected = matches!(negative, Err(Eip712Error::IntegerOutOfRange { .. }));
        prop_assert!(rejected);
    }

    #[test]
    fn int_bounds_are_enforced(width in 1u32..=32) {
        let bits = width * 8;
        let type_name = format!("int{}", bits);
        let registry = TypeRegistry::new();
        let limit = U256::one() << (bits - 1);

        let min = encode_field(&type_name, &json!(format!("-{}", limit)), &registry, &settings())
            .expect("minimum is accepted");
        // Two's complement of the minimum: leading ones, then the sign bit
        prop_assert_eq!(min[0] & 0x80, 0x80);

        let max = limit - U256::one();
        encode_field(&type_name, &json!(max.to_string()), &registry, &settings())
            .expect("maximum is accepted");

        let over = encode_field(&type_name, &json!(limit.to_string()), &registry, &settings());
        let over_rejected = matches!(over, Err(Eip712Error::IntegerOutOfRange { .. }));
        prop_assert!(over_rejected);

        let under = encode_field(
            &type_name,
            &json!(format!("-{}", limit + U256::one())),
            &registry,
            &settings(),
        );
        let under_rejected = matches!(under, Err(Eip712Error::IntegerOutOfRange { .. }));
        prop_assert!(under_rejected);
    }

    #[test]
    fn negative_one_is_all_ones(width in 1u32..=32) {
        let type_name = format!("int{}", width * 8);
        let slot = encode_field(&type_name, &json!(-1), &TypeRegistry::new(), &settings())
            .expect("-1 fits every signed width");
        prop_assert_eq!(slot, [0xff; 32]);
    }

    #[test]
    fn checksum_addresses_roundtrip(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));

        let tail = checksummed.trim_start_matches("0x");
        let lower_expected = hex::encode(bytes);
        let lower_tail = tail.to_ascii_lowercase();
        prop_assert_eq!(lower_tail.as_str(), lower_expected.as_str());

        let hash = keccak256(lower_expected.as_bytes());
        let mut expected = String::from("0x");
        for (i, ch) in lower_expected.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if ch.is_ascii_digit() || nibble < 8 {
                expected.push(ch);
            } else {
                expected.push(ch.to_ascii_uppercase());
            }
        }
        prop_assert_eq!(checksummed, expected);
    }

    #[test]
    fn address_slots_ignore_checksum_casing(bytes in prop::array::uniform20(any::<u8>())) {
        let registry = TypeRegistry::new();
        let checksummed = to_checksum_address(&bytes);
        let lower = checksummed.to_ascii_lowercase();

        let a = encode_field("address", &json!(checksummed), &registry, &settings()).expect("encodes");
        let b = encode_field("address", &json!(lower), &registry, &settings()).expect("encodes");
        prop_assert_eq!(a, b);
        prop_assert_eq!(&a[12..], &bytes[..]);
        prop_assert_eq!(&a[..12], &[0u8; 12][..]);
    }
}
