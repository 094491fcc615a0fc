use clap::{Parser, Subcommand};
use eip712_digest::eip712::{
    encode_type, get_pre_image_with, type_hash, AddressVerifier, DigestSigner, DigestVerifier,
    Eip712Signature, LocalKeySigner, PublicKeyVerifier, TypedData,
};
use eip712_digest::utils::logging;
use eip712_digest::{log_debug, log_error, log_info, log_warn};
use eip712_digest::{HasherSettings, ToolError, ToolResult};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

const MODULE: &str = "cli";

/// Compute and check EIP-712 typed-data digests
#[derive(Parser, Debug)]
#[command(name = "eip712-digest", version, about)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print domain separator, struct hash and digest
    Hash {
        /// Typed-data JSON file, or `-` for stdin
        input: String,
    },
    /// Print the canonical type string and type hash
    EncodeType {
        /// Typed-data JSON file, or `-` for stdin
        input: String,
        /// Type to encode (defaults to the primary type)
        #[arg(long = "type")]
        type_name: Option<String>,
    },
    /// Sign the digest with a private key taken from the environment
    Sign {
        /// Typed-data JSON file, or `-` for stdin
        input: String,
        /// Environment variable holding the hex private key
        #[arg(long, default_value = "EIP712_PRIVATE_KEY")]
        key_env: String,
    },
    /// Verify a 65-byte signature over the digest
    Verify {
        /// Typed-data JSON file, or `-` for stdin
        input: String,
        /// Hex signature (r || s || v)
        #[arg(long)]
        signature: String,
        /// Expected signer address
        #[arg(long, required_unless_present = "public_key", conflicts_with = "public_key")]
        address: Option<String>,
        /// Signer public key (SEC1, hex)
        #[arg(long)]
        public_key: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        logging::enable_debug();
    }

    match run(&cli.command) {
        Ok((output, success)) => {
            println!("{}", pretty(&output));
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            log_error!(MODULE, "Command failed", code = format!("{:?}", err.code));
            println!("{}", pretty(&json!({ "error": err })));
            ExitCode::FAILURE
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn run(command: &Command) -> ToolResult<(Value, bool)> {
    let settings = HasherSettings::from_env()?;
    for warning in settings.warnings() {
        log_warn!(MODULE, warning);
    }

    match command {
        Command::Hash { input } => {
            let typed_data = load_typed_data(input)?;
            let pre_image = get_pre_image_with(&typed_data, &settings)?;
            log_debug!(MODULE, "Hashed typed data", primary_type = typed_data.primary_type);

            Ok((
                json!({
                    "domainSeparator": pre_image.domain_separator_hex(),
                    "structHash": pre_image.struct_hash_hex(),
                    "digest": pre_image.digest,
                }),
                true,
            ))
        }
        Command::EncodeType { input, type_name } => {
            let typed_data = load_typed_data(input)?;
            let name = type_name.as_deref().unwrap_or(&typed_data.primary_type);
            let encoded = encode_type(name, &typed_data.types)?;
            let hash = type_hash(name, &typed_data.types)?;

            Ok((
                json!({
                    "type": name,
                    "encodeType": encoded,
                    "typeHash": format!("0x{}", hex::encode(hash)),
                }),
                true,
            ))
        }
        Command::Sign { input, key_env } => {
            let typed_data = load_typed_data(input)?;
            let private_key = std::env::var(key_env)
                .map(SecretString::from)
                .map_err(|_| ToolError::invalid_input(format!("{} is not set", key_env)))?;
            let signer = LocalKeySigner::from_hex(private_key.expose_secret())?;

            let digest = get_pre_image_with(&typed_data, &settings)?.digest;
            let signature = signer.sign_digest(&digest)?;
            log_info!(MODULE, "Signed typed data", digest = digest, signer = signer.address());

            Ok((
                json!({
                    "digest": digest,
                    "signature": signature.to_hex(),
                    "signer": signer.address(),
                }),
                true,
            ))
        }
        Command::Verify {
            input,
            signature,
            address,
            public_key,
        } => {
            let typed_data = load_typed_data(input)?;
            let signature = Eip712Signature::from_hex(signature)?;
            let digest = get_pre_image_with(&typed_data, &settings)?.digest;

            let verifier: Box<dyn DigestVerifier> = match (address, public_key) {
                (_, Some(key)) => Box::new(PublicKeyVerifier::from_hex(key)?),
                (Some(addr), None) => Box::new(AddressVerifier::new(addr)),
                (None, None) => {
                    return Err(ToolError::invalid_input("either --address or --public-key is required"))
                }
            };
            let valid = verifier.verify_digest(&digest, &signature)?;
            if !valid {
                log_warn!(MODULE, "Signature does not match", digest = digest);
            }

            Ok((json!({ "digest": digest, "valid": valid }), valid))
        }
    }
}

fn load_typed_data(input: &str) -> ToolResult<TypedData> {
    let payload = if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)
            .map_err(|e| ToolError::invalid_input(format!("cannot read {}", input)).with_details(e.to_string()))?
    };

    Ok(TypedData::from_json(&payload)?)
}
