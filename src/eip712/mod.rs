//! EIP-712 Typed Data Hashing
//!
//! Implementation of EIP-712 typed structured data hashing, plus a thin
//! secp256k1 adapter for signing and verifying the resulting digest.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use eip712_digest::eip712::{TypedData, get_pre_image};
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let pre_image = get_pre_image(&typed_data)?;
//! println!("{}", pre_image.digest);
//! ```

pub mod types;
pub mod registry;
pub mod encoder;
pub mod hasher;
pub mod signer;

pub use types::*;
pub use registry::*;
pub use encoder::*;
pub use hasher::*;
pub use signer::*;
