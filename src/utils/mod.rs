//! Utility functions shared by the library and the CLI.
//!
//! ## Modules
//!
//! - [`app_data`] - Codec configuration file (platform config directory)
//! - [`encoding`] - Byte-level varints for block framing, hex text
//!
//! ```
//! use tokpack::utils::{parse_hex, to_hex};
//!
//! let bytes = parse_hex("0x01 19").unwrap();
//! assert_eq!(to_hex(&bytes), "0119");
//! ```

pub mod app_data;
pub mod encoding;

pub use app_data::*;
pub use encoding::*;
