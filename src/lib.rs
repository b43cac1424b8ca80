//! # tokpack - postings payload codec
//!
//! tokpack stores per-token positional metadata (position shape, character
//! offsets, a secondary "real" offset, a parent-token link and an opaque
//! payload) as a compact byte sequence attached to postings in an inverted
//! index.
//!
//! ## Architecture
//!
//! - [`codec`] - Bit I/O, Elias-gamma integers, token record encode/decode
//! - [`postings`] - Framing of many encoded records into one payload block
//! - [`output`] - Terminal formatting for the CLI
//! - [`utils`] - Configuration, byte varints, hex
//!
//! ## Quick Start
//!
//! ```
//! use tokpack::codec::{EncodingMask, TokenCodec, TokenRecord};
//!
//! let codec = TokenCodec::new(EncodingMask::OFFSET | EncodingMask::PAYLOAD);
//! let record = TokenRecord::new(7)
//!     .with_set(vec![5, 9, 12])
//!     .with_offset(40, 44)
//!     .with_payload(b"NN".to_vec());
//!
//! // The start position comes from the index's position stream
//! let bytes = codec.encode(&record, 5).unwrap();
//! assert_eq!(codec.decode(&bytes, 5).unwrap(), record);
//! ```
//!
//! ## Contract with the index
//!
//! The encoded bytes carry neither the start position nor the encoding
//! mask. The index must hand the decoder the same start position it used at
//! encode time; a different one silently shifts the decoded positions.

pub mod codec;
pub mod output;
pub mod postings;
pub mod utils;
