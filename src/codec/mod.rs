//! Bit-level codec for per-token postings payloads.
//!
//! Layers, leaves first:
//!
//! - [`bits`] - [`BitWriter`] / [`BitReader`], LSB-first bit packing over byte buffers
//! - [`gamma`] - Elias-gamma integers (positive, non-negative, signed)
//! - [`record`] - The [`TokenRecord`] data model and [`EncodingMask`]
//! - [`token`] - Record encode/decode ([`encode`], [`decode`], [`TokenCodec`])
//!
//! ```
//! use tokpack::codec::{decode, encode, EncodingMask, TokenRecord};
//!
//! let record = TokenRecord::new(50)
//!     .with_range(3)
//!     .with_offset(100, 110)
//!     .with_parent(47);
//!
//! let bytes = encode(&record, EncodingMask::ALL, 10).unwrap();
//! let decoded = decode(&bytes, 10).unwrap();
//! assert_eq!(decoded, record);
//! assert_eq!(decoded.positions.resolve(10), vec![10, 11, 12]);
//! ```

pub mod bits;
pub mod error;
pub mod gamma;
pub mod record;
pub mod token;

pub use bits::{BitReader, BitWriter};
pub use error::{CodecError, Result};
pub use record::{
    EncodingMask, ParseMaskError, Position, PositionKind, Positions, RecordId, RecordKind, Span,
    TokenRecord,
};
pub use token::{decode, decode_header, encode, Header, TokenCodec};
