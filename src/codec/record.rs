use super::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a token record
pub type RecordId = u32;

/// Absolute token position within a document
pub type Position = u32;

/// Shape of a record's position descriptor.
///
/// Positions are relative to the start position the index assigns to the
/// posting; that start position is never stored in the encoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Positions {
    /// Exactly the start position
    #[default]
    Single,
    /// Contiguous span `[start, start + length - 1]`
    Range { length: u32 },
    /// Explicit ascending positions; the first equals the start position
    Set { positions: Vec<Position> },
    /// No position information
    None,
}

/// Header discriminator for [`Positions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    Single,
    Range,
    Set,
    None,
}

impl PositionKind {
    /// Header bit pair, in write order
    pub fn to_bits(self) -> (bool, bool) {
        match self {
            PositionKind::Single => (false, false),
            PositionKind::Range => (true, false),
            PositionKind::Set => (false, true),
            PositionKind::None => (true, true),
        }
    }

    pub fn from_bits(first: bool, second: bool) -> Self {
        match (first, second) {
            (false, false) => PositionKind::Single,
            (true, false) => PositionKind::Range,
            (false, true) => PositionKind::Set,
            (true, true) => PositionKind::None,
        }
    }
}

impl Positions {
    pub fn kind(&self) -> PositionKind {
        match self {
            Positions::Single => PositionKind::Single,
            Positions::Range { .. } => PositionKind::Range,
            Positions::Set { .. } => PositionKind::Set,
            Positions::None => PositionKind::None,
        }
    }

    /// Absolute positions covered, given the posting's start position
    pub fn resolve(&self, start: Position) -> Vec<Position> {
        match self {
            Positions::Single => vec![start],
            Positions::Range { length } => (0..*length).map(|i| start.saturating_add(i)).collect(),
            Positions::Set { positions } => positions.clone(),
            Positions::None => Vec::new(),
        }
    }

    /// First and last position covered
    pub fn bounds(&self, start: Position) -> Option<(Position, Position)> {
        match self {
            Positions::Single => Some((start, start)),
            Positions::Range { length } if *length > 0 => {
                Some((start, start.saturating_add(length - 1)))
            }
            Positions::Range { .. } => None,
            Positions::Set { positions } => Some((*positions.first()?, *positions.last()?)),
            Positions::None => None,
        }
    }
}

/// Inclusive character-offset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of characters covered (`end - start + 1`)
    pub fn len(&self) -> u64 {
        self.end as u64 - self.start as u64 + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Record shape discriminator (one header bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    PlainToken,
    /// Reserved for future record shapes; not encodable or decodable
    Reserved,
}

/// Per-token positional metadata attached to a posting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenRecord {
    pub id: RecordId,
    #[serde(default)]
    pub positions: Positions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_offset: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
    #[serde(default)]
    pub kind: RecordKind,
}

impl TokenRecord {
    /// A plain token at a single position with no optional fields
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, length: u32) -> Self {
        self.positions = Positions::Range { length };
        self
    }

    pub fn with_set(mut self, positions: Vec<Position>) -> Self {
        self.positions = Positions::Set { positions };
        self
    }

    pub fn unpositioned(mut self) -> Self {
        self.positions = Positions::None;
        self
    }

    pub fn with_offset(mut self, start: u32, end: u32) -> Self {
        self.offset = Some(Span::new(start, end));
        self
    }

    pub fn with_real_offset(mut self, start: u32, end: u32) -> Self {
        self.real_offset = Some(Span::new(start, end));
        self
    }

    pub fn with_parent(mut self, parent_id: RecordId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Check the data-model invariants against the posting's start position
    pub fn validate(&self, start: Position) -> Result<()> {
        match &self.positions {
            Positions::Range { length } => {
                if *length == 0 {
                    return Err(CodecError::invalid_record("range length must be >= 1"));
                }
                if start.checked_add(length - 1).is_none() {
                    return Err(CodecError::invalid_record(format!(
                        "range of length {} starting at {} overflows the position domain",
                        length, start
                    )));
                }
            }
            Positions::Set { positions } => {
                let Some(&first) = positions.first() else {
                    return Err(CodecError::invalid_record("position set must not be empty"));
                };
                if first != start {
                    return Err(CodecError::invalid_record(format!(
                        "position set starts at {} but the start position is {}",
                        first, start
                    )));
                }
                if let Some(pair) = positions.windows(2).find(|w| w[1] <= w[0]) {
                    return Err(CodecError::invalid_record(format!(
                        "position set is not strictly increasing ({} then {})",
                        pair[0], pair[1]
                    )));
                }
            }
            Positions::Single | Positions::None => {}
        }

        for (name, span) in [("offset", &self.offset), ("real offset", &self.real_offset)] {
            if let Some(span) = span {
                if span.is_empty() {
                    return Err(CodecError::invalid_record(format!(
                        "{} end {} precedes start {}",
                        name, span.end, span.start
                    )));
                }
            }
        }

        Ok(())
    }

    /// The record as it reads back after encoding with `mask`
    pub fn restricted_to(&self, mask: EncodingMask) -> TokenRecord {
        TokenRecord {
            id: self.id,
            positions: self.positions.clone(),
            offset: self.offset.filter(|_| mask.contains(EncodingMask::OFFSET)),
            real_offset: self.real_offset.filter(|_| mask.contains(EncodingMask::REAL_OFFSET)),
            parent_id: self.parent_id.filter(|_| mask.contains(EncodingMask::PARENT)),
            payload: self
                .payload
                .clone()
                .filter(|_| mask.contains(EncodingMask::PAYLOAD)),
            kind: self.kind,
        }
    }
}

/// Which optional fields the encoder may emit.
///
/// This is a pipeline-wide setting; it is not stored in the encoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingMask(pub u8);

impl EncodingMask {
    pub const NONE: EncodingMask = EncodingMask(0);
    pub const PAYLOAD: EncodingMask = EncodingMask(1 << 0);
    pub const OFFSET: EncodingMask = EncodingMask(1 << 1);
    pub const REAL_OFFSET: EncodingMask = EncodingMask(1 << 2);
    pub const PARENT: EncodingMask = EncodingMask(1 << 3);
    pub const ALL: EncodingMask = EncodingMask(0b1111);

    const NAMES: [(&'static str, EncodingMask); 4] = [
        ("payload", EncodingMask::PAYLOAD),
        ("offset", EncodingMask::OFFSET),
        ("real_offset", EncodingMask::REAL_OFFSET),
        ("parent", EncodingMask::PARENT),
    ];

    pub fn contains(self, other: EncodingMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for EncodingMask {
    fn default() -> Self {
        EncodingMask::ALL
    }
}

impl BitOr for EncodingMask {
    type Output = EncodingMask;

    fn bitor(self, rhs: EncodingMask) -> EncodingMask {
        EncodingMask(self.0 | rhs.0)
    }
}

impl fmt::Display for EncodingMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding mask field '{0}' (expected payload, offset, real_offset, parent, all or none)")]
pub struct ParseMaskError(String);

impl FromStr for EncodingMask {
    type Err = ParseMaskError;

    /// Parse `"offset|parent"`, `"offset,parent"`, `"all"` or `"none"`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut mask = EncodingMask::NONE;
        for part in s.split(['|', ',']).map(str::trim).filter(|p| !p.is_empty()) {
            let part = part.to_lowercase();
            mask = mask
                | match part.as_str() {
                    "all" => EncodingMask::ALL,
                    "none" => EncodingMask::NONE,
                    "real-offset" => EncodingMask::REAL_OFFSET,
                    name => Self::NAMES
                        .iter()
                        .find(|(n, _)| *n == name)
                        .map(|(_, flag)| *flag)
                        .ok_or_else(|| ParseMaskError(part.clone()))?,
                };
        }
        Ok(mask)
    }
}
