//! Packet field definitions.

use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};

/// Scalar type tag for a packet field.
///
/// Serialized as its integer discriminant (0..=11) to stay bit-compatible
/// with stored packet definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FieldType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Hex,
}

impl FieldType {
    /// Returns the byte width a chained run of this type must cover.
    ///
    /// `String` and `Hex` return 0: they impose no fixed-width constraint.
    pub const fn width(&self) -> usize {
        match self {
            FieldType::Int8 | FieldType::UInt8 => 1,
            FieldType::Int16 | FieldType::UInt16 => 2,
            FieldType::Int32 | FieldType::UInt32 | FieldType::Float32 => 4,
            FieldType::Int64 | FieldType::UInt64 | FieldType::Float64 => 8,
            FieldType::String | FieldType::Hex => 0,
        }
    }
}

impl From<FieldType> for u8 {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Int8 => 0,
            FieldType::Int16 => 1,
            FieldType::Int32 => 2,
            FieldType::Int64 => 3,
            FieldType::UInt8 => 4,
            FieldType::UInt16 => 5,
            FieldType::UInt32 => 6,
            FieldType::UInt64 => 7,
            FieldType::Float32 => 8,
            FieldType::Float64 => 9,
            FieldType::String => 10,
            FieldType::Hex => 11,
        }
    }
}

impl TryFrom<u8> for FieldType {
    type Error = HarnessError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(FieldType::Int8),
            1 => Ok(FieldType::Int16),
            2 => Ok(FieldType::Int32),
            3 => Ok(FieldType::Int64),
            4 => Ok(FieldType::UInt8),
            5 => Ok(FieldType::UInt16),
            6 => Ok(FieldType::UInt32),
            7 => Ok(FieldType::UInt64),
            8 => Ok(FieldType::Float32),
            9 => Ok(FieldType::Float64),
            10 => Ok(FieldType::String),
            11 => Ok(FieldType::Hex),
            tag => Err(HarnessError::UnsupportedType { tag }),
        }
    }
}

/// One element of a packet layout.
///
/// A field always contributes exactly one literal byte at `offset`. Wide
/// values are represented by runs of adjacent fields with `is_chained` set,
/// which the codec validates and decodes as one little-endian scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub offset: usize,
    pub value: i8,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub is_chained: bool,
    #[serde(default)]
    pub desc: String,
}

impl FieldSpec {
    /// Build a standalone (non-chained) field.
    pub fn literal(offset: usize, value: i8, field_type: FieldType) -> Self {
        Self { offset, value, field_type, is_chained: false, desc: String::new() }
    }

    /// Build one byte of a chained run.
    pub fn chained(offset: usize, value: i8, field_type: FieldType) -> Self {
        Self { offset, value, field_type, is_chained: true, desc: String::new() }
    }
}
