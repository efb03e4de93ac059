//! Offset-addressed packet codec.
//!
//! A packet layout is a flat list of [`FieldSpec`]s, each contributing one
//! literal byte at its offset. Multi-byte scalars are spelled as runs of
//! adjacent fields flagged `is_chained`; [`validate`] checks those runs
//! against the width of the run's first type, [`encode`] lays the bytes into
//! a zero-filled buffer, and [`decode_scalar`] turns a chained byte run back
//! into its little-endian textual value.
//!
//! This is byte placement, not a structural serializer: offsets address the
//! buffer directly and gaps stay zero.

use crate::types::{FieldSpec, FieldType};
use crate::{HarnessError, Result};

/// Check the chain-adjacency rules of a field list.
///
/// Fields are examined in offset order. Every maximal run of consecutive
/// offsets all flagged chained must cover exactly the byte width of the
/// run's first type; a run of the wrong length fails with
/// [`HarnessError::ChainLengthMismatch`] naming the run's first offset.
/// `String` and `Hex` runs are unconstrained, as are non-chained fields.
pub fn validate(fields: &[FieldSpec]) -> Result<()> {
    let mut sorted: Vec<&FieldSpec> = fields.iter().collect();
    sorted.sort_by_key(|field| field.offset);

    let mut i = 0;
    while i < sorted.len() {
        let first = sorted[i];
        if !first.is_chained {
            i += 1;
            continue;
        }

        let mut j = i;
        while j + 1 < sorted.len()
            && sorted[j + 1].is_chained
            && sorted[j + 1].offset == sorted[j].offset + 1
        {
            j += 1;
        }

        let expected = first.field_type.width();
        let actual = j - i + 1;
        if expected != 0 && actual != expected {
            return Err(HarnessError::ChainLengthMismatch {
                offset: first.offset,
                expected,
                actual,
            });
        }
        i = j + 1;
    }
    Ok(())
}

/// Serialize a field list into raw bytes.
///
/// The buffer spans offset 0 through the maximum offset present; unaddressed
/// slots stay zero. An empty field list encodes to an empty buffer. Fields
/// sharing an offset overwrite in input order; that is not an error, the
/// chain rules in [`validate`] make it rare in practice.
pub fn encode(fields: &[FieldSpec]) -> Vec<u8> {
    if fields.is_empty() {
        return Vec::new();
    }
    let max_offset = fields.iter().map(|field| field.offset).max().unwrap_or(0);
    let mut buf = vec![0u8; max_offset + 1];
    for field in fields {
        buf[field.offset] = field.value as u8;
    }
    buf
}

/// Render a chained byte run as the textual value of `field_type`.
///
/// Fixed-width types read their width in little-endian order and ignore any
/// trailing bytes; `String` passes the bytes through as UTF-8 (lossy) and
/// `Hex` renders lowercase hex. Fails with
/// [`HarnessError::InsufficientBytes`] when the run is shorter than the
/// type's width.
pub fn decode_scalar(field_type: FieldType, bytes: &[u8]) -> Result<String> {
    let width = field_type.width();
    if bytes.len() < width {
        return Err(HarnessError::InsufficientBytes { needed: width, got: bytes.len() });
    }

    let text = match field_type {
        FieldType::Int8 => (bytes[0] as i8).to_string(),
        FieldType::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]).to_string(),
        FieldType::Int32 => {
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]).to_string()
        }
        FieldType::Int64 => i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
        .to_string(),
        FieldType::UInt8 => bytes[0].to_string(),
        FieldType::UInt16 => u16::from_le_bytes([bytes[0], bytes[1]]).to_string(),
        FieldType::UInt32 => {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]).to_string()
        }
        FieldType::UInt64 => u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
        .to_string(),
        FieldType::Float32 => {
            format!("{:.6}", f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        FieldType::Float64 => format!(
            "{:.6}",
            f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])
        ),
        FieldType::String => String::from_utf8_lossy(bytes).into_owned(),
        FieldType::Hex => hex::encode(bytes),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSpec;

    fn chained(offset: usize, field_type: FieldType) -> FieldSpec {
        FieldSpec::chained(offset, 0, field_type)
    }

    #[test]
    fn complete_chain_passes() {
        let fields =
            vec![chained(0, FieldType::UInt16), chained(1, FieldType::UInt16)];
        validate(&fields).expect("run of 2 matches u16 width");
    }

    #[test]
    fn short_chain_names_first_offset() {
        let fields = vec![chained(0, FieldType::UInt16)];
        match validate(&fields) {
            Err(HarnessError::ChainLengthMismatch { offset, expected, actual }) => {
                assert_eq!(offset, 0);
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected chain error, got {other:?}"),
        }
    }

    #[test]
    fn width_comes_from_the_first_field() {
        // First field says u32, so the run must be 4 long even though the
        // trailing bytes carry a different tag.
        let fields = vec![
            chained(4, FieldType::UInt32),
            chained(5, FieldType::UInt8),
            chained(6, FieldType::UInt8),
        ];
        match validate(&fields) {
            Err(HarnessError::ChainLengthMismatch { offset, expected, actual }) => {
                assert_eq!((offset, expected, actual), (4, 4, 3));
            }
            other => panic!("expected chain error, got {other:?}"),
        }
    }

    #[test]
    fn gap_splits_runs() {
        // Offsets 0 and 2 are both chained but not adjacent: two runs of 1.
        let fields = vec![chained(0, FieldType::UInt8), chained(2, FieldType::UInt8)];
        validate(&fields).expect("u8 runs of 1 are complete");
    }

    #[test]
    fn unsorted_input_is_sorted_before_checking() {
        let fields =
            vec![chained(1, FieldType::UInt16), chained(0, FieldType::UInt16)];
        validate(&fields).expect("order on input does not matter");
    }

    #[test]
    fn string_and_hex_runs_are_unconstrained() {
        for field_type in [FieldType::String, FieldType::Hex] {
            let fields: Vec<_> = (0..5).map(|off| chained(off, field_type)).collect();
            validate(&fields).expect("no width constraint");
        }
    }

    #[test]
    fn non_chained_fields_are_never_constrained() {
        let fields = vec![
            FieldSpec::literal(0, 1, FieldType::UInt64),
            FieldSpec::literal(1, 2, FieldType::Float32),
        ];
        validate(&fields).expect("literals carry no chain rule");
    }

    #[test]
    fn encode_zero_fills_gaps() {
        let fields = vec![
            FieldSpec::literal(0, 1, FieldType::UInt8),
            FieldSpec::literal(2, 5, FieldType::UInt8),
        ];
        assert_eq!(encode(&fields), vec![0x01, 0x00, 0x05]);
    }

    #[test]
    fn encode_empty_list_is_empty() {
        assert_eq!(encode(&[]), Vec::<u8>::new());
    }

    #[test]
    fn encode_later_fields_overwrite() {
        let fields = vec![
            FieldSpec::literal(0, 1, FieldType::UInt8),
            FieldSpec::literal(0, 9, FieldType::UInt8),
        ];
        assert_eq!(encode(&fields), vec![0x09]);
    }

    #[test]
    fn encode_negative_values_keep_their_bits() {
        let fields = vec![FieldSpec::literal(0, -1, FieldType::Int8)];
        assert_eq!(encode(&fields), vec![0xFF]);
    }

    #[test]
    fn decode_integers() {
        assert_eq!(decode_scalar(FieldType::UInt16, &[0x01, 0x00]).unwrap(), "1");
        assert_eq!(decode_scalar(FieldType::Int8, &[0xFF]).unwrap(), "-1");
        assert_eq!(
            decode_scalar(FieldType::Int32, &[0xFF, 0xFF, 0xFF, 0xFF]).unwrap(),
            "-1"
        );
        assert_eq!(
            decode_scalar(FieldType::UInt64, &[0xFF; 8]).unwrap(),
            u64::MAX.to_string()
        );
    }

    #[test]
    fn decode_floats_fixed_point() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(decode_scalar(FieldType::Float32, &bytes).unwrap(), "1.500000");
        let bytes = (-0.25f64).to_le_bytes();
        assert_eq!(decode_scalar(FieldType::Float64, &bytes).unwrap(), "-0.250000");
    }

    #[test]
    fn decode_string_and_hex() {
        assert_eq!(decode_scalar(FieldType::String, b"edge").unwrap(), "edge");
        assert_eq!(decode_scalar(FieldType::Hex, &[0xAB, 0x01]).unwrap(), "ab01");
    }

    #[test]
    fn decode_short_run_fails() {
        match decode_scalar(FieldType::UInt32, &[0x01, 0x02]) {
            Err(HarnessError::InsufficientBytes { needed, got }) => {
                assert_eq!((needed, got), (4, 2));
            }
            other => panic!("expected insufficient bytes, got {other:?}"),
        }
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        assert_eq!(
            decode_scalar(FieldType::UInt16, &[0x02, 0x00, 0xFF, 0xFF]).unwrap(),
            "2"
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn chained_u32_roundtrips_through_encode(value in any::<u32>()) {
                let fields: Vec<_> = value
                    .to_le_bytes()
                    .iter()
                    .enumerate()
                    .map(|(offset, &byte)| {
                        FieldSpec::chained(offset, byte as i8, FieldType::UInt32)
                    })
                    .collect();

                validate(&fields).unwrap();
                let encoded = encode(&fields);
                prop_assert_eq!(
                    decode_scalar(FieldType::UInt32, &encoded).unwrap(),
                    value.to_string()
                );
            }

            #[test]
            fn encode_length_tracks_max_offset(
                offsets in proptest::collection::vec(0usize..128, 1..16)
            ) {
                let fields: Vec<_> = offsets
                    .iter()
                    .map(|&offset| FieldSpec::literal(offset, 1, FieldType::UInt8))
                    .collect();
                let encoded = encode(&fields);
                prop_assert_eq!(encoded.len(), offsets.iter().max().unwrap() + 1);
            }
        }
    }
}
