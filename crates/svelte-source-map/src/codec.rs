//! Base64 VLQ line table codec
//!
//! The `mappings` field of a version 3 source map is a list of generated
//! lines separated by `;`, each a list of segments separated by `,`. A
//! segment is 1, 4 or 5 base64 VLQ values. The generated column is relative
//! to the previous segment on the same line; the source index, original line,
//! original column and name index are relative to the previous segment that
//! carried them, across line boundaries.
//!
//! [`decode`] resolves all of that into absolute values. [`encode`] derives the
//! deltas again from scratch, so its input does not have to come from a single
//! decode.

use crate::error::MalformedMapError;
use crate::segment::{MappingLine, Mappings, OriginalLocation, Segment};

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_CONTINUATION_BIT: u8 = 0b10_0000;
const VLQ_DIGIT_MASK: u8 = 0b1_1111;
// Seven digits carry 35 bits, enough for a sign bit plus 32 bits of magnitude.
const VLQ_MAX_SHIFT: u32 = 30;

/// Running totals for the fields that are relative across lines
#[derive(Debug, Default)]
struct DecodeState {
    source_index: i64,
    line: i64,
    column: i64,
    name_index: i64,
}

/// Decode a `mappings` string into absolute segments.
///
/// Segments within a line that are out of generated-column order are sorted
/// (stably), so the result always satisfies the per-line ordering invariant.
/// An empty string decodes to no lines.
///
/// # Errors
///
/// Returns [`MalformedMapError`] if the string contains characters outside
/// the base64 alphabet, ends inside a VLQ value, has a segment with a field
/// count other than 1, 4 or 5, or accumulates to a negative or oversized
/// position. Empty lines are fine, but an empty segment (`AAAA,,AAAA` or a
/// trailing `,`) counts as a segment with zero fields.
pub fn decode(mappings: &str) -> Result<Mappings, MalformedMapError> {
    if mappings.is_empty() {
        return Ok(Mappings::new());
    }

    let mut decoded = Mappings::new();
    let mut state = DecodeState::default();
    let mut offset = 0;

    for line_text in mappings.split(';') {
        decoded.push(decode_line(line_text, offset, &mut state)?);
        offset += line_text.len() + 1;
    }

    Ok(decoded)
}

fn decode_line(
    text: &str,
    line_offset: usize,
    state: &mut DecodeState,
) -> Result<MappingLine, MalformedMapError> {
    let mut line = MappingLine::new();
    let mut generated_column: i64 = 0;
    let mut sorted = true;
    let mut offset = line_offset;

    if text.is_empty() {
        return Ok(line);
    }

    for segment_text in text.split(',') {
        // A stray `,` leaves a segment with no fields
        if segment_text.is_empty() {
            return Err(MalformedMapError::InvalidSegmentLength { offset, fields: 0 });
        }

        let mut fields = [0i64; 5];
        let count = read_fields(segment_text, offset, &mut fields)?;

        generated_column += fields[0];
        let column = to_u32(generated_column, "generated column", offset)?;
        if line
            .last()
            .is_some_and(|previous: &Segment| previous.generated_column > column)
        {
            sorted = false;
        }

        let original = if count == 1 {
            None
        } else {
            state.source_index += fields[1];
            state.line += fields[2];
            state.column += fields[3];
            let name_index = if count == 5 {
                state.name_index += fields[4];
                Some(to_u32(state.name_index, "name index", offset)?)
            } else {
                None
            };
            Some(OriginalLocation {
                source_index: to_u32(state.source_index, "source index", offset)?,
                line: to_u32(state.line, "original line", offset)?,
                column: to_u32(state.column, "original column", offset)?,
                name_index,
            })
        };

        line.push(Segment {
            generated_column: column,
            original,
        });
        offset += segment_text.len() + 1;
    }

    if !sorted {
        line.sort_by_key(|segment| segment.generated_column);
    }

    Ok(line)
}

fn read_fields(
    text: &str,
    offset: usize,
    fields: &mut [i64; 5],
) -> Result<usize, MalformedMapError> {
    let mut position = 0;
    let mut count = 0;

    while position < text.len() {
        let (value, next) = read_vlq(text, position, offset)?;
        if count == fields.len() {
            return Err(MalformedMapError::InvalidSegmentLength {
                offset,
                fields: count + 1,
            });
        }
        fields[count] = value;
        count += 1;
        position = next;
    }

    if !matches!(count, 1 | 4 | 5) {
        return Err(MalformedMapError::InvalidSegmentLength {
            offset,
            fields: count,
        });
    }

    Ok(count)
}

fn read_vlq(text: &str, start: usize, offset: usize) -> Result<(i64, usize), MalformedMapError> {
    let bytes = text.as_bytes();
    let mut accumulated: i64 = 0;
    let mut shift = 0;
    let mut position = start;

    loop {
        let Some(&byte) = bytes.get(position) else {
            return Err(MalformedMapError::UnterminatedValue {
                offset: offset + start,
            });
        };
        let Some(digit) = base64_value(byte) else {
            return Err(MalformedMapError::InvalidCharacter {
                character: text[position..].chars().next().unwrap_or('\u{fffd}'),
                offset: offset + position,
            });
        };
        if shift > VLQ_MAX_SHIFT {
            return Err(MalformedMapError::Overflow {
                offset: offset + start,
            });
        }

        accumulated |= i64::from(digit & VLQ_DIGIT_MASK) << shift;
        position += 1;

        if digit & VLQ_CONTINUATION_BIT == 0 {
            break;
        }
        shift += VLQ_BASE_SHIFT;
    }

    let magnitude = accumulated >> 1;
    let value = if accumulated & 1 == 1 {
        -magnitude
    } else {
        magnitude
    };

    Ok((value, position))
}

fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

fn to_u32(value: i64, field: &'static str, offset: usize) -> Result<u32, MalformedMapError> {
    if value < 0 {
        return Err(MalformedMapError::NegativeValue { field, offset });
    }
    u32::try_from(value).map_err(|_| MalformedMapError::Overflow { offset })
}

/// Encode absolute segments into a `mappings` string.
///
/// Deltas are computed from the segments themselves, so lines taken from
/// different maps (with rewritten source indices) encode correctly.
pub fn encode(lines: &[MappingLine]) -> String {
    let mut out = String::new();
    let mut source_index: i64 = 0;
    let mut original_line: i64 = 0;
    let mut original_column: i64 = 0;
    let mut name_index: i64 = 0;

    for (line_number, line) in lines.iter().enumerate() {
        if line_number > 0 {
            out.push(';');
        }

        let mut generated_column: i64 = 0;
        for (position, segment) in line.iter().enumerate() {
            if position > 0 {
                out.push(',');
            }

            let column = i64::from(segment.generated_column);
            write_vlq(&mut out, column - generated_column);
            generated_column = column;

            let Some(original) = segment.original else {
                continue;
            };

            let next_source = i64::from(original.source_index);
            write_vlq(&mut out, next_source - source_index);
            source_index = next_source;

            let next_line = i64::from(original.line);
            write_vlq(&mut out, next_line - original_line);
            original_line = next_line;

            let next_column = i64::from(original.column);
            write_vlq(&mut out, next_column - original_column);
            original_column = next_column;

            if let Some(name) = original.name_index {
                let next_name = i64::from(name);
                write_vlq(&mut out, next_name - name_index);
                name_index = next_name;
            }
        }
    }

    out
}

fn write_vlq(out: &mut String, value: i64) {
    let mut remaining = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = (remaining & i64::from(VLQ_DIGIT_MASK)) as u8;
        remaining >>= VLQ_BASE_SHIFT;
        if remaining > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        out.push(char::from(BASE64_ALPHABET[usize::from(digit)]));
        if remaining == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_single_segment() {
        let lines = decode("AAAA").unwrap();
        assert_eq!(lines, vec![vec![Segment::new(0, 0, 0, 0)]]);
    }

    #[test]
    fn test_decode_relative_columns_reset_per_line() {
        // Second line starts again at generated column 0, while the original
        // column keeps accumulating from the first line.
        let lines = decode("AAAA,SAAS;AACA").unwrap();
        assert_eq!(
            lines,
            vec![
                vec![Segment::new(0, 0, 0, 0), Segment::new(9, 0, 0, 9)],
                vec![Segment::new(0, 0, 1, 9)],
            ]
        );
    }

    #[test]
    fn test_decode_unmapped_and_named_segments() {
        let lines = decode("A,EAAAC").unwrap();
        assert_eq!(
            lines,
            vec![vec![Segment::unmapped(0), Segment::named(2, 0, 0, 0, 1)]]
        );
    }

    #[test]
    fn test_decode_empty_lines() {
        let lines = decode(";;AAAA;").unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].is_empty());
        assert!(lines[1].is_empty());
        assert_eq!(lines[2], vec![Segment::new(0, 0, 0, 0)]);
        assert!(lines[3].is_empty());
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_multi_digit_values() {
        // 'g' carries the continuation bit, so "gB" is a single value: 16
        let lines = decode("gBAAgB").unwrap();
        assert_eq!(lines, vec![vec![Segment::new(16, 0, 0, 16)]]);
    }

    #[test]
    fn test_decode_sorts_out_of_order_segments() {
        // Second segment moves the column back from 4 to 2
        let lines = decode("IAAA,FAAC").unwrap();
        assert_eq!(
            lines,
            vec![vec![Segment::new(2, 0, 0, 1), Segment::new(4, 0, 0, 0)]]
        );
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = decode("AAAA;AA*A").unwrap_err();
        assert_eq!(
            err,
            MalformedMapError::InvalidCharacter {
                character: '*',
                offset: 7,
            }
        );
    }

    #[test]
    fn test_decode_unterminated_value() {
        let err = decode("AAAg").unwrap_err();
        assert!(matches!(err, MalformedMapError::UnterminatedValue { .. }));
    }

    #[test]
    fn test_decode_invalid_segment_length() {
        assert_eq!(
            decode("AA").unwrap_err(),
            MalformedMapError::InvalidSegmentLength {
                offset: 0,
                fields: 2,
            }
        );
        assert!(matches!(
            decode("AAAAAA").unwrap_err(),
            MalformedMapError::InvalidSegmentLength { fields: 6, .. }
        ));
    }

    #[test]
    fn test_decode_rejects_empty_segments() {
        assert_eq!(
            decode("AAAA,,AAAA").unwrap_err(),
            MalformedMapError::InvalidSegmentLength {
                offset: 5,
                fields: 0,
            }
        );
        assert_eq!(
            decode("AAAA;AAAA,").unwrap_err(),
            MalformedMapError::InvalidSegmentLength {
                offset: 10,
                fields: 0,
            }
        );
        assert!(matches!(
            decode(",AAAA").unwrap_err(),
            MalformedMapError::InvalidSegmentLength { offset: 0, fields: 0 }
        ));
    }

    #[test]
    fn test_decode_negative_position() {
        let err = decode("AAAD").unwrap_err();
        assert_eq!(
            err,
            MalformedMapError::NegativeValue {
                field: "original column",
                offset: 0,
            }
        );
    }

    #[test]
    fn test_decode_overflow() {
        let err = decode("gggggggggA").unwrap_err();
        assert!(matches!(err, MalformedMapError::Overflow { .. }));
    }

    #[test]
    fn test_encode_round_trip() {
        for mappings in [
            "AAAA",
            "AAAA,SAAS;AACA",
            "AAAA;AACA,IAAI;;AAEE",
            "A,EAAAC;AACA,CAAAC",
            "gBAAgB,CAAC",
        ] {
            let decoded = decode(mappings).unwrap();
            assert_eq!(encode(&decoded), mappings);
            assert_eq!(decode(&encode(&decoded)).unwrap(), decoded);
        }
    }

    #[test]
    fn test_encode_concatenated_maps() {
        // Two maps decoded independently, the second pointed at source 1
        let mut first = decode("AAAA,EAAE;AACA").unwrap();
        let second: Mappings = decode("AAEA;AACC")
            .unwrap()
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .map(|segment| segment.with_source_index(1))
                    .collect()
            })
            .collect();
        first.extend(second.clone());

        let encoded = encode(&first);
        let decoded = decode(&encoded).unwrap();

        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[2], second[0]);
        assert_eq!(decoded[3], second[1]);
        assert!(decoded[2..].iter().flatten().all(|s| s.source_index() == Some(1)));
    }

    #[test]
    fn test_encode_negative_deltas() {
        let lines = vec![
            vec![Segment::new(0, 1, 5, 10)],
            vec![Segment::new(0, 0, 2, 3)],
        ];
        let encoded = encode(&lines);
        assert_eq!(decode(&encoded).unwrap(), lines);
    }
}
