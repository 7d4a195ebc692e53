// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Codec for the Google encoded polyline format (precision 1e5).
//!
//! Directions responses carry the route geometry as a compact ASCII string.
//! Each coordinate is stored as a pair of signed deltas from the previous
//! point, zig-zag encoded and emitted as base-64-like 5-bit groups offset
//! by 63. Decoding is hardened: a string that ends mid-continuation-run or
//! contains a byte outside the encoding alphabet fails with [`DecodeError`]
//! instead of silently truncating the route.

use geo::{Coord, LineString};

/// Fixed-point scale of the wire format (5 decimal places).
const PRECISION_SCALE: f64 = 1e5;

/// Every encoded byte is offset by 63 ('?') to stay printable.
const BYTE_OFFSET: u8 = 63;

/// Highest byte the alphabet can produce: 0x3f chunk + offset = '~'.
const MAX_BYTE: u8 = 126;

/// Bit that marks "more 5-bit groups follow" within a delta.
const CONTINUATION_BIT: u64 = 0x20;

/// Errors from decoding a malformed polyline string.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("encoded polyline ends mid-sequence at byte {0}")]
    UnexpectedEof(usize),

    #[error("byte {byte:#04x} at offset {offset} is outside the encoding alphabet")]
    InvalidByte { byte: u8, offset: usize },

    #[error("continuation run at byte {0} overflows the delta accumulator")]
    DeltaOverflow(usize),
}

/// Decode an encoded polyline into an ordered coordinate sequence.
///
/// Coordinates come back in input order as degrees; `x` is longitude and
/// `y` is latitude, matching the rest of the geo stack. An empty string
/// decodes to an empty line string.
pub fn decode(encoded: &str) -> Result<LineString<f64>, DecodeError> {
    let bytes = encoded.as_bytes();
    let mut cursor = 0usize;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut coords = Vec::new();

    while cursor < bytes.len() {
        lat += next_delta(bytes, &mut cursor)?;
        lng += next_delta(bytes, &mut cursor)?;
        coords.push(Coord {
            x: lng as f64 / PRECISION_SCALE,
            y: lat as f64 / PRECISION_SCALE,
        });
    }

    Ok(LineString::from(coords))
}

/// Encode a coordinate sequence into the polyline wire format.
///
/// Inverse of [`decode`]: each coordinate is scaled by 1e5, rounded to the
/// nearest integer, and written as a delta from the previous point (the
/// first point is a delta from (0, 0)). An empty line string encodes to "".
pub fn encode(line: &LineString<f64>) -> String {
    let mut encoded = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for coord in line.coords() {
        let lat = scale(coord.y);
        let lng = scale(coord.x);
        push_delta(lat - prev_lat, &mut encoded);
        push_delta(lng - prev_lng, &mut encoded);
        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

/// Read one variable-length signed delta, advancing the cursor past it.
fn next_delta(bytes: &[u8], cursor: &mut usize) -> Result<i64, DecodeError> {
    let mut accumulator: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = *bytes
            .get(*cursor)
            .ok_or(DecodeError::UnexpectedEof(*cursor))?;
        if !(BYTE_OFFSET..=MAX_BYTE).contains(&byte) {
            return Err(DecodeError::InvalidByte {
                byte,
                offset: *cursor,
            });
        }
        // A well-formed delta fits in 7 groups; 13 is where the 64-bit
        // accumulator runs out. Anything longer is a runaway continuation.
        if shift >= u64::BITS {
            return Err(DecodeError::DeltaOverflow(*cursor));
        }

        let chunk = (byte - BYTE_OFFSET) as u64;
        accumulator |= (chunk & 0x1f) << shift;
        shift += 5;
        *cursor += 1;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    // Undo the zig-zag sign encoding.
    if accumulator & 1 != 0 {
        Ok(!(accumulator >> 1) as i64)
    } else {
        Ok((accumulator >> 1) as i64)
    }
}

/// Append one zig-zag encoded delta as 5-bit groups with continuation bits.
fn push_delta(delta: i64, out: &mut String) {
    let mut value = ((delta << 1) ^ (delta >> 63)) as u64;

    loop {
        let mut chunk = value & 0x1f;
        value >>= 5;
        if value != 0 {
            chunk |= CONTINUATION_BIT;
        }
        out.push((chunk as u8 + BYTE_OFFSET) as char);
        if value == 0 {
            break;
        }
    }
}

/// Scale degrees to the fixed-point wire representation.
fn scale(degrees: f64) -> i64 {
    (degrees * PRECISION_SCALE).round() as i64
}
