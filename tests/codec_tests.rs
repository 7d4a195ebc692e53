// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polyline codec laws exercised through the public API.
//!
//! The unit tests in src/polyline.rs cover the byte-level mechanics; these
//! check the codec laws on realistic route data.

use geo::{Coord, LineString};
use tong_tracker::polyline::{decode, encode, DecodeError};

/// A route around the Universitas Indonesia campus area, snapped to the
/// 1e-5 grid the wire format can represent exactly.
fn campus_route() -> LineString<f64> {
    let points = [
        (-6.3628, 106.8269),
        (-6.36154, 106.82716),
        (-6.36089, 106.82907),
        (-6.36245, 106.83112),
        (-6.36518, 106.83041),
        (-6.36633, 106.82801),
    ];
    LineString::from(
        points
            .iter()
            .map(|&(lat, lng)| Coord { x: lng, y: lat })
            .collect::<Vec<_>>(),
    )
}

#[test]
fn test_round_trip_on_a_realistic_route() {
    let route = campus_route();

    let encoded = encode(&route);
    let decoded = decode(&encoded).expect("own encoding must decode");

    assert_eq!(decoded.0.len(), route.0.len());
    for (out, reference) in decoded.coords().zip(route.coords()) {
        assert!((out.x - reference.x).abs() < 1e-5);
        assert!((out.y - reference.y).abs() < 1e-5);
    }
}

#[test]
fn test_every_truncation_of_a_route_fails_or_shortens_cleanly() {
    // Chopping an encoded route anywhere must either fail loudly or (when
    // the cut lands exactly on a coordinate boundary) decode to a strict
    // prefix of the route. It must never produce garbage coordinates.
    let route = campus_route();
    let encoded = encode(&route);
    let full = decode(&encoded).unwrap();

    for len in 0..encoded.len() {
        let prefix = &encoded[..len];
        match decode(prefix) {
            Ok(line) => {
                assert!(line.0.len() <= full.0.len());
                for (got, reference) in line.coords().zip(full.coords()) {
                    assert_eq!(got, reference);
                }
            }
            Err(DecodeError::UnexpectedEof(_)) => {}
            Err(other) => panic!("unexpected error for prefix of len {}: {:?}", len, other),
        }
    }
}

#[test]
fn test_decode_rejects_non_ascii_input() {
    assert!(matches!(
        decode("_p~iF£"),
        Err(DecodeError::InvalidByte { .. })
    ));
}
