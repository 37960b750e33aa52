//! Test utilities for drift development.
//!
//! Provides reusable fixture schemes ([`fixtures`]), a shareable snapshot
//! sink ([`SharedSink`]) and helpers for building small frames without the
//! full disk initializer.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod sink;

pub use fixtures::{ConstScheme, FailingScheme, IdentityScheme, NanScheme, ScaleScheme};
pub use sink::SharedSink;

use drift_core::FieldPath;
use drift_frame::ndarray::{Array1, ArrayD};
use drift_frame::Frame;

/// A frame with one root-level 1-d field per name, each of length `n`
/// and filled with `value`.
pub fn line_frame(names: &[&str], n: usize, value: f64) -> Frame {
    let mut frame = Frame::new();
    for name in names {
        frame
            .add_field("", name, ArrayD::from_elem(vec![n], value), "test field")
            .expect("valid fixture field");
    }
    frame
}

/// A 1-d array `start, start + step, ...` of length `n`, as a dynamic array.
pub fn ramp(n: usize, start: f64, step: f64) -> ArrayD<f64> {
    Array1::from_iter((0..n).map(|i| start + step * i as f64)).into_dyn()
}

/// Parse a fixture path, panicking on malformed input.
pub fn path(raw: &str) -> FieldPath {
    FieldPath::parse(raw).expect("valid fixture path")
}
