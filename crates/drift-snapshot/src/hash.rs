//! FNV-1a hashing of simulation state.
//!
//! Not cryptographically secure; used for fast bit-for-bit equality
//! checks between a live frame and persisted snapshots.

use drift_frame::Frame;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Fold one field into a hash state: path bytes, a separator, the shape,
/// then every value's bit pattern in row-major order.
pub(crate) fn fold_field<'a>(
    mut hash: u64,
    path: &str,
    shape: &[usize],
    values: impl Iterator<Item = &'a f64>,
) -> u64 {
    for &b in path.as_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash = fnv1a_byte(hash, 0xff);
    hash = fnv1a_u64(hash, shape.len() as u64);
    for &d in shape {
        hash = fnv1a_u64(hash, d as u64);
    }
    for v in values {
        hash = fnv1a_u64(hash, v.to_bits());
    }
    hash
}

pub(crate) fn start() -> u64 {
    FNV_OFFSET
}

/// Hash every field of a frame in tree order.
///
/// Equal to [`SnapshotRecord::hash`](crate::SnapshotRecord::hash) of a
/// record captured from the same frame.
pub fn state_hash(frame: &Frame) -> u64 {
    frame.fields().into_iter().fold(start(), |hash, (path, field)| {
        fold_field(hash, path.as_str(), field.shape(), field.value().iter())
    })
}
