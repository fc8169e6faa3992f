//! Byte views of plain-old-data buffers for the message layer.
//!
//! Field samples travel as raw native-endian bytes: every rank of a run
//! shares one architecture, so no byte swapping is applied.

use bytemuck::Pod;

use crate::extrema_error::ExtremaError;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {expected} bytes, got {actual}"))
    }
}

/// Copy a received payload into `dst`, failing with a [`ExtremaError::CommError`]
/// naming `peer` if the byte count is not exactly `dst`'s size.
pub fn copy_into<T: Pod>(peer: usize, data: &[u8], dst: &mut [T]) -> Result<(), ExtremaError> {
    let bytes = cast_slice_mut(dst);
    expect_exact_len(data.len(), bytes.len()).map_err(|e| ExtremaError::comm(peer, e))?;
    bytes.copy_from_slice(data);
    Ok(())
}

/// Decode a payload of exactly `n` values of `T`.
///
/// The payload buffer need not be aligned for `T`.
pub fn decode_values<T: Pod>(peer: usize, data: &[u8], n: usize) -> Result<Vec<T>, ExtremaError> {
    expect_exact_len(data.len(), n * std::mem::size_of::<T>())
        .map_err(|e| ExtremaError::comm(peer, e))?;
    Ok(bytemuck::pod_collect_to_vec(data))
}
