// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code for allowing other languages to talk to this Rust library.
//!
//! Complex numbers can't be passed across the FFI boundary, so they are
//! unpacked into (real, imaginary) pairs of floats. Each kernel is available
//! in single (`_f32`) and double (`_f64`) precision.

#[cfg(test)]
mod tests;

use std::{
    cell::RefCell,
    mem,
    os::raw::{c_char, c_int},
    panic, slice,
};

use ndarray::prelude::*;
use num_complex::Complex;

use crate::{
    beam::{BeamCubeView, BeamExtents},
    constants::{EBEAM_NPOL, NUM_BEAM_EXTENTS},
    dims::{checked_len, BeamDims},
    errors::ConfigurationError,
    phase::{compute_phase_into, PhaseOptions},
    precision::RimeFloat,
    types::{BeamCoord, Lmn, Uvw},
};

// Error handling taken from
// https://michael-f-bryan.github.io/rust-ffi-guide/errors/return_types.html
thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Update the most recent error, clearing whatever may have been there before.
pub fn update_last_error(err: String) {
    LAST_ERROR.with(|prev| {
        *prev.borrow_mut() = Some(err);
    });
}

/// Retrieve the most recent error, clearing it in the process.
pub fn take_last_error() -> Option<String> {
    LAST_ERROR.with(|prev| prev.borrow_mut().take())
}

/// Calculate the number of bytes in the last error's error message **not**
/// including any trailing `null` characters.
#[no_mangle]
pub extern "C" fn rk_last_error_length() -> c_int {
    LAST_ERROR.with(|prev| match *prev.borrow() {
        Some(ref err) => err.len() as c_int + 1,
        None => 0,
    })
}

macro_rules! ffi_error {
    ($result:expr) => {{
        match $result {
            Ok(r) => r,
            Err(e) => {
                update_last_error(e.to_string());
                return 1;
            }
        }
    }};
}

/// Write the most recent error message into a caller-provided buffer as a UTF-8
/// string, returning the number of bytes written.
///
/// # Note
///
/// This writes a **UTF-8** string into the buffer. Windows users may need to
/// convert it to a UTF-16 "unicode" afterwards.
///
/// If there are no recent errors then this returns `0` (because we wrote 0
/// bytes). `-1` is returned if there are any errors, for example when passed a
/// null pointer or a buffer of insufficient size.
///
/// # Safety
///
/// `buffer` must point to at least `length` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn rk_last_error_message(buffer: *mut c_char, length: c_int) -> c_int {
    if buffer.is_null() || length < 0 {
        return -1;
    }

    let last_error = match take_last_error() {
        Some(err) => err,
        None => return 0,
    };

    let buffer = slice::from_raw_parts_mut(buffer as *mut u8, length as usize);

    if last_error.len() >= buffer.len() {
        // Put the error back so that the caller can try again with a bigger
        // buffer.
        update_last_error(last_error);
        return -1;
    }

    std::ptr::copy_nonoverlapping(last_error.as_ptr(), buffer.as_mut_ptr(), last_error.len());

    // Add a trailing null so people using the string as a `char *` don't
    // accidentally read into garbage.
    buffer[last_error.len()] = 0;

    last_error.len() as c_int
}

/// Get a slice from a caller's pointer. Null pointers are only allowed when
/// the slice is empty.
unsafe fn checked_slice<'a, T>(
    name: &'static str,
    ptr: *const T,
    len: usize,
) -> Result<&'a [T], String> {
    if len == 0 {
        Ok(&[])
    } else if ptr.is_null() {
        Err(format!("'{name}' is a null pointer"))
    } else {
        check_num_bytes::<T>(name, len)?;
        Ok(slice::from_raw_parts(ptr, len))
    }
}

unsafe fn checked_slice_mut<'a, T>(
    name: &'static str,
    ptr: *mut T,
    len: usize,
) -> Result<&'a mut [T], String> {
    if len == 0 {
        Ok(&mut [])
    } else if ptr.is_null() {
        Err(format!("'{name}' is a null pointer"))
    } else {
        check_num_bytes::<T>(name, len)?;
        Ok(slice::from_raw_parts_mut(ptr, len))
    }
}

/// Slices can't span more than `isize::MAX` bytes.
fn check_num_bytes<T>(name: &'static str, len: usize) -> Result<(), String> {
    match len.checked_mul(mem::size_of::<T>()) {
        Some(num_bytes) if num_bytes <= isize::MAX as usize => Ok(()),
        _ => Err(ConfigurationError::SizeOverflow { name }.to_string()),
    }
}

/// Run an FFI function body, turning any panic into an error code of -1 and
/// an error message. Panics on rayon's worker threads are resumed on this
/// thread, so the message is taken from the panic payload here.
fn catch_panics<Func: FnOnce() -> i32>(func: Func) -> i32 {
    match panic::catch_unwind(panic::AssertUnwindSafe(func)) {
        Ok(code) => code,
        Err(payload) => {
            update_last_error(panic_message::panic_message(&payload).to_string());
            -1
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn interpolate_beam_inner<F: RimeFloat>(
    beam: *const F,
    beam_lw: usize,
    beam_mh: usize,
    beam_nud: usize,
    extents: *const F,
    freq_map: *const F,
    coords: *const F,
    num_coords: usize,
    results: *mut F,
) -> i32 {
    catch_panics(|| {
        let dims = ffi_error!(BeamDims::new(beam_lw, beam_mh, beam_nud));
        let beam = ffi_error!(checked_slice(
            "beam",
            beam as *const Complex<F>,
            dims.num_samples()
        ));
        let extents = ffi_error!(checked_slice("extents", extents, NUM_BEAM_EXTENTS));
        let extents = ffi_error!(BeamExtents::from_slice(extents));
        // The caller's samples are borrowed, not copied.
        let mut cube = ffi_error!(BeamCubeView::from_slice(dims, beam, extents));
        if !freq_map.is_null() {
            let freq_map = ffi_error!(checked_slice("freq_map", freq_map, dims.nud()));
            cube = ffi_error!(cube.with_freq_map(freq_map));
        }

        let coords = ffi_error!(checked_slice(
            "coords",
            coords as *const BeamCoord<F>,
            num_coords
        ));
        let num_results = ffi_error!(checked_len("results", &[num_coords, EBEAM_NPOL]));
        let results = ffi_error!(checked_slice_mut(
            "results",
            results as *mut Complex<F>,
            num_results
        ));

        let jones = ffi_error!(cube.interpolate(coords));
        for (result, jones) in results.chunks_exact_mut(EBEAM_NPOL).zip(jones.iter()) {
            for (r, j) in result.iter_mut().zip(jones.iter()) {
                *r = *j;
            }
        }
        0
    })
}

/// Interpolate a beam cube at many coordinates in double precision.
///
/// # Arguments
///
/// * `beam` - a pointer to the beam cube, with `beam_lw * beam_mh * beam_nud
///   * 4` complex samples (`* 2` doubles). The polarisation axis changes
///   fastest, then frequency, then m, then l.
/// * `beam_lw`, `beam_mh`, `beam_nud` - the number of samples along the l, m
///   and frequency axes. Each must be at least 2.
/// * `extents` - a pointer to 6 doubles: lower l, lower m, lower frequency,
///   upper l, upper m, upper frequency.
/// * `freq_map` - either null, or a pointer to `beam_nud` ascending
///   frequencies, one per frequency plane of the cube.
/// * `coords` - a pointer to `num_coords` (l, m, frequency) triples.
/// * `num_coords` - the number of coordinates.
/// * `results` - a pointer to `num_coords * 8` doubles; each coordinate gets a
///   Jones matrix, with the j00 as the first (real, imaginary) pair, j01 as
///   the second pair, etc.
///
/// # Returns
///
/// * An exit code integer. If this is non-zero then an error occurred; the
///   details can be obtained by (1) getting the length of the error string by
///   calling `rk_last_error_length` and (2) calling `rk_last_error_message`
///   with a string buffer with a length at least equal to the error length.
///
/// # Safety
///
/// All pointers must be valid for the lengths described above.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rk_interpolate_beam_f64(
    beam: *const f64,
    beam_lw: usize,
    beam_mh: usize,
    beam_nud: usize,
    extents: *const f64,
    freq_map: *const f64,
    coords: *const f64,
    num_coords: usize,
    results: *mut f64,
) -> i32 {
    interpolate_beam_inner(
        beam, beam_lw, beam_mh, beam_nud, extents, freq_map, coords, num_coords, results,
    )
}

/// Interpolate a beam cube at many coordinates in single precision. See
/// `rk_interpolate_beam_f64` for details; all pointers here are to floats
/// instead of doubles.
///
/// # Safety
///
/// All pointers must be valid for the lengths described in
/// `rk_interpolate_beam_f64`.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rk_interpolate_beam_f32(
    beam: *const f32,
    beam_lw: usize,
    beam_mh: usize,
    beam_nud: usize,
    extents: *const f32,
    freq_map: *const f32,
    coords: *const f32,
    num_coords: usize,
    results: *mut f32,
) -> i32 {
    interpolate_beam_inner(
        beam, beam_lw, beam_mh, beam_nud, extents, freq_map, coords, num_coords, results,
    )
}

#[allow(clippy::too_many_arguments)]
unsafe fn compute_phase_inner<F: RimeFloat>(
    lmn: *const F,
    nsrc: usize,
    ntime: usize,
    uvw: *const F,
    nbl: usize,
    freqs: *const F,
    nchan: usize,
    results: *mut F,
) -> i32 {
    catch_panics(|| {
        // Check all of the sizes before touching any pointers.
        let num_lmn = ffi_error!(checked_len("lmn", &[nsrc, ntime]));
        let num_uvw = ffi_error!(checked_len("uvw", &[ntime, nbl]));
        let num_results = ffi_error!(checked_len("results", &[nsrc, ntime, nbl, nchan]));

        let lmn = ffi_error!(checked_slice("lmn", lmn as *const Lmn<F>, num_lmn));
        let directions = ffi_error!(ArrayView2::from_shape((nsrc, ntime), lmn));
        let uvw = ffi_error!(checked_slice("uvw", uvw as *const Uvw<F>, num_uvw));
        let uvws = ffi_error!(ArrayView2::from_shape((ntime, nbl), uvw));
        let freqs = ffi_error!(checked_slice("freqs", freqs, nchan));
        let results = ffi_error!(checked_slice_mut(
            "results",
            results as *mut Complex<F>,
            num_results
        ));
        let phases = ffi_error!(ArrayViewMut4::from_shape(
            (nsrc, ntime, nbl, nchan),
            results
        ));

        ffi_error!(compute_phase_into(
            directions,
            uvws,
            ArrayView1::from(freqs),
            phases,
            PhaseOptions::default()
        ));
        0
    })
}

/// Calculate the complex phase of every source, timestep, baseline and
/// channel in double precision.
///
/// # Arguments
///
/// * `lmn` - a pointer to `nsrc * ntime` (l, m, n) triples, source-major.
/// * `nsrc`, `ntime` - the number of sources and timesteps.
/// * `uvw` - a pointer to `ntime * nbl` (u, v, w) triples \[metres\],
///   timestep-major.
/// * `nbl` - the number of baselines (or antennas).
/// * `freqs` - a pointer to `nchan` frequencies \[Hz\].
/// * `nchan` - the number of channels.
/// * `results` - a pointer to `nsrc * ntime * nbl * nchan * 2` doubles. The
///   (real, imaginary) pairs are ordered by source, then timestep, then
///   baseline, then channel.
///
/// # Returns
///
/// * An exit code integer. If this is non-zero then an error occurred; the
///   details can be obtained by (1) getting the length of the error string by
///   calling `rk_last_error_length` and (2) calling `rk_last_error_message`
///   with a string buffer with a length at least equal to the error length.
///
/// # Safety
///
/// All pointers must be valid for the lengths described above.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rk_compute_phase_f64(
    lmn: *const f64,
    nsrc: usize,
    ntime: usize,
    uvw: *const f64,
    nbl: usize,
    freqs: *const f64,
    nchan: usize,
    results: *mut f64,
) -> i32 {
    compute_phase_inner(lmn, nsrc, ntime, uvw, nbl, freqs, nchan, results)
}

/// Calculate the complex phase of every source, timestep, baseline and
/// channel in single precision. See `rk_compute_phase_f64` for details; all
/// pointers here are to floats instead of doubles.
///
/// # Safety
///
/// All pointers must be valid for the lengths described in
/// `rk_compute_phase_f64`.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rk_compute_phase_f32(
    lmn: *const f32,
    nsrc: usize,
    ntime: usize,
    uvw: *const f32,
    nbl: usize,
    freqs: *const f32,
    nchan: usize,
    results: *mut f32,
) -> i32 {
    compute_phase_inner(lmn, nsrc, ntime, uvw, nbl, freqs, nchan, results)
}
