// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests for the FFI functions. The results should match those of the Rust
//! API exactly.

use std::ptr::{null, null_mut};

use approx::*;
use marlu::c64;
use rayon::prelude::*;

use super::*;
use crate::{beam::BeamCube, phase::compute_phase};

fn last_error() -> String {
    let len = rk_last_error_length();
    assert!(len > 0, "no error message");
    let mut buffer = vec![0_u8; len as usize];
    let written = unsafe { rk_last_error_message(buffer.as_mut_ptr() as *mut c_char, len) };
    assert_eq!(written, len - 1);
    // Trim the null terminator.
    buffer.pop();
    String::from_utf8(buffer).unwrap()
}

/// (l, m, f, pol) -> interleaved (re, im) doubles.
fn beam_data(lw: usize, mh: usize, nud: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(lw * mh * nud * 8);
    for l in 0..lw {
        for m in 0..mh {
            for f in 0..nud {
                for p in 0..4 {
                    data.push((l * 100 + m * 10 + f) as f64);
                    data.push(p as f64);
                }
            }
        }
    }
    data
}

#[test]
fn test_interpolate_beam_f64() {
    let (lw, mh, nud) = (3, 2, 2);
    let data = beam_data(lw, mh, nud);
    let extents = [-1.0, -1.0, 1e8, 1.0, 1.0, 2e8];
    let coords = [0.0, 0.0, 1.5e8, 1.0, -1.0, 1e8, 5.0, 5.0, 5e8];
    let mut results = vec![0.0; 3 * 8];

    let code = unsafe {
        rk_interpolate_beam_f64(
            data.as_ptr(),
            lw,
            mh,
            nud,
            extents.as_ptr(),
            null(),
            coords.as_ptr(),
            3,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 0);

    // Compare with the Rust API.
    let cube = BeamCube::from_vec(
        BeamDims::new(lw, mh, nud).unwrap(),
        data.chunks_exact(2).map(|c| c64::new(c[0], c[1])).collect(),
        BeamExtents::from_slice(&extents).unwrap(),
    )
    .unwrap();
    let expected = cube
        .interpolate(&[
            BeamCoord::new(0.0, 0.0, 1.5e8),
            BeamCoord::new(1.0, -1.0, 1e8),
            BeamCoord::new(5.0, 5.0, 5e8),
        ])
        .unwrap();
    for (result, expected) in results.chunks_exact(8).zip(expected.iter()) {
        for (r, e) in result.chunks_exact(2).zip(expected.iter()) {
            assert_eq!(r[0], e.re);
            assert_eq!(r[1], e.im);
        }
    }

    // The centre of the cube: l index 1, m between 0 and 1, f between 0 and
    // 1.
    assert_abs_diff_eq!(results[0], 105.5, epsilon = 1e-10);
    // (l = 1, m = -1) is the (2, 0) vertex. The polarisation is the imaginary
    // part.
    assert_abs_diff_eq!(results[8], 200.0, epsilon = 1e-10);
    assert_abs_diff_eq!(results[8 + 7], 3.0, epsilon = 1e-10);
    // Clamped to the far corner.
    assert_abs_diff_eq!(results[16], 211.0, epsilon = 1e-10);
}

#[test]
fn test_interpolate_beam_f32_with_freq_map() {
    let (lw, mh, nud) = (2, 2, 3);
    let data = beam_data(lw, mh, nud)
        .into_iter()
        .map(|f| f as f32)
        .collect::<Vec<_>>();
    let extents = [0.0_f32, 0.0, 1e8, 1.0, 1.0, 3e8];
    let freq_map = [1e8_f32, 1.2e8, 3e8];
    // Halfway between the first two map frequencies.
    let coords = [0.0_f32, 0.0, 1.1e8];
    let mut results = vec![0.0_f32; 8];

    let code = unsafe {
        rk_interpolate_beam_f32(
            data.as_ptr(),
            lw,
            mh,
            nud,
            extents.as_ptr(),
            freq_map.as_ptr(),
            coords.as_ptr(),
            1,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 0);
    assert_abs_diff_eq!(results[0], 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(results[1], 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(results[6], 0.5, epsilon = 1e-5);
    assert_abs_diff_eq!(results[7], 3.0, epsilon = 1e-5);
}

#[test]
fn test_interpolate_beam_degenerate() {
    let data = beam_data(1, 2, 2);
    let extents = [-1.0, -1.0, 1e8, 1.0, 1.0, 2e8];
    let coords = [0.0, 0.0, 1.5e8];
    let mut results = vec![-1.0; 8];

    let code = unsafe {
        rk_interpolate_beam_f64(
            data.as_ptr(),
            1,
            2,
            2,
            extents.as_ptr(),
            null(),
            coords.as_ptr(),
            1,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 1);
    let err = last_error();
    assert!(err.contains("l axis has 1 samples"), "{err}");
    // No output is written on errors.
    assert!(results.iter().all(|&r| r == -1.0));
    // The error is taken.
    assert_eq!(rk_last_error_length(), 0);
}

#[test]
fn test_interpolate_beam_null_pointer() {
    let data = beam_data(2, 2, 2);
    let coords = [0.0, 0.0, 1.5e8];
    let mut results = vec![0.0; 8];

    let code = unsafe {
        rk_interpolate_beam_f64(
            data.as_ptr(),
            2,
            2,
            2,
            null(),
            null(),
            coords.as_ptr(),
            1,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 1);
    assert_eq!(last_error(), "'extents' is a null pointer");
}

#[test]
fn test_error_message_buffer_too_small() {
    update_last_error("a long error message".to_string());
    let mut buffer = [0 as c_char; 4];
    let code = unsafe { rk_last_error_message(buffer.as_mut_ptr(), 4) };
    assert_eq!(code, -1);
    // The error is still there.
    assert_eq!(last_error(), "a long error message");

    assert_eq!(unsafe { rk_last_error_message(null_mut(), 4) }, -1);
    assert_eq!(unsafe { rk_last_error_message(buffer.as_mut_ptr(), 4) }, 0);
}

#[test]
fn test_compute_phase_f64() {
    let (nsrc, ntime, nbl, nchan) = (2, 1, 3, 2);
    let lmn = [0.01, 0.02, (1.0_f64 - 0.0005).sqrt(), 0.0, 0.0, 1.0];
    let uvw = [100.0, 50.0, 10.0, -20.0, 300.0, 5.0, 0.0, 0.0, 0.0];
    let freqs = [150e6, 200e6];
    let mut results = vec![0.0; nsrc * ntime * nbl * nchan * 2];

    let code = unsafe {
        rk_compute_phase_f64(
            lmn.as_ptr(),
            nsrc,
            ntime,
            uvw.as_ptr(),
            nbl,
            freqs.as_ptr(),
            nchan,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 0);

    let directions = array![
        [Lmn {
            l: lmn[0],
            m: lmn[1],
            n: lmn[2]
        }],
        [Lmn {
            l: lmn[3],
            m: lmn[4],
            n: lmn[5]
        }]
    ];
    let uvws = array![[
        Uvw::new(uvw[0], uvw[1], uvw[2]),
        Uvw::new(uvw[3], uvw[4], uvw[5]),
        Uvw::new(uvw[6], uvw[7], uvw[8])
    ]];
    let expected = compute_phase(directions.view(), uvws.view(), ArrayView1::from(&freqs)).unwrap();
    for (r, e) in results.chunks_exact(2).zip(expected.iter()) {
        assert_eq!(r[0], e.re);
        assert_eq!(r[1], e.im);
    }

    // The second source is at the phase centre.
    for r in results[nbl * nchan * 2..].chunks_exact(2) {
        assert_eq!(r, &[1.0, 0.0]);
    }
}

#[test]
fn test_compute_phase_f32() {
    let lmn = [0.0_f32, 0.6, 0.8];
    let uvw = [10.0_f32, 20.0, 30.0];
    let freqs = [1e8_f32];
    let mut results = [0.0_f32; 2];

    let code = unsafe {
        rk_compute_phase_f32(
            lmn.as_ptr(),
            1,
            1,
            uvw.as_ptr(),
            1,
            freqs.as_ptr(),
            1,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 0);
    assert_abs_diff_eq!(results[0].hypot(results[1]), 1.0, epsilon = 1e-6);
}

#[test]
fn test_compute_phase_null_results() {
    let lmn = [0.0, 0.0, 1.0];
    let uvw = [10.0, 20.0, 30.0];
    let freqs = [1e8];

    let code = unsafe {
        rk_compute_phase_f64(
            lmn.as_ptr(),
            1,
            1,
            uvw.as_ptr(),
            1,
            freqs.as_ptr(),
            1,
            null_mut(),
        )
    };
    assert_eq!(code, 1);
    assert_eq!(last_error(), "'results' is a null pointer");
}

#[test]
fn test_compute_phase_empty() {
    // No sources; null pointers are fine for empty inputs.
    let uvw = [10.0, 20.0, 30.0];
    let freqs = [1e8];
    let code = unsafe {
        rk_compute_phase_f64(
            null(),
            0,
            1,
            uvw.as_ptr(),
            1,
            freqs.as_ptr(),
            1,
            null_mut(),
        )
    };
    assert_eq!(code, 0);
}

#[test]
fn test_interpolate_beam_size_overflow() {
    let extents = [-1.0, -1.0, 1e8, 1.0, 1.0, 2e8];
    let coords = [0.0, 0.0, 1.5e8];
    let mut results = vec![0.0; 8];

    // The number of beam samples doesn't fit in a usize.
    let code = unsafe {
        rk_interpolate_beam_f64(
            coords.as_ptr(),
            usize::MAX / 4,
            2,
            2,
            extents.as_ptr(),
            null(),
            coords.as_ptr(),
            1,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 1);
    assert!(last_error().contains("'beam' is too big"));

    // Neither does the number of results.
    let data = beam_data(2, 2, 2);
    let code = unsafe {
        rk_interpolate_beam_f64(
            data.as_ptr(),
            2,
            2,
            2,
            extents.as_ptr(),
            null(),
            coords.as_ptr(),
            usize::MAX / 2,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 1);
    let err = last_error();
    // The coordinates are checked first; there are too many bytes of them.
    assert!(err.contains("'coords' is too big"), "{err}");
}

#[test]
#[cfg(target_pointer_width = "64")]
fn test_compute_phase_size_overflow() {
    let lmn = [0.0, 0.0, 1.0];
    let uvw = [10.0, 20.0, 30.0];
    let freqs = [1e8];
    let mut results = [0.0; 2];

    let code = unsafe {
        rk_compute_phase_f64(
            lmn.as_ptr(),
            usize::MAX,
            2,
            uvw.as_ptr(),
            1,
            freqs.as_ptr(),
            1,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 1);
    assert!(last_error().contains("'lmn' is too big"));

    // The number of directions and channels fit, but the number of results
    // doesn't. This is caught before any of the inputs are read.
    let code = unsafe {
        rk_compute_phase_f64(
            lmn.as_ptr(),
            1 << 32,
            1,
            uvw.as_ptr(),
            1,
            freqs.as_ptr(),
            1 << 32,
            results.as_mut_ptr(),
        )
    };
    assert_eq!(code, 1);
    assert_eq!(
        last_error(),
        "The number of elements in 'results' is too big to be addressed"
    );
}

#[test]
fn test_panic_on_worker_thread_sets_error() {
    let code = catch_panics(|| {
        (0..64).into_par_iter().for_each(|i| {
            if i == 63 {
                panic!("sample {i} is bad");
            }
        });
        0
    });
    assert_eq!(code, -1);
    assert_eq!(last_error(), "sample 63 is bad");
}

#[test]
fn test_panic_on_calling_thread_sets_error() {
    let code = catch_panics(|| panic!("oh no"));
    assert_eq!(code, -1);
    assert_eq!(last_error(), "oh no");
}
