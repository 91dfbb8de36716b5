// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to calculate the geometric phase delay of every source on every
//! baseline.
//!
//! For a source with direction cosines (l, m, n), a baseline with coordinates
//! (u, v, w) \[metres\] and a frequency f \[Hz\], the complex phase is
//!
//! `exp(-2 pi i (u l + v m + w (n - 1)) f / c)`.

mod error;

pub use error::PhaseError;

use log::{debug, warn};
use ndarray::prelude::*;
use num_complex::Complex;
use rayon::prelude::*;

use crate::{
    constants::VEL_C,
    dims::check_shape,
    direction::SkyDirection,
    precision::RimeFloat,
    types::{Lmn, Uvw},
};

/// Options for the phase kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOptions {
    /// Report likely input mistakes (e.g. non-positive frequencies) as
    /// warnings. This never changes the results.
    pub validate: bool,
}

impl Default for PhaseOptions {
    fn default() -> Self {
        PhaseOptions { validate: true }
    }
}

/// Calculate the complex phase for every source, timestep, baseline and
/// channel. `directions` has shape `(nsrc, ntime)`, `uvws` has shape `(ntime,
/// nbl)` and the result has shape `(nsrc, ntime, nbl, nchan)`.
///
/// All arithmetic is done in the precision of `F`. Non-finite inputs give
/// non-finite phases.
///
/// # Examples
///
/// ```
/// use ndarray::prelude::*;
/// use rime_kernels::{compute_phase, Lmn, Uvw};
///
/// let directions = array![[Lmn::from_lm(0.01, 0.02)], [Lmn::phase_centre()]];
/// let uvws = array![[Uvw::new(100.0, 50.0, 10.0), Uvw::new(0.0, 0.0, 0.0)]];
/// let freqs: Array1<f64> = array![150e6, 200e6];
/// let phases = compute_phase(directions.view(), uvws.view(), freqs.view()).unwrap();
/// assert_eq!(phases.dim(), (2, 1, 2, 2));
/// // Every phase has unit magnitude.
/// assert!(phases.iter().all(|p| (p.norm() - 1.0).abs() < 1e-12));
/// ```
pub fn compute_phase<F, D>(
    directions: ArrayView2<D>,
    uvws: ArrayView2<Uvw<F>>,
    frequencies: ArrayView1<F>,
) -> Result<Array4<Complex<F>>, PhaseError>
where
    F: RimeFloat,
    D: SkyDirection<F> + Sync,
{
    compute_phase_with_options(directions, uvws, frequencies, PhaseOptions::default())
}

/// The same as `compute_phase`, but with the supplied [`PhaseOptions`].
pub fn compute_phase_with_options<F, D>(
    directions: ArrayView2<D>,
    uvws: ArrayView2<Uvw<F>>,
    frequencies: ArrayView1<F>,
    options: PhaseOptions,
) -> Result<Array4<Complex<F>>, PhaseError>
where
    F: RimeFloat,
    D: SkyDirection<F> + Sync,
{
    let (nsrc, ntime) = directions.dim();
    let nbl = uvws.len_of(Axis(1));
    let mut phases = Array4::zeros((nsrc, ntime, nbl, frequencies.len()));
    compute_phase_into(directions, uvws, frequencies, phases.view_mut(), options)?;
    Ok(phases)
}

/// The same as `compute_phase_with_options`, but the results are written into
/// `phases`, which must have shape `(nsrc, ntime, nbl, nchan)`.
pub fn compute_phase_into<F, D>(
    directions: ArrayView2<D>,
    uvws: ArrayView2<Uvw<F>>,
    frequencies: ArrayView1<F>,
    phases: ArrayViewMut4<Complex<F>>,
    options: PhaseOptions,
) -> Result<(), PhaseError>
where
    F: RimeFloat,
    D: SkyDirection<F> + Sync,
{
    let (nsrc, ntime) = directions.dim();
    let nbl = uvws.len_of(Axis(1));
    check_shape("uvws", uvws.shape(), &[ntime, nbl])?;
    check_shape(
        "phases",
        phases.shape(),
        &[nsrc, ntime, nbl, frequencies.len()],
    )?;

    compute_phase_inner(
        |i_src, i_time| directions[(i_src, i_time)].to_lmn(),
        uvws,
        frequencies,
        phases,
        options,
    );
    Ok(())
}

/// Calculate complex phases for sources that don't move over the timesteps.
/// `lm` has shape `(nsrc, 2)`; `n` is derived from `l` and `m`. `uvws` has
/// shape `(ntime, nbl)` and the result has shape `(nsrc, ntime, nbl, nchan)`.
pub fn compute_phase_from_lm<F: RimeFloat>(
    lm: ArrayView2<F>,
    uvws: ArrayView2<Uvw<F>>,
    frequencies: ArrayView1<F>,
) -> Result<Array4<Complex<F>>, PhaseError> {
    let nsrc = lm.len_of(Axis(0));
    check_shape("lm", lm.shape(), &[nsrc, 2])?;
    let lmns = lm
        .outer_iter()
        .map(|lm| (lm[0], lm[1]).to_lmn())
        .collect::<Vec<_>>();

    let (ntime, nbl) = uvws.dim();
    let mut phases = Array4::zeros((nsrc, ntime, nbl, frequencies.len()));
    compute_phase_inner(
        |i_src, _| lmns[i_src],
        uvws,
        frequencies,
        phases.view_mut(),
        PhaseOptions::default(),
    );
    Ok(phases)
}

/// The number of frequencies that are zero or negative (or NaN).
fn count_non_positive<F: RimeFloat>(frequencies: ArrayView1<F>) -> usize {
    frequencies.iter().filter(|&&f| !(f > F::zero())).count()
}

/// Helper function. The shapes of the arrays must already be consistent.
fn compute_phase_inner<F, G>(
    direction: G,
    uvws: ArrayView2<Uvw<F>>,
    frequencies: ArrayView1<F>,
    mut phases: ArrayViewMut4<Complex<F>>,
    options: PhaseOptions,
) where
    F: RimeFloat,
    G: Fn(usize, usize) -> Lmn<F> + Sync,
{
    let (nsrc, ntime, nbl, nchan) = phases.dim();
    debug!(
        "Computing phases for {nsrc} sources, {ntime} timesteps, {nbl} baselines and {nchan} channels in {} precision",
        F::PRECISION
    );
    if options.validate {
        let num_bad = count_non_positive(frequencies);
        if num_bad > 0 {
            warn!("{num_bad} of {nchan} channel frequencies aren't positive; the phases are still computed but this is probably a mistake");
        }
    }

    let minus_two_pi_on_c = -(F::PI() + F::PI()) / F::from_f64_lossy(VEL_C);

    phases
        .outer_iter_mut()
        .into_par_iter()
        .enumerate()
        .for_each(|(i_src, mut phases_src)| {
            for (i_time, (mut phases_time, uvws_time)) in phases_src
                .outer_iter_mut()
                .zip(uvws.outer_iter())
                .enumerate()
            {
                let Lmn { l, m, n } = direction(i_src, i_time);
                for (mut phases_bl, uvw) in phases_time.outer_iter_mut().zip(uvws_time.iter()) {
                    let real_phase =
                        minus_two_pi_on_c * (uvw.u * l + uvw.v * m + uvw.w * (n - F::one()));
                    for (phase, &freq) in phases_bl.iter_mut().zip(frequencies.iter()) {
                        *phase = Complex::cis(real_phase * freq);
                    }
                }
            }
        });
}
