// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to interpolate antenna primary-beam ("E beam") responses from a
//! sampled beam cube.

mod error;
mod grid;

pub use error::BeamError;

use log::debug;
use marlu::Jones;
use ndarray::prelude::*;
use num_complex::Complex;
use rayon::prelude::*;

use crate::{
    constants::{EBEAM_NPOL, NUM_BEAM_EXTENTS},
    dims::{check_len, check_shape, BeamDims, RimeDims},
    errors::ConfigurationError,
    precision::RimeFloat,
    types::BeamCoord,
};
use grid::AxisPos;

/// The region of (l, m, frequency) space covered by a beam cube. Each axis of
/// the cube uniformly samples its extents, with the first and last samples
/// lying exactly on the lower and upper bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamExtents<F> {
    l: (F, F),
    m: (F, F),
    freq: (F, F),
}

impl<F: RimeFloat> BeamExtents<F> {
    /// Create new [`BeamExtents`] from (lower, upper) pairs. All values must be
    /// finite, each lower bound must be less than its upper bound and the span
    /// between them must be finite too.
    pub fn new(l: (F, F), m: (F, F), freq: (F, F)) -> Result<BeamExtents<F>, ConfigurationError> {
        for (axis, (lower, upper)) in [("l", l), ("m", m), ("frequency", freq)] {
            if !(lower.is_finite() && upper.is_finite() && lower < upper)
                || !(upper - lower).is_finite()
            {
                return Err(ConfigurationError::BadExtents {
                    axis,
                    lower: lower.as_f64(),
                    upper: upper.as_f64(),
                });
            }
        }
        Ok(BeamExtents { l, m, freq })
    }

    /// Create new [`BeamExtents`] from a flat slice of six values: lower l,
    /// lower m, lower frequency, upper l, upper m, upper frequency.
    pub fn from_slice(extents: &[F]) -> Result<BeamExtents<F>, ConfigurationError> {
        match extents {
            &[lower_l, lower_m, lower_freq, upper_l, upper_m, upper_freq] => Self::new(
                (lower_l, upper_l),
                (lower_m, upper_m),
                (lower_freq, upper_freq),
            ),
            _ => Err(ConfigurationError::ExtentsLength {
                expected: NUM_BEAM_EXTENTS,
                got: extents.len(),
            }),
        }
    }

    /// The (lower, upper) bounds of the l axis.
    pub fn l(&self) -> (F, F) {
        self.l
    }

    /// The (lower, upper) bounds of the m axis.
    pub fn m(&self) -> (F, F) {
        self.m
    }

    /// The (lower, upper) bounds of the frequency axis.
    pub fn freq(&self) -> (F, F) {
        self.freq
    }

    fn cast<F2: RimeFloat>(&self) -> Result<BeamExtents<F2>, ConfigurationError> {
        let c = |(lower, upper): (F, F)| {
            (
                F2::from_f64_lossy(lower.as_f64()),
                F2::from_f64_lossy(upper.as_f64()),
            )
        };
        // Extents that are distinct in one precision may collapse in another,
        // so validate again.
        BeamExtents::new(c(self.l), c(self.m), c(self.freq))
    }
}

/// Check the shape of beam-cube samples, which must be `(beam_lw, beam_mh,
/// beam_nud, 4)`.
fn cube_dims(dim: (usize, usize, usize, usize)) -> Result<BeamDims, ConfigurationError> {
    let (lw, mh, nud, npol) = dim;
    let dims = BeamDims::new(lw, mh, nud)?;
    if npol != EBEAM_NPOL {
        return Err(ConfigurationError::BeamPolCount {
            expected: EBEAM_NPOL,
            got: npol,
        });
    }
    Ok(dims)
}

/// A frequency map needs one finite frequency per frequency plane, in strictly
/// ascending order.
fn check_freq_map<F: RimeFloat>(freq_map: &[F], nud: usize) -> Result<(), ConfigurationError> {
    if freq_map.len() != nud {
        return Err(ConfigurationError::FreqMapLength {
            expected: nud,
            got: freq_map.len(),
        });
    }
    if let Some(index) = freq_map.iter().position(|f| !f.is_finite()) {
        return Err(ConfigurationError::FreqMapNotAscending { index });
    }
    if let Some(index) = freq_map.windows(2).position(|w| w[1] <= w[0]) {
        return Err(ConfigurationError::FreqMapNotAscending { index: index + 1 });
    }
    Ok(())
}

/// A sampled antenna voltage response, with axes (l, m, frequency,
/// polarisation).
#[derive(Debug, Clone)]
pub struct BeamCube<F: RimeFloat> {
    data: Array4<Complex<F>>,
    dims: BeamDims,
    extents: BeamExtents<F>,

    /// The frequency of each plane of the cube, if the frequency axis is not
    /// uniformly sampled over the frequency extents. Strictly ascending.
    freq_map: Option<Vec<F>>,
}

impl<F: RimeFloat> BeamCube<F> {
    /// Create a new [`BeamCube`]. `data` must have the shape `(beam_lw,
    /// beam_mh, beam_nud, 4)`, where each of the first three axes has at least
    /// two samples.
    pub fn new(
        data: Array4<Complex<F>>,
        extents: BeamExtents<F>,
    ) -> Result<BeamCube<F>, BeamError> {
        let dims = cube_dims(data.dim())?;
        Ok(BeamCube {
            data,
            dims,
            extents,
            freq_map: None,
        })
    }

    /// Create a new [`BeamCube`] from flat, row-major data (polarisation is
    /// the fastest-changing axis).
    pub fn from_vec(
        dims: BeamDims,
        data: Vec<Complex<F>>,
        extents: BeamExtents<F>,
    ) -> Result<BeamCube<F>, BeamError> {
        let got = data.len();
        let data = Array4::from_shape_vec(dims.shape(), data).map_err(|_| {
            ConfigurationError::BeamDataLength {
                expected: dims.num_samples(),
                got,
            }
        })?;
        Self::new(data, extents)
    }

    /// Attach the frequency of each frequency plane of the cube. When present,
    /// the frequency map is used to find the position of a frequency along the
    /// frequency axis instead of the frequency extents.
    pub fn with_freq_map(mut self, freq_map: Vec<F>) -> Result<BeamCube<F>, BeamError> {
        check_freq_map(&freq_map, self.dims.nud())?;
        self.freq_map = Some(freq_map);
        Ok(self)
    }

    pub fn dims(&self) -> BeamDims {
        self.dims
    }

    pub fn extents(&self) -> BeamExtents<F> {
        self.extents
    }

    pub fn freq_map(&self) -> Option<&[F]> {
        self.freq_map.as_deref()
    }

    pub fn data(&self) -> ArrayView4<Complex<F>> {
        self.data.view()
    }

    /// Borrow this cube as a [`BeamCubeView`].
    pub fn view(&self) -> BeamCubeView<F> {
        BeamCubeView {
            data: self.data.view(),
            dims: self.dims,
            extents: self.extents,
            freq_map: self.freq_map.as_deref(),
        }
    }

    /// Convert this cube to another precision.
    pub fn cast<F2: RimeFloat>(&self) -> Result<BeamCube<F2>, BeamError> {
        let data = self.data.mapv(|c| {
            Complex::new(
                F2::from_f64_lossy(c.re.as_f64()),
                F2::from_f64_lossy(c.im.as_f64()),
            )
        });
        let cube = BeamCube::new(data, self.extents.cast()?)?;
        match &self.freq_map {
            Some(freq_map) => cube.with_freq_map(
                freq_map
                    .iter()
                    .map(|f| F2::from_f64_lossy(f.as_f64()))
                    .collect(),
            ),
            None => Ok(cube),
        }
    }

    /// Interpolate the beam cube at each of the given coordinates. This is
    /// basically a wrapper around `interpolate_inner` that allocates the
    /// results. The number of parallel threads used can be controlled by
    /// setting `RAYON_NUM_THREADS`.
    ///
    /// Coordinates outside the cube's extents are clamped to the edge of the
    /// cube. Coordinates with non-finite values yield Jones matrices full of
    /// NaNs.
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::Array4;
    /// use num_complex::Complex64;
    /// use rime_kernels::{BeamCoord, BeamCube, BeamExtents};
    ///
    /// let data = Array4::from_shape_fn((2, 2, 2, 4), |(l, m, f, p)| {
    ///     Complex64::new((l + m + f) as f64, p as f64)
    /// });
    /// let extents = BeamExtents::new((0.0, 1.0), (0.0, 1.0), (1e9, 2e9)).unwrap();
    /// let cube = BeamCube::new(data, extents).unwrap();
    ///
    /// let coords = [BeamCoord::new(0.5, 0.5, 1.5e9), BeamCoord::new(0.0, 0.0, 1e9)];
    /// let results = cube.interpolate(&coords).unwrap();
    /// assert_eq!(results[0][0], Complex64::new(1.5, 0.0));
    /// assert_eq!(results[1][3], Complex64::new(0.0, 3.0));
    /// ```
    pub fn interpolate(&self, coords: &[BeamCoord<F>]) -> Result<Vec<Jones<F>>, BeamError> {
        self.view().interpolate(coords)
    }

    /// Interpolate the beam cube at each of the given coordinates. This is the
    /// same as `interpolate` but uses pre-allocated memory. `results` must
    /// have the same length as `coords`.
    pub fn interpolate_inner(
        &self,
        coords: &[BeamCoord<F>],
        results: &mut [Jones<F>],
    ) -> Result<(), BeamError> {
        self.view().interpolate_inner(coords, results)
    }

    /// Calculate the E-beam Jones matrix for every source, time, antenna and
    /// channel. The returned array has shape `(nsrc, ntime, na, nchan)`.
    ///
    /// For each (source, time, antenna, channel), the source's (l, m) is
    /// rotated by the antenna's parallactic angle, offset by the antenna's
    /// pointing error and multiplied by the antenna's scaling factors before
    /// the cube is interpolated at that position and the channel's frequency.
    pub fn calc_e_beam(&self, inputs: &EBeamInputs<F>) -> Result<Array4<Jones<F>>, BeamError> {
        self.view().calc_e_beam(inputs)
    }
}

/// A beam cube over borrowed samples (and frequency map). This is the same as
/// [`BeamCube`], but callers that already hold the samples don't need to copy
/// them.
#[derive(Debug, Clone, Copy)]
pub struct BeamCubeView<'a, F: RimeFloat> {
    data: ArrayView4<'a, Complex<F>>,
    dims: BeamDims,
    extents: BeamExtents<F>,
    freq_map: Option<&'a [F]>,
}

impl<'a, F: RimeFloat> BeamCubeView<'a, F> {
    /// Create a new [`BeamCubeView`]. The requirements on `data` are the same
    /// as for [`BeamCube::new`].
    pub fn new(
        data: ArrayView4<'a, Complex<F>>,
        extents: BeamExtents<F>,
    ) -> Result<BeamCubeView<'a, F>, BeamError> {
        let dims = cube_dims(data.dim())?;
        Ok(BeamCubeView {
            data,
            dims,
            extents,
            freq_map: None,
        })
    }

    /// Create a new [`BeamCubeView`] from flat, row-major data (polarisation
    /// is the fastest-changing axis).
    pub fn from_slice(
        dims: BeamDims,
        data: &'a [Complex<F>],
        extents: BeamExtents<F>,
    ) -> Result<BeamCubeView<'a, F>, BeamError> {
        let data = ArrayView4::from_shape(dims.shape(), data).map_err(|_| {
            ConfigurationError::BeamDataLength {
                expected: dims.num_samples(),
                got: data.len(),
            }
        })?;
        Self::new(data, extents)
    }

    /// The same as [`BeamCube::with_freq_map`].
    pub fn with_freq_map(mut self, freq_map: &'a [F]) -> Result<BeamCubeView<'a, F>, BeamError> {
        check_freq_map(freq_map, self.dims.nud())?;
        self.freq_map = Some(freq_map);
        Ok(self)
    }

    pub fn dims(&self) -> BeamDims {
        self.dims
    }

    pub fn extents(&self) -> BeamExtents<F> {
        self.extents
    }

    pub fn freq_map(&self) -> Option<&'a [F]> {
        self.freq_map
    }

    /// See [`BeamCube::interpolate`].
    pub fn interpolate(&self, coords: &[BeamCoord<F>]) -> Result<Vec<Jones<F>>, BeamError> {
        let mut results = vec![Jones::default(); coords.len()];
        self.interpolate_inner(coords, &mut results)?;
        Ok(results)
    }

    /// See [`BeamCube::interpolate_inner`].
    pub fn interpolate_inner(
        &self,
        coords: &[BeamCoord<F>],
        results: &mut [Jones<F>],
    ) -> Result<(), BeamError> {
        check_len("results", results.len(), coords.len())?;
        debug!(
            "Interpolating {} coordinates over a {}x{}x{} beam cube",
            coords.len(),
            self.dims.lw(),
            self.dims.mh(),
            self.dims.nud()
        );

        coords
            .par_iter()
            .zip(results.par_iter_mut())
            .for_each(|(coord, result)| {
                *result = self.lookup(coord.l, coord.m, self.freq_pos(coord.freq));
            });
        Ok(())
    }

    /// See [`BeamCube::calc_e_beam`].
    pub fn calc_e_beam(&self, inputs: &EBeamInputs<F>) -> Result<Array4<Jones<F>>, BeamError> {
        let dims = inputs.validate()?;
        debug!(
            "Calculating E beams for {} sources, {} timesteps, {} antennas and {} channels",
            dims.nsrc, dims.ntime, dims.na, dims.nchan
        );

        // Frequency positions are shared by all sources, times and antennas.
        let freq_positions = inputs
            .frequency
            .iter()
            .map(|&freq| self.freq_pos(freq))
            .collect::<Vec<_>>();

        let mut e_beam = Array4::from_elem(
            (dims.nsrc, dims.ntime, dims.na, dims.nchan),
            Jones::default(),
        );
        e_beam
            .outer_iter_mut()
            .into_par_iter()
            .zip(inputs.lm.outer_iter().into_par_iter())
            .for_each(|(mut e_beam_src, lm)| {
                let (l, m) = (lm[0], lm[1]);
                for (i_time, mut e_beam_time) in e_beam_src.outer_iter_mut().enumerate() {
                    for (i_ant, mut e_beam_ant) in e_beam_time.outer_iter_mut().enumerate() {
                        let (s_pa, c_pa) = inputs.parallactic_angles[(i_time, i_ant)].sin_cos();
                        let l_rot = l * c_pa - m * s_pa;
                        let m_rot = l * s_pa + m * c_pa;

                        for (i_chan, (jones, freq_pos)) in
                            e_beam_ant.iter_mut().zip(&freq_positions).enumerate()
                        {
                            let pe = inputs.point_errors.slice(s![i_time, i_ant, i_chan, ..]);
                            let scale = inputs.antenna_scaling.slice(s![i_ant, i_chan, ..]);
                            let l = (l_rot + pe[0]) * scale[0];
                            let m = (m_rot + pe[1]) * scale[1];
                            *jones = self.lookup(l, m, *freq_pos);
                        }
                    }
                }
            });

        Ok(e_beam)
    }

    fn freq_pos(&self, freq: F) -> Option<AxisPos<F>> {
        match self.freq_map {
            Some(freq_map) => AxisPos::from_freq_map(freq, freq_map),
            None => AxisPos::from_extent(freq, self.extents.freq, self.dims.nud()),
        }
    }

    fn lookup(&self, l: F, m: F, freq_pos: Option<AxisPos<F>>) -> Jones<F> {
        let l_pos = AxisPos::from_extent(l, self.extents.l, self.dims.lw());
        let m_pos = AxisPos::from_extent(m, self.extents.m, self.dims.mh());
        match (l_pos, m_pos, freq_pos) {
            (Some(l_pos), Some(m_pos), Some(freq_pos)) => self.trilinear(l_pos, m_pos, freq_pos),
            _ => nan_jones(),
        }
    }

    /// Weighted sum of the (up to) 8 samples surrounding a grid position.
    fn trilinear(&self, l: AxisPos<F>, m: AxisPos<F>, freq: AxisPos<F>) -> Jones<F> {
        let zero = Complex::new(F::zero(), F::zero());
        let mut pols = [zero; EBEAM_NPOL];
        for (i_l, w_l) in l.weights() {
            for (i_m, w_m) in m.weights() {
                for (i_freq, w_freq) in freq.weights() {
                    let weight = w_l * w_m * w_freq;
                    // Corners without weight contribute nothing, so samples
                    // at grid vertices come back untouched.
                    if weight == F::zero() {
                        continue;
                    }
                    let corner = self.data.slice(s![i_l, i_m, i_freq, ..]);
                    for (pol, &sample) in pols.iter_mut().zip(corner.iter()) {
                        *pol = *pol + sample * weight;
                    }
                }
            }
        }
        Jones::from(pols)
    }
}

fn nan_jones<F: RimeFloat>() -> Jones<F> {
    Jones::from([Complex::new(F::nan(), F::nan()); EBEAM_NPOL])
}

/// Per-source, per-time and per-antenna inputs to the E-beam calculation.
#[derive(Debug, Clone)]
pub struct EBeamInputs<'a, F> {
    /// Source direction cosines, shape `(nsrc, 2)`.
    pub lm: ArrayView2<'a, F>,

    /// Channel frequencies \[Hz\], shape `(nchan)`.
    pub frequency: ArrayView1<'a, F>,

    /// Antenna pointing errors in l and m, shape `(ntime, na, nchan, 2)`.
    pub point_errors: ArrayView4<'a, F>,

    /// Frequency-dependent antenna scaling factors in l and m, shape `(na,
    /// nchan, 2)`.
    pub antenna_scaling: ArrayView3<'a, F>,

    /// Antenna parallactic angles \[radians\], shape `(ntime, na)`.
    pub parallactic_angles: ArrayView2<'a, F>,
}

impl<'a, F: RimeFloat> EBeamInputs<'a, F> {
    /// The problem size implied by the source directions, frequencies and
    /// parallactic angles.
    pub fn dims(&self) -> RimeDims {
        let (ntime, na) = self.parallactic_angles.dim();
        RimeDims::new(self.lm.len_of(Axis(0)), ntime, na, self.frequency.len())
    }

    /// Check that all of the inputs agree on the problem size.
    pub fn validate(&self) -> Result<RimeDims, ConfigurationError> {
        let dims = self.dims();
        let RimeDims {
            nsrc,
            ntime,
            na,
            nchan,
        } = dims;
        check_shape("lm", self.lm.shape(), &[nsrc, 2])?;
        check_shape(
            "point_errors",
            self.point_errors.shape(),
            &[ntime, na, nchan, 2],
        )?;
        check_shape(
            "antenna_scaling",
            self.antenna_scaling.shape(),
            &[na, nchan, 2],
        )?;
        Ok(dims)
    }
}
