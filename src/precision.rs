// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Floating-point precision selection.
//!
//! Both kernels are generic over [`RimeFloat`], which is implemented for `f32`
//! and `f64`. When the precision is only known at run time, the `*_dyn`
//! functions here take double-precision host data, run the requested
//! instantiation and hand back the result in a precision-tagged enum.


use std::fmt::{Debug, Display};

use log::debug;
use marlu::Jones;
use ndarray::prelude::*;
use num_complex::{Complex32, Complex64};
use num_traits::{Float, FloatConst};

use crate::{
    beam::{BeamCube, BeamError},
    phase::{compute_phase_with_options, PhaseError, PhaseOptions},
    types::{BeamCoord, Lmn, Uvw},
};

/// The precision used by a kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// `f32` reals, [`Complex32`] outputs.
    Single,

    /// `f64` reals, [`Complex64`] outputs.
    Double,
}

impl Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Precision::Single => "single",
                Precision::Double => "double",
            }
        )
    }
}

/// The float types the kernels can be instantiated with.
pub trait RimeFloat: Float + FloatConst + Debug + Display + Default + Send + Sync + 'static {
    /// The precision tag associated with this type.
    const PRECISION: Precision;

    /// Convert from an `f64`, rounding if this type is narrower.
    fn from_f64_lossy(x: f64) -> Self;

    /// Widen (or copy) to an `f64`.
    fn as_f64(self) -> f64;

    /// Convert an index into this type.
    fn from_index(i: usize) -> Self {
        Self::from_f64_lossy(i as f64)
    }
}

impl RimeFloat for f32 {
    const PRECISION: Precision = Precision::Single;

    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        x as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl RimeFloat for f64 {
    const PRECISION: Precision = Precision::Double;

    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        x
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Beam-response Jones matrices in either precision.
#[derive(Debug, Clone)]
pub enum JonesArray {
    Single(Vec<Jones<f32>>),
    Double(Vec<Jones<f64>>),
}

impl JonesArray {
    pub fn precision(&self) -> Precision {
        match self {
            JonesArray::Single(_) => Precision::Single,
            JonesArray::Double(_) => Precision::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            JonesArray::Single(v) => v.len(),
            JonesArray::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the results as double precision, widening if necessary.
    pub fn to_double(&self) -> Vec<Jones<f64>> {
        match self {
            JonesArray::Single(v) => v.iter().map(widen_jones).collect(),
            JonesArray::Double(v) => v.clone(),
        }
    }
}

fn widen_complex(c: Complex32) -> Complex64 {
    Complex64::new(f64::from(c.re), f64::from(c.im))
}

fn widen_jones(j: &Jones<f32>) -> Jones<f64> {
    Jones::from([
        widen_complex(j[0]),
        widen_complex(j[1]),
        widen_complex(j[2]),
        widen_complex(j[3]),
    ])
}

/// Complex phases in either precision, with shape (nsrc, ntime, nbl, nchan).
#[derive(Debug, Clone)]
pub enum PhaseArray {
    Single(Array4<Complex32>),
    Double(Array4<Complex64>),
}

impl PhaseArray {
    pub fn precision(&self) -> Precision {
        match self {
            PhaseArray::Single(_) => Precision::Single,
            PhaseArray::Double(_) => Precision::Double,
        }
    }

    pub fn dim(&self) -> (usize, usize, usize, usize) {
        match self {
            PhaseArray::Single(a) => a.dim(),
            PhaseArray::Double(a) => a.dim(),
        }
    }

    /// Get the results as double precision, widening if necessary.
    pub fn to_double(&self) -> Array4<Complex64> {
        match self {
            PhaseArray::Single(a) => a.mapv(widen_complex),
            PhaseArray::Double(a) => a.clone(),
        }
    }
}

/// Interpolate a beam cube at the precision requested at run time. The cube
/// and coordinates are supplied in double precision and narrowed if single
/// precision is requested.
pub fn interpolate_dyn(
    precision: Precision,
    cube: &BeamCube<f64>,
    coords: &[BeamCoord<f64>],
) -> Result<JonesArray, BeamError> {
    debug!("Interpolating {} beam coordinates in {precision} precision", coords.len());
    match precision {
        Precision::Single => {
            let cube = cube.cast::<f32>()?;
            let coords = coords.iter().map(|c| c.cast()).collect::<Vec<_>>();
            cube.interpolate(&coords).map(JonesArray::Single)
        }
        Precision::Double => cube.interpolate(coords).map(JonesArray::Double),
    }
}

/// Compute complex phases at the precision requested at run time. The inputs
/// are supplied in double precision and narrowed if single precision is
/// requested.
pub fn compute_phase_dyn(
    precision: Precision,
    directions: ArrayView2<Lmn<f64>>,
    uvws: ArrayView2<Uvw<f64>>,
    frequencies: ArrayView1<f64>,
    options: PhaseOptions,
) -> Result<PhaseArray, PhaseError> {
    debug!("Computing phases in {precision} precision");
    match precision {
        Precision::Single => {
            let directions = directions.mapv(|d| d.cast::<f32>());
            let uvws = uvws.mapv(|uvw| uvw.cast::<f32>());
            let frequencies = frequencies.mapv(|f| f as f32);
            compute_phase_with_options(
                directions.view(),
                uvws.view(),
                frequencies.view(),
                options,
            )
            .map(PhaseArray::Single)
        }
        Precision::Double => {
            compute_phase_with_options(directions, uvws, frequencies, options)
                .map(PhaseArray::Double)
        }
    }
}
