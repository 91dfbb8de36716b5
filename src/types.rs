// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generic coordinate types.

use crate::precision::RimeFloat;

/// Direction cosines of a sky direction relative to the phase centre.
/// Normally `l^2 + m^2 + n^2 == 1`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lmn<F> {
    pub l: F,
    pub m: F,
    pub n: F,
}

impl<F: RimeFloat> Lmn<F> {
    /// Get the direction cosines from `l` and `m`, deriving `n` as
    /// `sqrt(1 - l^2 - m^2)`.
    pub fn from_lm(l: F, m: F) -> Lmn<F> {
        Lmn {
            l,
            m,
            n: (F::one() - l * l - m * m).sqrt(),
        }
    }

    /// The phase-tracking centre (`l = m = 0`, `n = 1`).
    pub fn phase_centre() -> Lmn<F> {
        Lmn {
            l: F::zero(),
            m: F::zero(),
            n: F::one(),
        }
    }

    pub fn cast<F2: RimeFloat>(self) -> Lmn<F2> {
        Lmn {
            l: F2::from_f64_lossy(self.l.as_f64()),
            m: F2::from_f64_lossy(self.m.as_f64()),
            n: F2::from_f64_lossy(self.n.as_f64()),
        }
    }
}

/// Baseline (or antenna) coordinates \[metres\].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Uvw<F> {
    pub u: F,
    pub v: F,
    pub w: F,
}

impl<F: RimeFloat> Uvw<F> {
    pub fn new(u: F, v: F, w: F) -> Uvw<F> {
        Uvw { u, v, w }
    }

    pub fn cast<F2: RimeFloat>(self) -> Uvw<F2> {
        Uvw {
            u: F2::from_f64_lossy(self.u.as_f64()),
            v: F2::from_f64_lossy(self.v.as_f64()),
            w: F2::from_f64_lossy(self.w.as_f64()),
        }
    }
}

/// A position to look up in a beam cube. The units match those of the cube's
/// extents; normally `l` and `m` are direction cosines and `freq` is in Hz.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BeamCoord<F> {
    pub l: F,
    pub m: F,
    pub freq: F,
}

impl<F: RimeFloat> BeamCoord<F> {
    pub fn new(l: F, m: F, freq: F) -> BeamCoord<F> {
        BeamCoord { l, m, freq }
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.m.is_finite() && self.freq.is_finite()
    }

    pub fn cast<F2: RimeFloat>(self) -> BeamCoord<F2> {
        BeamCoord {
            l: F2::from_f64_lossy(self.l.as_f64()),
            m: F2::from_f64_lossy(self.m.as_f64()),
            freq: F2::from_f64_lossy(self.freq.as_f64()),
        }
    }
}
