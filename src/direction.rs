// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{precision::RimeFloat, types::Lmn};

/// A trait that describes a sky direction in terms of direction cosines
/// relative to the phase centre. Types that only carry `l` and `m` derive `n`
/// with the usual `sqrt(1 - l^2 - m^2)` convention.
pub trait SkyDirection<F: RimeFloat>: Copy {
    /// Get the `l` direction cosine.
    fn get_l(&self) -> F;
    /// Get the `m` direction cosine.
    fn get_m(&self) -> F;
    /// Get the `n` direction cosine.
    fn get_n(&self) -> F;

    fn to_lmn(&self) -> Lmn<F> {
        Lmn {
            l: self.get_l(),
            m: self.get_m(),
            n: self.get_n(),
        }
    }
}

impl<F: RimeFloat, C: SkyDirection<F>> SkyDirection<F> for &C {
    fn get_l(&self) -> F {
        (*self).get_l()
    }

    fn get_m(&self) -> F {
        (*self).get_m()
    }

    fn get_n(&self) -> F {
        (*self).get_n()
    }
}

impl<F: RimeFloat> SkyDirection<F> for Lmn<F> {
    fn get_l(&self) -> F {
        self.l
    }

    fn get_m(&self) -> F {
        self.m
    }

    fn get_n(&self) -> F {
        self.n
    }

    fn to_lmn(&self) -> Lmn<F> {
        *self
    }
}

/// We assume that a tuple of floats is (l, m).
impl<F: RimeFloat> SkyDirection<F> for (F, F) {
    fn get_l(&self) -> F {
        self.0
    }

    fn get_m(&self) -> F {
        self.1
    }

    fn get_n(&self) -> F {
        (F::one() - self.0 * self.0 - self.1 * self.1).sqrt()
    }
}

/// We assume that a 3-element array is (l, m, n).
impl<F: RimeFloat> SkyDirection<F> for [F; 3] {
    fn get_l(&self) -> F {
        self[0]
    }

    fn get_m(&self) -> F {
        self[1]
    }

    fn get_n(&self) -> F {
        self[2]
    }
}
