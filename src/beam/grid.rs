// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mapping of physical coordinates onto beam-cube grid positions.


use crate::precision::RimeFloat;

/// The two samples that bracket a position along one beam-cube axis, and the
/// weight toward the upper sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct AxisPos<F> {
    pub(super) lower: usize,
    pub(super) upper: usize,
    pub(super) frac: F,
}

impl<F: RimeFloat> AxisPos<F> {
    /// Get the bracketing samples for the fractional grid index `g`. Values
    /// outside `[0, len - 1]` (including infinities) are clamped to the
    /// nearest edge. `None` is returned if `g` is NaN.
    pub(super) fn from_grid(g: F, len: usize) -> Option<AxisPos<F>> {
        if g.is_nan() {
            return None;
        }
        let max = F::from_index(len - 1);
        let g = if g < F::zero() {
            F::zero()
        } else if g > max {
            max
        } else {
            g
        };

        let lower = g.floor().to_usize()?.min(len - 1);
        // At the top edge, there's no next sample; the weight toward it is 0.
        let upper = (lower + 1).min(len - 1);
        Some(AxisPos {
            lower,
            upper,
            frac: g - F::from_index(lower),
        })
    }

    /// Get the bracketing samples for `coord` along an axis that uniformly
    /// spans `[lower, upper]` with `len` samples.
    pub(super) fn from_extent(coord: F, (lower, upper): (F, F), len: usize) -> Option<AxisPos<F>> {
        if !coord.is_finite() {
            return None;
        }
        // A finite coordinate far outside the extents can overflow `g`; it
        // still gets clamped.
        let g = (coord - lower) / (upper - lower) * F::from_index(len - 1);
        Self::from_grid(g, len)
    }

    /// Get the bracketing samples for `freq` along a frequency axis sampled at
    /// the (strictly ascending) frequencies in `freq_map`. Frequencies beyond
    /// either end of the map are clamped to it.
    pub(super) fn from_freq_map(freq: F, freq_map: &[F]) -> Option<AxisPos<F>> {
        if !freq.is_finite() {
            return None;
        }
        let last = freq_map.len() - 1;
        let edge = |i| AxisPos {
            lower: i,
            upper: i,
            frac: F::zero(),
        };
        if freq <= freq_map[0] {
            return Some(edge(0));
        }
        if freq >= freq_map[last] {
            return Some(edge(last));
        }

        // The first map frequency strictly bigger than `freq`. Given the checks
        // above, this is in 1..=last.
        let upper = freq_map.partition_point(|&f| f <= freq);
        let lower = upper - 1;
        Some(AxisPos {
            lower,
            upper,
            frac: (freq - freq_map[lower]) / (freq_map[upper] - freq_map[lower]),
        })
    }

    /// The (index, weight) pairs for the two bracketing samples.
    pub(super) fn weights(&self) -> [(usize, F); 2] {
        [
            (self.lower, F::one() - self.frac),
            (self.upper, self.frac),
        ]
    }
}
