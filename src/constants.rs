// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.
 */

pub use marlu::constants::VEL_C;

/// The number of polarisations handled by the beam kernel (xx, xy, yx, yy).
pub const EBEAM_NPOL: usize = 4;

/// The number of values describing the extents of a beam cube: lower l, lower
/// m, lower frequency, upper l, upper m, upper frequency.
pub const NUM_BEAM_EXTENTS: usize = 6;

/// A beam cube needs at least this many samples along each axis to be
/// interpolated.
pub const MIN_BEAM_AXIS_LEN: usize = 2;
