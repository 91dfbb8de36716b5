// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dimension records describing the problem size of a kernel invocation.

use crate::{
    constants::{EBEAM_NPOL, MIN_BEAM_AXIS_LEN},
    errors::ConfigurationError,
};

/// The sizes of the source, time, antenna and channel axes of a kernel
/// invocation. For the phase kernel, `na` is the number of baselines (or
/// antennas, if the UVWs are per antenna).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RimeDims {
    pub nsrc: usize,
    pub ntime: usize,
    pub na: usize,
    pub nchan: usize,
}

impl RimeDims {
    pub fn new(nsrc: usize, ntime: usize, na: usize, nchan: usize) -> RimeDims {
        RimeDims {
            nsrc,
            ntime,
            na,
            nchan,
        }
    }

    /// The number of polarisation-channel products (`nchan * 4`).
    pub fn npolchan(&self) -> usize {
        self.nchan * EBEAM_NPOL
    }

    /// The number of (source, time, antenna, channel) tuples.
    pub fn num_outputs(&self) -> usize {
        self.nsrc * self.ntime * self.na * self.nchan
    }
}

/// The number of samples along each axis of a beam cube. Instances of this
/// struct are always valid; each axis has at least two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamDims {
    lw: usize,
    mh: usize,
    nud: usize,
}

impl BeamDims {
    /// Create a new [`BeamDims`], checking that each axis can be interpolated
    /// over and that the total number of samples fits in a `usize`.
    pub fn new(lw: usize, mh: usize, nud: usize) -> Result<BeamDims, ConfigurationError> {
        for (axis, got) in [("l", lw), ("m", mh), ("frequency", nud)] {
            if got < MIN_BEAM_AXIS_LEN {
                return Err(ConfigurationError::BeamAxisTooShort {
                    axis,
                    got,
                    min: MIN_BEAM_AXIS_LEN,
                });
            }
        }
        checked_len("beam", &[lw, mh, nud, EBEAM_NPOL])?;
        Ok(BeamDims { lw, mh, nud })
    }

    /// The number of samples along the l axis.
    pub fn lw(&self) -> usize {
        self.lw
    }

    /// The number of samples along the m axis.
    pub fn mh(&self) -> usize {
        self.mh
    }

    /// The number of samples along the frequency axis.
    pub fn nud(&self) -> usize {
        self.nud
    }

    /// The shape of the beam cube, including the polarisation axis.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.lw, self.mh, self.nud, EBEAM_NPOL)
    }

    /// The total number of complex samples in the beam cube.
    pub fn num_samples(&self) -> usize {
        self.lw * self.mh * self.nud * EBEAM_NPOL
    }
}

/// Complain if an array's shape isn't what we expect.
pub(crate) fn check_shape(
    name: &'static str,
    got: &[usize],
    expected: &[usize],
) -> Result<(), ConfigurationError> {
    if got == expected {
        Ok(())
    } else {
        Err(ConfigurationError::ShapeMismatch {
            name,
            expected: expected.to_vec(),
            got: got.to_vec(),
        })
    }
}

/// The product of `dims`, or an error if it overflows.
pub(crate) fn checked_len(name: &'static str, dims: &[usize]) -> Result<usize, ConfigurationError> {
    dims.iter()
        .try_fold(1_usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ConfigurationError::SizeOverflow { name })
}

/// Complain if a slice's length isn't what we expect.
pub(crate) fn check_len(
    name: &'static str,
    got: usize,
    expected: usize,
) -> Result<(), ConfigurationError> {
    if got == expected {
        Ok(())
    } else {
        Err(ConfigurationError::LengthMismatch {
            name,
            expected,
            got,
        })
    }
}
