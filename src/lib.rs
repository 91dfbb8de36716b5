// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Radio interferometer measurement equation (RIME) kernels: sampling a complex
beam cube with trilinear interpolation, and calculating the complex phase of
sky sources on baselines.
 */

pub mod beam;
mod constants;
pub mod dims;
mod direction;
pub mod errors;
mod ffi;
pub mod phase;
pub mod precision;
mod types;

pub use beam::{BeamCube, BeamCubeView, BeamError, BeamExtents, EBeamInputs};
pub use constants::{EBEAM_NPOL, VEL_C};
pub use dims::{BeamDims, RimeDims};
pub use direction::SkyDirection;
pub use errors::*;
pub use ffi::{
    rk_compute_phase_f32, rk_compute_phase_f64, rk_interpolate_beam_f32,
    rk_interpolate_beam_f64, rk_last_error_length, rk_last_error_message,
};
pub use phase::{
    compute_phase, compute_phase_from_lm, compute_phase_into, compute_phase_with_options,
    PhaseError, PhaseOptions,
};
pub use precision::{
    compute_phase_dyn, interpolate_dyn, JonesArray, PhaseArray, Precision, RimeFloat,
};
pub use types::{BeamCoord, Lmn, Uvw};

// Re-exports.
pub use marlu::{c32, c64, Jones};
