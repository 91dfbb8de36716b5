// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Errors associated with malformed kernel configurations. These are detected
before any computation begins; no partial output is ever written.
 */

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("The beam cube's {axis} axis has {got} samples, but at least {min} are required for interpolation")]
    BeamAxisTooShort {
        axis: &'static str,
        got: usize,
        min: usize,
    },

    #[error("The beam cube's polarisation axis has {got} elements, but expected {expected}")]
    BeamPolCount { expected: usize, got: usize },

    #[error("Expected {expected} beam cube samples from the dimensions, but got {got}")]
    BeamDataLength { expected: usize, got: usize },

    #[error("Expected {expected} beam extents, but got {got}")]
    ExtentsLength { expected: usize, got: usize },

    #[error("The {axis} beam extents ({lower}, {upper}) are invalid; they must be finite and lower must be less than upper")]
    BadExtents {
        axis: &'static str,
        lower: f64,
        upper: f64,
    },

    #[error("The beam frequency map has {got} entries, but the beam cube has {expected} frequency planes")]
    FreqMapLength { expected: usize, got: usize },

    #[error("The beam frequency map must be finite and strictly ascending (problem at index {index})")]
    FreqMapNotAscending { index: usize },

    #[error("Array '{name}' has shape {got:?}, but expected {expected:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("The number of elements in '{name}' is too big to be addressed")]
    SizeOverflow { name: &'static str },

    #[error("Array '{name}' has length {got}, but expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        got: usize,
    },
}
