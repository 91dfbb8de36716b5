// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with the phase kernel.

use thiserror::Error;

use crate::errors::ConfigurationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
}
