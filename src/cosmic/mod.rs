/*
    Radiocc, radio occultation analysis
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::time::Epoch;
use anise::errors::{AlmanacError, PhysicsError};
use snafu::prelude::*;

pub use anise::prelude::{Almanac, Frame, Orbit};

mod geometry;
pub use self::geometry::*;

mod provider;
pub use self::provider::*;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EphemerisError {
    #[snafu(display("{action} at {epoch} failed: {source}"))]
    EphemerisAlmanac {
        action: &'static str,
        epoch: Epoch,
        #[snafu(source(from(AlmanacError, Box::new)))]
        source: Box<AlmanacError>,
    },
    #[snafu(display("could not load kernel {path}: {source}"))]
    KernelLoad {
        path: String,
        #[snafu(source(from(AlmanacError, Box::new)))]
        source: Box<AlmanacError>,
    },
    #[snafu(display("physics error when {action}: {source}"))]
    EphemerisPhysics {
        action: &'static str,
        source: PhysicsError,
    },
    #[snafu(display("no ephemeris data at {epoch}: {reason}"))]
    NoCoverage { epoch: Epoch, reason: String },
}
