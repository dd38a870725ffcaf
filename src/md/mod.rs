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

use crate::cosmic::EphemerisError;
use crate::time::{Duration, Epoch};
use snafu::prelude::*;

mod event;
pub use event::*;

mod locator;
pub use locator::*;

pub(crate) mod search;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum OccultationError {
    #[snafu(display("search end {end} must be after the start {start}"))]
    InvalidRange { start: Epoch, end: Epoch },
    #[snafu(display("invalid {name}: {value}"))]
    InvalidSetting { name: &'static str, value: String },
    #[snafu(display("invalid step size: {step}"))]
    StepSizeError { step: Duration },
    #[snafu(display("refining the crossing between {start} and {end} failed: {source}"))]
    Refinement {
        start: Epoch,
        end: Epoch,
        source: EphemerisError,
    },
    #[snafu(display("computing the tangent point at {epoch} failed: {source}"))]
    Details {
        epoch: Epoch,
        source: EphemerisError,
    },
    #[snafu(display("could not build the worker pool: {reason}"))]
    WorkerPool { reason: String },
}
