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

/*! # radiocc

Radio occultation analysis between a Mars orbiter and Earth.

The crate is organized as three stages:
+ [`md`] finds the occultation events from the ephemerides (the "detector"),
+ [`od`] fetches the ground station tracking records and tests which occultations are covered by a pass (the "fetcher"),
+ [`analysis`] matches both datasets, computes coverage statistics and renders the plots (the "matcher").

The [`pipeline`] module composes all three from a single [`pipeline::PipelineConfig`].
*/

/// Link geometry between the spacecraft, the occulting planet and the receiver, and the ephemeris provider seam.
pub mod cosmic;

/// Utility functions shared by different modules.
pub mod utils;

mod errors;
/// Functions which may fail in the pipeline return this error.
pub use self::errors::PipelineError;

/// All the input/output needs for this library: configuration files and the flat text tables exchanged between stages.
pub mod io;

/// Occultation event detection.
pub mod md;

/// Ground station tracking data and coverage computation.
pub mod od;

/// Matching of detected events with coverage records, statistics and plots.
pub mod analysis;

/// Composition of the three stages.
pub mod pipeline;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

pub use self::md::{OccultationEvent, OccultationLocator, OccultationPoint};
pub use self::od::{Coverage, CoverageRecord, GroundStationPass};
