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

use crate::analysis::MatchError;
use crate::cosmic::EphemerisError;
use crate::io::{ConfigError, InputOutputError};
use crate::md::OccultationError;
use crate::od::TrackingError;
use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("ephemeris setup failed: {source}"))]
    EphemerisSetup { source: EphemerisError },
    #[snafu(display("occultation detection failed: {source}"))]
    Detection { source: OccultationError },
    #[snafu(display("coverage retrieval failed: {source}"))]
    Tracking { source: TrackingError },
    #[snafu(display("coverage matching failed: {source}"))]
    Matching { source: MatchError },
    #[snafu(display("{stage} output failed: {source}"))]
    Persistence {
        stage: &'static str,
        source: InputOutputError,
    },
    #[snafu(display("configuration error: {source}"))]
    Configuration { source: ConfigError },
    #[snafu(display("{stage} requires {what} to be configured"))]
    MissingSetting {
        stage: &'static str,
        what: &'static str,
    },
}
