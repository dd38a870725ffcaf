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
use snafu::prelude::*;
use std::fmt;

mod coverage;
pub use coverage::*;

mod opsweb;
pub use opsweb::*;

mod pass;
pub use pass::*;

/// The two kinds of records served by the tracking data service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Occultations,
    Passes,
}

impl RecordKind {
    /// Name of this kind of records in the tracking service.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Occultations => "occultations",
            Self::Passes => "passes",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.event_type())
    }
}

/// Errors of the tracking data retrieval. All of them abort the retrieval of the given kind of records over the
/// given range: there is never a partial result.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TrackingError {
    #[snafu(display("{kind} request from {start} until {end} failed: {source}"))]
    Request {
        kind: RecordKind,
        start: Epoch,
        end: Epoch,
        source: reqwest::Error,
    },
    #[snafu(display("{kind} request from {start} until {end} returned {status}: {reason}"))]
    Status {
        kind: RecordKind,
        start: Epoch,
        end: Epoch,
        status: u16,
        reason: String,
    },
    #[snafu(display("{kind} response from {start} until {end} could not be decoded: {source}"))]
    Decode {
        kind: RecordKind,
        start: Epoch,
        end: Epoch,
        source: reqwest::Error,
    },
    #[snafu(display("malformed {kind} record: {reason}"))]
    MalformedRecord { kind: RecordKind, reason: String },
    #[snafu(display("{kind} range end {end} must be after the start {start}"))]
    InvalidRange {
        kind: RecordKind,
        start: Epoch,
        end: Epoch,
    },
    #[snafu(display("could not build the HTTP client: {source}"))]
    Client { source: reqwest::Error },
    #[snafu(display("tracking service misconfigured: {reason}"))]
    Endpoint { reason: String },
}
