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

//! Cross-referencing of the detected occultations with the coverage records of the tracking service.

use crate::time::Epoch;
use snafu::prelude::*;

mod matcher;
pub use matcher::*;

mod plots;
pub use plots::*;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MatchError {
    #[snafu(display(
        "coverage record #{record_id} with ingress at {ingress} matches no detected occultation"
    ))]
    UnmatchedRecord { record_id: usize, ingress: Epoch },
    #[snafu(display(
        "coverage record #{record_id} with ingress at {ingress} matches occultation #{event_id} which already has a record"
    ))]
    DuplicateMatch {
        record_id: usize,
        ingress: Epoch,
        event_id: usize,
    },
    #[snafu(display("analysis window end {end} must be after its start {start}"))]
    InvalidWindow { start: Epoch, end: Epoch },
}
