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

use super::{
    GroundStationPass, InvalidRangeSnafu, OccultationPrediction, PassFilter, PassRow, RecordKind,
    TrackingError, TrackingSource,
};
use crate::io::{
    duration_from_str, duration_to_str, epoch_from_str, epoch_to_str, write_table, ConfigRepr,
    InputOutputError, TableHeader,
};
use crate::time::{Duration, Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use std::path::Path;
use typed_builder::TypedBuilder;

/// Whether an occultation was tracked by a ground station.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Covered,
    NotCovered,
    /// Before the tracking data allows a decision
    Undefined,
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Covered => write!(f, "covered"),
            Self::NotCovered => write!(f, "not covered"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

/// How the passes must span an occultation for it to be covered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// A single pass spans the occultation and both margins
    #[default]
    SinglePass,
    /// The ingress and its leading margin are spanned by a pass, the egress and its trailing margin by a possibly
    /// different one
    IndependentEdges,
}

/// Criteria deciding whether an occultation is covered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct CoverageCriteria {
    /// Tracking time required before the ingress and after the egress
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    #[builder(default = Unit::Minute * 10)]
    pub margin: Duration,
    /// Occultations before this epoch are undefined
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    #[builder(default = Epoch::from_gregorian_utc_at_midnight(2023, 1, 1))]
    pub defined_from: Epoch,
    #[builder(default)]
    pub mode: CoverageMode,
}

impl Default for CoverageCriteria {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for CoverageCriteria {}

impl CoverageCriteria {
    /// Computes the coverage of the occultation by the provided light time corrected passes.
    ///
    /// Adding passes never turns a covered occultation into a not covered one.
    pub fn coverage_of(
        &self,
        ingress: Epoch,
        egress: Epoch,
        passes: &[GroundStationPass],
    ) -> Coverage {
        if ingress < self.defined_from {
            return Coverage::Undefined;
        }
        let covered = match self.mode {
            CoverageMode::SinglePass => passes
                .iter()
                .any(|pass| pass.contains(ingress - self.margin, egress + self.margin)),
            CoverageMode::IndependentEdges => {
                passes
                    .iter()
                    .any(|pass| pass.contains(ingress - self.margin, ingress))
                    && passes
                        .iter()
                        .any(|pass| pass.contains(egress, egress + self.margin))
            }
        };
        if covered {
            Coverage::Covered
        } else {
            Coverage::NotCovered
        }
    }
}

/// Coverage of a predicted occultation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub id: usize,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub ingress: Epoch,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub egress: Epoch,
    pub coverage: Coverage,
}

impl fmt::Display for CoverageRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "record #{} from {} until {}: {}",
            self.id, self.ingress, self.egress, self.coverage
        )
    }
}

/// Output of the coverage fetcher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverageReport {
    /// All predicted occultations, sorted by egress then ingress
    pub occultations: Vec<CoverageRecord>,
    /// Valid passes, sorted by end then start
    pub passes: Vec<GroundStationPass>,
}

impl CoverageReport {
    pub fn covered(&self) -> impl Iterator<Item = &CoverageRecord> + '_ {
        self.occultations
            .iter()
            .filter(|record| record.coverage == Coverage::Covered)
    }

    pub fn write_occultations<P: AsRef<Path>>(&self, path: P) -> Result<(), InputOutputError> {
        write_table(path, &TableHeader::new("occultations"), &self.occultations)
    }

    pub fn write_covered<P: AsRef<Path>>(&self, path: P) -> Result<(), InputOutputError> {
        let covered: Vec<CoverageRecord> = self.covered().copied().collect();
        write_table(path, &TableHeader::new("covered occultations"), &covered)
    }

    pub fn write_passes<P: AsRef<Path>>(&self, path: P) -> Result<(), InputOutputError> {
        let rows: Vec<PassRow> = self.passes.iter().map(PassRow::from).collect();
        write_table(path, &TableHeader::new("valid passes"), &rows)
    }
}

/// Retrieves the occultation predictions and the passes, and computes the coverage of each occultation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct CoverageFetcher {
    #[builder(default)]
    pub criteria: CoverageCriteria,
    #[builder(default)]
    pub filter: PassFilter,
}

impl ConfigRepr for CoverageFetcher {}

impl CoverageFetcher {
    /// Fetches all of the records from `start` until `end`. Any failure of the source aborts the whole fetch.
    pub fn fetch<S>(
        &self,
        source: &S,
        start: Epoch,
        end: Epoch,
    ) -> Result<CoverageReport, TrackingError>
    where
        S: TrackingSource + ?Sized,
    {
        ensure!(
            end > start,
            InvalidRangeSnafu {
                kind: RecordKind::Occultations,
                start,
                end
            }
        );

        let mut predictions = source.occultations(start, end)?;
        if predictions.is_empty() {
            warn!("no occultation predicted from {start} until {end}");
        }
        let passes = source.passes(start, end)?;
        if passes.is_empty() {
            warn!("no pass scheduled from {start} until {end}");
        }

        let mut passes = self.filter.apply(passes);
        passes.sort_by(|p1, p2| (p1.end, p1.start).cmp(&(p2.end, p2.start)));
        predictions.sort_by(|o1, o2| (o1.egress, o1.ingress).cmp(&(o2.egress, o2.ingress)));

        let occultations: Vec<CoverageRecord> = predictions
            .iter()
            .enumerate()
            .map(|(id, OccultationPrediction { ingress, egress })| CoverageRecord {
                id,
                ingress: *ingress,
                egress: *egress,
                coverage: self.criteria.coverage_of(*ingress, *egress, &passes),
            })
            .collect();

        let report = CoverageReport {
            occultations,
            passes,
        };

        info!(
            "{} of {} predicted occultations covered by {} passes",
            report.covered().count(),
            report.occultations.len(),
            report.passes.len()
        );

        Ok(report)
    }
}
