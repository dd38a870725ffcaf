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

use super::{InvalidWindowSnafu, MatchError};
use crate::io::{
    duration_from_str, duration_to_str, epoch_from_str, epoch_to_str, maybe_epoch_from_str,
    maybe_epoch_to_str, ConfigRepr,
};
use crate::md::OccultationEvent;
use crate::od::{Coverage, CoverageRecord};
use crate::time::{Duration, Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use typed_builder::TypedBuilder;

/// Coverage of a detected occultation once cross-referenced with the tracking records.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Covered,
    NotCovered,
    /// Before the tracking data allows a decision
    Undefined,
    /// No tracking record corresponds to this occultation
    Unknown,
}

impl From<Coverage> for CoverageStatus {
    fn from(coverage: Coverage) -> Self {
        match coverage {
            Coverage::Covered => Self::Covered,
            Coverage::NotCovered => Self::NotCovered,
            Coverage::Undefined => Self::Undefined,
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Covered => write!(f, "covered"),
            Self::NotCovered => write!(f, "not covered"),
            Self::Undefined => write!(f, "undefined"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatchedEvent {
    pub event: OccultationEvent,
    pub status: CoverageStatus,
    /// Identifier of the coverage record matched to this event, if any
    pub record_id: Option<usize>,
}

/// Coverage statistics of a set of matched events.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub total: usize,
    /// Events whose coverage is not undefined
    pub defined: usize,
    pub covered: usize,
    pub not_covered: usize,
    pub unknown: usize,
    pub undefined: usize,
}

impl CoverageSummary {
    pub fn from_statuses<I: IntoIterator<Item = CoverageStatus>>(statuses: I) -> Self {
        let mut summary = Self::default();
        for status in statuses {
            summary.total += 1;
            match status {
                CoverageStatus::Covered => summary.covered += 1,
                CoverageStatus::NotCovered => summary.not_covered += 1,
                CoverageStatus::Unknown => summary.unknown += 1,
                CoverageStatus::Undefined => summary.undefined += 1,
            }
        }
        summary.defined = summary.total - summary.undefined;
        summary
    }

    /// Percentage of the defined events which are covered, or None without defined events.
    pub fn coverage_percent(&self) -> Option<f64> {
        if self.defined == 0 {
            None
        } else {
            Some(100.0 * self.covered as f64 / self.defined as f64)
        }
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} occultations: {} covered, {} not covered, {} unknown, {} undefined",
            self.total, self.covered, self.not_covered, self.unknown, self.undefined
        )?;
        if let Some(percent) = self.coverage_percent() {
            write!(f, " ({percent:.1} % of the {} defined ones covered)", self.defined)?;
        }
        Ok(())
    }
}

/// Detected occultations with their coverage, sorted by ingress.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchedEvents {
    pub events: Vec<MatchedEvent>,
    pub summary: CoverageSummary,
    /// Number of coverage records outside of the analysis window
    pub records_outside: usize,
}

impl MatchedEvents {
    pub fn all(&self) -> impl Iterator<Item = &MatchedEvent> + '_ {
        self.events.iter()
    }

    pub fn covered(&self) -> impl Iterator<Item = &MatchedEvent> + '_ {
        self.events
            .iter()
            .filter(|matched| matched.status == CoverageStatus::Covered)
    }
}

/// Associates each detected occultation with the coverage record whose ingress is the nearest, within a tolerance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct CoverageMatcher {
    /// Maximum ingress difference between an event and its record
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    #[builder(default = Unit::Second * 60)]
    pub tolerance: Duration,
    /// Events before this epoch are undefined
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    #[builder(default = Epoch::from_gregorian_utc_at_midnight(2023, 1, 1))]
    pub defined_from: Epoch,
    /// Start of the analysis window on the ingress epoch
    #[serde(
        serialize_with = "maybe_epoch_to_str",
        deserialize_with = "maybe_epoch_from_str"
    )]
    #[builder(default, setter(strip_option))]
    pub window_start: Option<Epoch>,
    /// End of the analysis window on the ingress epoch
    #[serde(
        serialize_with = "maybe_epoch_to_str",
        deserialize_with = "maybe_epoch_from_str"
    )]
    #[builder(default, setter(strip_option))]
    pub window_end: Option<Epoch>,
    /// Range searched by the detector. A record which may correspond to an occultation truncated by this range is
    /// outside of the analysis, since its event cannot have been detected.
    #[serde(skip)]
    #[builder(default, setter(strip_option))]
    pub detection_range: Option<(Epoch, Epoch)>,
}

impl Default for CoverageMatcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for CoverageMatcher {}

impl CoverageMatcher {
    fn in_window(&self, epoch: Epoch) -> bool {
        self.window_start.map_or(true, |start| epoch >= start)
            && self.window_end.map_or(true, |end| epoch <= end)
    }

    /// Whether the record, widened by the tolerance, lies strictly within the detection range.
    fn clear_of_range_edges(&self, record: &CoverageRecord) -> bool {
        self.detection_range.map_or(true, |(start, end)| {
            record.ingress - self.tolerance > start && record.egress + self.tolerance < end
        })
    }

    /// Matches the events with the coverage records.
    ///
    /// # Errors
    /// Every record in the window, and clear of the edges of the detection range, must match exactly one event, and
    /// no event may match two records.
    pub fn match_events(
        &self,
        events: &[OccultationEvent],
        records: &[CoverageRecord],
    ) -> Result<MatchedEvents, MatchError> {
        if let (Some(start), Some(end)) = (self.window_start, self.window_end) {
            ensure!(end > start, InvalidWindowSnafu { start, end });
        }
        if let Some((start, end)) = self.detection_range {
            ensure!(end > start, InvalidWindowSnafu { start, end });
        }

        let mut events: Vec<OccultationEvent> = events
            .iter()
            .filter(|event| self.in_window(event.ingress.epoch))
            .copied()
            .collect();
        events.sort_by(|e1, e2| e1.ingress.epoch.cmp(&e2.ingress.epoch));

        let (records, outside): (Vec<&CoverageRecord>, Vec<&CoverageRecord>) = records
            .iter()
            .partition(|record| {
                self.in_window(record.ingress) && self.clear_of_range_edges(record)
            });
        if !outside.is_empty() {
            info!(
                "{} coverage records outside of the analysis window ignored",
                outside.len()
            );
        }

        let mut matches: Vec<Option<&CoverageRecord>> = vec![None; events.len()];
        for record in records {
            let index = self
                .nearest(&events, record.ingress)
                .ok_or(MatchError::UnmatchedRecord {
                    record_id: record.id,
                    ingress: record.ingress,
                })?;
            if matches[index].is_some() {
                return Err(MatchError::DuplicateMatch {
                    record_id: record.id,
                    ingress: record.ingress,
                    event_id: events[index].id,
                });
            }
            debug!("{record} matched to occultation #{}", events[index].id);
            matches[index] = Some(record);
        }

        let matched: Vec<MatchedEvent> = events
            .into_iter()
            .zip(matches)
            .map(|(event, record)| {
                let status = if event.ingress.epoch < self.defined_from {
                    CoverageStatus::Undefined
                } else {
                    record.map_or(CoverageStatus::Unknown, |record| record.coverage.into())
                };
                MatchedEvent {
                    event,
                    status,
                    record_id: record.map(|record| record.id),
                }
            })
            .collect();

        let summary = CoverageSummary::from_statuses(matched.iter().map(|m| m.status));
        info!("{summary}");

        Ok(MatchedEvents {
            events: matched,
            summary,
            records_outside: outside.len(),
        })
    }

    /// Index of the event whose ingress is the nearest to the provided epoch, if within tolerance.
    fn nearest(&self, sorted: &[OccultationEvent], ingress: Epoch) -> Option<usize> {
        let after = sorted.partition_point(|event| event.ingress.epoch < ingress);
        [after.checked_sub(1), Some(after)]
            .into_iter()
            .flatten()
            .filter(|&index| index < sorted.len())
            .map(|index| (index, (sorted[index].ingress.epoch - ingress).abs()))
            .filter(|(_, offset)| *offset <= self.tolerance)
            .min_by(|(_, o1), (_, o2)| o1.cmp(o2))
            .map(|(index, _)| index)
    }
}
