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

use super::{RecordKind, TrackingError};
use crate::io::{epoch_from_str, epoch_to_str, ConfigRepr};
use crate::time::{Duration, Epoch, Unit};
use serde::{Deserialize as _, Deserializer};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use typed_builder::TypedBuilder;

/// Parses an epoch as served by OPSWeb, e.g. `2023-05-01T12:34:56Z` or `2023-05-01T12:34:56.250+00:00`, always in UTC.
pub fn parse_service_epoch(s: &str) -> Result<Epoch, String> {
    let mut trimmed = s.trim();
    for suffix in ["Z", "z", "+00:00"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            trimmed = stripped;
            break;
        }
    }
    let normalized = trimmed.replacen(' ', "T", 1);
    Epoch::from_str(&format!("{normalized} UTC")).map_err(|e| format!("invalid epoch `{s}`: {e}"))
}

/// Parses a one way light time as served by OPSWeb, either `MM:SS` or `HH:MM:SS`, seconds may be fractional.
pub fn parse_owlt(s: &str) -> Result<Duration, String> {
    let fields: Vec<&str> = s.trim().split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [mm, ss] => ("0", *mm, *ss),
        [hh, mm, ss] => (*hh, *mm, *ss),
        _ => return Err(format!("invalid light time `{s}`")),
    };
    let hours: u32 = hours
        .parse()
        .map_err(|_| format!("invalid hours in light time `{s}`"))?;
    let minutes: u32 = minutes
        .parse()
        .map_err(|_| format!("invalid minutes in light time `{s}`"))?;
    let seconds: f64 = seconds
        .parse()
        .map_err(|_| format!("invalid seconds in light time `{s}`"))?;
    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return Err(format!("light time `{s}` out of bounds"));
    }
    Ok(Unit::Hour * i64::from(hours) + Unit::Minute * i64::from(minutes) + Unit::Second * seconds)
}

/// Deserializes the MSPA flag, which is either a boolean, a "true"/"false" string, or missing before 2023.
fn mspa_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(flag) => Some(flag),
        serde_json::Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Ground station pass record as returned by the tracking service.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawPass {
    pub groundstation: String,
    pub time_start: String,
    pub time_end: String,
    #[serde(default)]
    pub owlt: Option<String>,
    #[serde(default, deserialize_with = "mspa_flag")]
    pub mspa: Option<bool>,
}

/// Occultation prediction record as returned by the tracking service.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawOccultation {
    pub time_start: String,
    pub time_end: String,
}

/// A scheduled interval during which a ground station tracks the spacecraft.
///
/// Times are in ground station time; the corrected times remove the one way light time to express the pass in
/// spacecraft time, which is the time of the occultation predictions.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundStationPass {
    pub station: String,
    pub start: Epoch,
    pub end: Epoch,
    pub owlt: Duration,
    /// Multiple spacecraft per aperture flag, undefined before 2023
    pub mspa: Option<bool>,
}

impl GroundStationPass {
    pub fn start_corrected(&self) -> Epoch {
        self.start - self.owlt
    }

    pub fn end_corrected(&self) -> Epoch {
        self.end - self.owlt
    }

    /// Returns whether the light time corrected pass spans the whole interval.
    pub fn contains(&self, from: Epoch, to: Epoch) -> bool {
        self.start_corrected() <= from && self.end_corrected() >= to
    }
}

impl TryFrom<RawPass> for GroundStationPass {
    type Error = TrackingError;

    fn try_from(raw: RawPass) -> Result<Self, Self::Error> {
        let malformed = |reason: String| TrackingError::MalformedRecord {
            kind: RecordKind::Passes,
            reason,
        };
        let start = parse_service_epoch(&raw.time_start).map_err(malformed)?;
        let end = parse_service_epoch(&raw.time_end).map_err(malformed)?;
        if end < start {
            return Err(malformed(format!(
                "{} pass ends ({end}) before it starts ({start})",
                raw.groundstation
            )));
        }
        let owlt = match raw.owlt.as_deref() {
            Some(owlt) if !owlt.trim().is_empty() => parse_owlt(owlt).map_err(malformed)?,
            _ => Duration::ZERO,
        };
        Ok(Self {
            station: raw.groundstation.trim().to_string(),
            start,
            end,
            owlt,
            mspa: raw.mspa,
        })
    }
}

impl fmt::Display for GroundStationPass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} pass from {} until {} (OWLT {})",
            self.station, self.start, self.end, self.owlt
        )
    }
}

/// Occultation as predicted by the flight dynamics, in spacecraft time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OccultationPrediction {
    pub ingress: Epoch,
    pub egress: Epoch,
}

impl TryFrom<RawOccultation> for OccultationPrediction {
    type Error = TrackingError;

    fn try_from(raw: RawOccultation) -> Result<Self, Self::Error> {
        let malformed = |reason: String| TrackingError::MalformedRecord {
            kind: RecordKind::Occultations,
            reason,
        };
        let ingress = parse_service_epoch(&raw.time_start).map_err(malformed)?;
        let egress = parse_service_epoch(&raw.time_end).map_err(malformed)?;
        if egress <= ingress {
            return Err(malformed(format!(
                "occultation egress {egress} not after ingress {ingress}"
            )));
        }
        Ok(Self { ingress, egress })
    }
}

/// Selects the passes usable for the coverage computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct PassFilter {
    /// Ground stations whose passes are ignored
    #[builder(default = vec!["KLZ".to_string(), "BLK".to_string()])]
    pub excluded_stations: Vec<String>,
    /// Ignore the passes shared with other spacecraft (MSPA)
    #[builder(default = true)]
    pub exclude_mspa: bool,
}

impl Default for PassFilter {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for PassFilter {}

impl PassFilter {
    /// Returns whether this pass should be kept. A pass with an undefined MSPA flag is kept.
    pub fn keep(&self, pass: &GroundStationPass) -> bool {
        if self
            .excluded_stations
            .iter()
            .any(|station| station.eq_ignore_ascii_case(&pass.station))
        {
            return false;
        }
        !(self.exclude_mspa && pass.mspa == Some(true))
    }

    /// Filters the passes, keeping their order.
    pub fn apply(&self, passes: Vec<GroundStationPass>) -> Vec<GroundStationPass> {
        let total = passes.len();
        let kept: Vec<GroundStationPass> = passes.into_iter().filter(|p| self.keep(p)).collect();
        info!("kept {} of {total} passes", kept.len());
        kept
    }
}

/// Flat representation of a pass, one per line of the valid passes table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassRow {
    pub station: String,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub start: Epoch,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub end: Epoch,
    pub owlt_s: f64,
    pub mspa: Option<bool>,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub start_corrected: Epoch,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub end_corrected: Epoch,
}

impl From<&GroundStationPass> for PassRow {
    fn from(pass: &GroundStationPass) -> Self {
        Self {
            station: pass.station.clone(),
            start: pass.start,
            end: pass.end,
            owlt_s: pass.owlt.to_seconds(),
            mspa: pass.mspa,
            start_corrected: pass.start_corrected(),
            end_corrected: pass.end_corrected(),
        }
    }
}

impl From<PassRow> for GroundStationPass {
    fn from(row: PassRow) -> Self {
        Self {
            station: row.station,
            start: row.start,
            end: row.end,
            owlt: row.start - row.start_corrected,
            mspa: row.mspa,
        }
    }
}
