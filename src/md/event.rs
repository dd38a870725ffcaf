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

use crate::cosmic::{EphemerisProvider, TangentPoint};
use crate::io::{epoch_from_str, epoch_to_str};
use crate::time::{Duration, Epoch};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use super::{DetailsSnafu, OccultationError};
use snafu::ResultExt;

/// Direction of a crossing of the limb separation signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossingEdge {
    /// The line of sight becomes blocked: the signal goes from non-negative to negative.
    Ingress,
    /// The line of sight clears: the signal goes from negative to non-negative.
    Egress,
}

impl CrossingEdge {
    /// Returns the edge of the transition between two samples of the limb separation, if any.
    pub fn between(prev_value: f64, next_value: f64) -> Option<Self> {
        match (prev_value < 0.0, next_value < 0.0) {
            (false, true) => Some(Self::Ingress),
            (true, false) => Some(Self::Egress),
            _ => None,
        }
    }
}

impl fmt::Display for CrossingEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ingress => write!(f, "ingress"),
            Self::Egress => write!(f, "egress"),
        }
    }
}

/// A refined zero crossing of the limb separation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Crossing {
    pub epoch: Epoch,
    pub edge: CrossingEdge,
    /// Width of the final bisection bracket
    pub pm_duration: Duration,
}

/// Geometry of the link at an occultation ingress or egress.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OccultationPoint {
    pub epoch: Epoch,
    /// Planetocentric latitude of the tangent point
    pub latitude_deg: f64,
    /// Planetocentric longitude of the tangent point, within [-180, 180]
    pub longitude_deg: f64,
    /// Solar zenith angle at the tangent point
    pub sza_deg: f64,
    /// Solar longitude (Ls) of the planet
    pub solar_longitude_deg: f64,
    /// Altitude of the ray above the reference sphere, near zero after refinement
    pub tangent_altitude_km: f64,
}

impl OccultationPoint {
    /// Computes the tangent point and season at the crossing epoch.
    pub fn compute<P: EphemerisProvider + ?Sized>(
        epoch: Epoch,
        provider: &P,
    ) -> Result<Self, OccultationError> {
        let tangent = provider
            .link_geometry(epoch)
            .context(DetailsSnafu { epoch })?
            .tangent_point();
        let solar_longitude_deg = provider
            .solar_longitude_deg(epoch)
            .context(DetailsSnafu { epoch })?;
        Ok(Self::from_tangent_point(epoch, tangent, solar_longitude_deg))
    }

    pub fn from_tangent_point(epoch: Epoch, tangent: TangentPoint, solar_longitude_deg: f64) -> Self {
        Self {
            epoch,
            latitude_deg: tangent.latitude_deg,
            longitude_deg: tangent.longitude_deg,
            sza_deg: tangent.sza_deg,
            solar_longitude_deg,
            tangent_altitude_km: tangent.altitude_km,
        }
    }
}

/// An occultation of the radio link, from ingress to egress.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OccultationEvent {
    /// Index of this event in the detector output
    pub id: usize,
    pub ingress: OccultationPoint,
    pub egress: OccultationPoint,
}

impl OccultationEvent {
    pub fn duration(&self) -> Duration {
        self.egress.epoch - self.ingress.epoch
    }

    /// Solar longitude of the event, taken at ingress.
    pub fn solar_longitude_deg(&self) -> f64 {
        self.ingress.solar_longitude_deg
    }

    /// Returns whether both events share some time.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.ingress.epoch < other.egress.epoch && other.ingress.epoch < self.egress.epoch
    }
}

impl fmt::Display for OccultationEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "occultation #{} from {} ({:.3} deg, {:.3} deg) until {} ({:.3} deg, {:.3} deg) lasting {}",
            self.id,
            self.ingress.epoch,
            self.ingress.latitude_deg,
            self.ingress.longitude_deg,
            self.egress.epoch,
            self.egress.latitude_deg,
            self.egress.longitude_deg,
            self.duration()
        )
    }
}

/// Flat representation of an occultation event, one per line of the detector output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: usize,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub ingress: Epoch,
    pub ingress_lat_deg: f64,
    pub ingress_long_deg: f64,
    pub ingress_sza_deg: f64,
    pub ingress_ls_deg: f64,
    pub ingress_alt_km: f64,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub egress: Epoch,
    pub egress_lat_deg: f64,
    pub egress_long_deg: f64,
    pub egress_sza_deg: f64,
    pub egress_ls_deg: f64,
    pub egress_alt_km: f64,
}

impl From<&OccultationEvent> for EventRow {
    fn from(event: &OccultationEvent) -> Self {
        Self {
            id: event.id,
            ingress: event.ingress.epoch,
            ingress_lat_deg: event.ingress.latitude_deg,
            ingress_long_deg: event.ingress.longitude_deg,
            ingress_sza_deg: event.ingress.sza_deg,
            ingress_ls_deg: event.ingress.solar_longitude_deg,
            ingress_alt_km: event.ingress.tangent_altitude_km,
            egress: event.egress.epoch,
            egress_lat_deg: event.egress.latitude_deg,
            egress_long_deg: event.egress.longitude_deg,
            egress_sza_deg: event.egress.sza_deg,
            egress_ls_deg: event.egress.solar_longitude_deg,
            egress_alt_km: event.egress.tangent_altitude_km,
        }
    }
}

impl From<EventRow> for OccultationEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            ingress: OccultationPoint {
                epoch: row.ingress,
                latitude_deg: row.ingress_lat_deg,
                longitude_deg: row.ingress_long_deg,
                sza_deg: row.ingress_sza_deg,
                solar_longitude_deg: row.ingress_ls_deg,
                tangent_altitude_km: row.ingress_alt_km,
            },
            egress: OccultationPoint {
                epoch: row.egress,
                latitude_deg: row.egress_lat_deg,
                longitude_deg: row.egress_long_deg,
                sza_deg: row.egress_sza_deg,
                solar_longitude_deg: row.egress_ls_deg,
                tangent_altitude_km: row.egress_alt_km,
            },
        }
    }
}
