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
    ClientSnafu, DecodeSnafu, GroundStationPass, OccultationPrediction, RawOccultation, RawPass,
    RecordKind, RequestSnafu, TrackingError,
};
use crate::io::{duration_from_str, duration_to_str, ConfigRepr};
use crate::time::{Duration, Epoch, Unit};
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;
use typed_builder::TypedBuilder;

/// Environment variable holding the bearer token of the tracking service, used when none is configured.
pub const TOKEN_ENV_VAR: &str = "OPSWEB_TOKEN";

/// Source of the occultation predictions and ground station passes.
pub trait TrackingSource {
    /// Occultations predicted from `start` until `end`, in spacecraft time.
    fn occultations(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<OccultationPrediction>, TrackingError>;

    /// Ground station passes from `start` until `end`, in ground station time.
    fn passes(&self, start: Epoch, end: Epoch) -> Result<Vec<GroundStationPass>, TrackingError>;
}

/// Formats the range bound in the query syntax of OPSWeb, e.g. `ge:2023-01-01T00:00:00Z`.
pub fn range_bound(operator: &str, epoch: Epoch) -> String {
    let (y, mm, dd, hh, min, s, _) = epoch.to_gregorian_utc();
    format!("{operator}:{y:04}-{mm:02}-{dd:02}T{hh:02}:{min:02}:{s:02}Z")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct OpsWebConfig {
    /// Root of the OPSWeb REST API, without trailing slash
    #[builder(setter(into))]
    pub base_url: String,
    #[builder(default = "tgo".to_string(), setter(into))]
    pub mission: String,
    /// Bearer token, read from the OPSWEB_TOKEN environment variable when unset
    #[builder(default, setter(strip_option, into))]
    pub token: Option<String>,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    #[builder(default = Unit::Second * 60)]
    pub timeout: Duration,
}

impl Default for OpsWebConfig {
    fn default() -> Self {
        Self::builder().base_url("").build()
    }
}

impl ConfigRepr for OpsWebConfig {}

impl OpsWebConfig {
    /// Endpoint of the provided kind of records.
    pub fn endpoint(&self, kind: RecordKind) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.mission,
            kind.event_type()
        )
    }
}

/// Blocking client of the OPSWeb REST API.
pub struct OpsWebClient {
    config: OpsWebConfig,
    token: Option<String>,
    client: reqwest::blocking::Client,
}

impl OpsWebClient {
    pub fn new(config: OpsWebConfig) -> Result<Self, TrackingError> {
        if config.base_url.trim().is_empty() {
            return Err(TrackingError::Endpoint {
                reason: "no base URL configured".to_string(),
            });
        }
        let timeout = std::time::Duration::from_secs_f64(config.timeout.to_seconds().max(0.0));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientSnafu)?;
        let token = config
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .filter(|token| !token.trim().is_empty());
        if token.is_none() {
            debug!("no OPSWeb token configured, requests are anonymous");
        }
        Ok(Self {
            config,
            token,
            client,
        })
    }

    /// Requests all of the records of this kind from `start` until `end` as a JSON array.
    fn request<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<T>, TrackingError> {
        if end <= start {
            return Err(TrackingError::InvalidRange { kind, start, end });
        }
        let url = self.config.endpoint(kind);
        debug!("requesting {url} from {start} until {end}");

        let mut request = self.client.get(&url).query(&[
            ("time_start", range_bound("ge", start)),
            ("time_end", range_bound("le", end)),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().context(RequestSnafu { kind, start, end })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TrackingError::Status {
                kind,
                start,
                end,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let records: Vec<T> = response.json().context(DecodeSnafu { kind, start, end })?;
        if records.is_empty() {
            warn!("OPSWeb returned no {kind} from {start} until {end}");
        } else {
            info!("OPSWeb returned {} {kind}", records.len());
        }
        Ok(records)
    }
}

impl TrackingSource for OpsWebClient {
    fn occultations(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<OccultationPrediction>, TrackingError> {
        self.request::<RawOccultation>(RecordKind::Occultations, start, end)?
            .into_iter()
            .map(OccultationPrediction::try_from)
            .collect()
    }

    fn passes(&self, start: Epoch, end: Epoch) -> Result<Vec<GroundStationPass>, TrackingError> {
        self.request::<RawPass>(RecordKind::Passes, start, end)?
            .into_iter()
            .map(GroundStationPass::try_from)
            .collect()
    }
}

impl fmt::Display for OpsWebClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "OPSWeb client for {} at {}",
            self.config.mission, self.config.base_url
        )
    }
}
