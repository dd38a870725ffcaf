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

use crate::analysis::{render_plots, CoverageMatcher, MatchedEvents};
use crate::cosmic::{AlmanacProvider, EphemerisProvider, GeometryConfig};
use crate::errors::{
    DetectionSnafu, EphemerisSetupSnafu, MatchingSnafu, MissingSettingSnafu, PersistenceSnafu,
    PipelineError, TrackingSnafu,
};
use crate::io::{
    epoch_from_str, epoch_to_str, read_table, write_table, ConfigError, ConfigRepr,
    InputOutputError, TableHeader,
};
use crate::md::{EventRow, OccultationEvent, OccultationLocator};
use crate::od::{
    CoverageFetcher, CoverageRecord, CoverageReport, OpsWebClient, OpsWebConfig, TrackingSource,
};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

/// Files written by each stage. A stage skips the outputs which are not set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    /// Detected occultation events
    pub events: Option<PathBuf>,
    /// All predicted occultations with their coverage
    pub occultations: Option<PathBuf>,
    /// Covered predicted occultations only
    pub covered: Option<PathBuf>,
    /// Passes kept for the coverage computation
    pub passes: Option<PathBuf>,
    /// Directory of the HTML plots
    pub plots: Option<PathBuf>,
}

/// Configuration of the whole analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// SPICE kernels loaded in order
    #[serde(default)]
    pub kernels: Vec<PathBuf>,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub start: Epoch,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub end: Epoch,
    #[serde(default)]
    pub detector: OccultationLocator,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub tracking: OpsWebConfig,
    #[serde(default)]
    pub coverage: CoverageFetcher,
    #[serde(default)]
    pub matcher: CoverageMatcher,
    #[serde(default)]
    pub output: OutputPaths,
}

impl ConfigRepr for PipelineConfig {}

impl PipelineConfig {
    /// Checks the analysis range, the stages check their own settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end <= self.start {
            return Err(ConfigError::InvalidConfig {
                msg: format!("end {} must be after start {}", self.end, self.start),
            });
        }
        Ok(())
    }
}

/// Runs the detector, the coverage fetcher and the matcher over the configured range.
#[derive(Clone, Debug)]
pub struct Pipeline {
    pub config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Builds the ephemeris provider from the configured kernels.
    pub fn ephemeris(&self) -> Result<AlmanacProvider, PipelineError> {
        if self.config.kernels.is_empty() {
            return MissingSettingSnafu {
                stage: "detection",
                what: "kernels",
            }
            .fail();
        }
        AlmanacProvider::from_kernels(&self.config.kernels, &self.config.geometry)
            .context(EphemerisSetupSnafu)
    }

    /// Builds the client of the tracking service.
    pub fn tracking_client(&self) -> Result<OpsWebClient, PipelineError> {
        OpsWebClient::new(self.config.tracking.clone()).context(TrackingSnafu)
    }

    /// Finds the occultations over the configured range, writing them if an output is configured.
    pub fn detect<P>(&self, provider: &P) -> Result<Vec<OccultationEvent>, PipelineError>
    where
        P: EphemerisProvider + ?Sized,
    {
        info!("Using {}", self.config.detector);
        let events = self
            .config
            .detector
            .find_events(provider, self.config.start, self.config.end)
            .context(DetectionSnafu)?;

        if let Some(path) = &self.config.output.events {
            write_events(path, &events).context(PersistenceSnafu { stage: "detection" })?;
        }
        Ok(events)
    }

    /// Fetches the tracking records over the configured range, writing them if outputs are configured.
    pub fn fetch<S>(&self, source: &S) -> Result<CoverageReport, PipelineError>
    where
        S: TrackingSource + ?Sized,
    {
        let report = self
            .config
            .coverage
            .fetch(source, self.config.start, self.config.end)
            .context(TrackingSnafu)?;

        let output = &self.config.output;
        if let Some(path) = &output.occultations {
            report
                .write_occultations(path)
                .context(PersistenceSnafu { stage: "coverage" })?;
        }
        if let Some(path) = &output.covered {
            report
                .write_covered(path)
                .context(PersistenceSnafu { stage: "coverage" })?;
        }
        if let Some(path) = &output.passes {
            report
                .write_passes(path)
                .context(PersistenceSnafu { stage: "coverage" })?;
        }
        Ok(report)
    }

    /// Matches the events with the coverage records and renders the plots if a plot directory is configured.
    ///
    /// Without an explicit analysis window, the matcher uses the configured range. Records of occultations which the
    /// detector may have truncated at the edges of the configured range are left out of the matching.
    pub fn match_events(
        &self,
        events: &[OccultationEvent],
        records: &[CoverageRecord],
    ) -> Result<MatchedEvents, PipelineError> {
        let mut matcher = self.config.matcher.clone();
        matcher.window_start = matcher.window_start.or(Some(self.config.start));
        matcher.window_end = matcher.window_end.or(Some(self.config.end));
        matcher.detection_range = Some((self.config.start, self.config.end));

        let matched = matcher
            .match_events(events, records)
            .context(MatchingSnafu)?;

        if let Some(dir) = &self.config.output.plots {
            render_plots(&matched, dir).context(PersistenceSnafu { stage: "matching" })?;
        }
        Ok(matched)
    }

    /// Matches the events and the coverage records previously written by the other stages.
    pub fn match_files(&self) -> Result<MatchedEvents, PipelineError> {
        let output = &self.config.output;
        let events_path = output.events.as_ref().context(MissingSettingSnafu {
            stage: "matching",
            what: "the events file",
        })?;
        let records_path = output.occultations.as_ref().context(MissingSettingSnafu {
            stage: "matching",
            what: "the occultations file",
        })?;

        let events = read_events(events_path).context(PersistenceSnafu { stage: "matching" })?;
        let (_, records): (String, Vec<CoverageRecord>) =
            read_table(records_path).context(PersistenceSnafu { stage: "matching" })?;
        self.match_events(&events, &records)
    }

    /// Runs all three stages in memory.
    pub fn run<P, S>(&self, provider: &P, source: &S) -> Result<MatchedEvents, PipelineError>
    where
        P: EphemerisProvider + ?Sized,
        S: TrackingSource + ?Sized,
    {
        let events = self.detect(provider)?;
        let report = self.fetch(source)?;
        self.match_events(&events, &report.occultations)
    }
}

/// Writes the events as a table, one row per event.
pub fn write_events<P: AsRef<Path>>(
    path: P,
    events: &[OccultationEvent],
) -> Result<(), InputOutputError> {
    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    write_table(path, &TableHeader::new("occultation events"), &rows)
}

/// Reads the events written by [`write_events`], in file order.
pub fn read_events<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<OccultationEvent>, InputOutputError> {
    let (title, rows): (String, Vec<EventRow>) = read_table(path)?;
    debug!("read table `{title}`");
    Ok(rows.into_iter().map(OccultationEvent::from).collect())
}
