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

use super::search::{bisect, pair_crossings, scan_chunk, ChunkScan, Sample};
use super::{
    Crossing, CrossingEdge, InvalidRangeSnafu, InvalidSettingSnafu, OccultationError,
    OccultationEvent, OccultationPoint, StepSizeSnafu,
};
use crate::cosmic::EphemerisProvider;
use crate::io::{duration_from_str, duration_to_str, ConfigRepr};
use crate::time::{Duration, Epoch, Unit};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;
use std::ops::Range;
use typed_builder::TypedBuilder;

/// Finds the radio occultations of the link provided by an [`EphemerisProvider`].
///
/// The limb separation is sampled with a fixed step and every sign change is refined by bisection.
///
/// # Limitations
/// Any occultation shorter than the step may be missed entirely. The step is therefore a trade-off between
/// accuracy and run time: the default of one second is the one used for the TGO analyses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
#[serde(default)]
pub struct OccultationLocator {
    /// Sampling step of the limb separation
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    #[builder(default = Unit::Second * 1)]
    pub step: Duration,
    /// Bisection stops when the crossing is bracketed within this duration
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    #[builder(default = Unit::Millisecond * 1)]
    pub epoch_precision: Duration,
    /// Maximum number of bisection iterations per crossing
    #[builder(default = 50)]
    pub max_iterations: usize,
    /// Number of worker threads, defaults to the available parallelism
    #[builder(default, setter(strip_option))]
    pub workers: Option<usize>,
    /// Number of samples evaluated by a worker at once
    #[builder(default = 86_400)]
    pub chunk_samples: usize,
    /// Display a progress bar of the scan
    #[builder(default)]
    pub progress: bool,
}

impl Default for OccultationLocator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConfigRepr for OccultationLocator {}

impl fmt::Display for OccultationLocator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "occultation locator (step = {}, precision = {})",
            self.step, self.epoch_precision
        )
    }
}

impl OccultationLocator {
    /// Checks the settings of this locator and the search range.
    pub fn validate(&self, start: Epoch, end: Epoch) -> Result<(), OccultationError> {
        ensure!(end > start, InvalidRangeSnafu { start, end });
        ensure!(
            self.step > Duration::ZERO,
            StepSizeSnafu { step: self.step }
        );
        ensure!(
            self.epoch_precision > Duration::ZERO,
            InvalidSettingSnafu {
                name: "epoch precision",
                value: format!("{}", self.epoch_precision)
            }
        );
        ensure!(
            self.max_iterations > 0,
            InvalidSettingSnafu {
                name: "maximum iterations",
                value: "0".to_string()
            }
        );
        ensure!(
            self.chunk_samples > 0,
            InvalidSettingSnafu {
                name: "chunk samples",
                value: "0".to_string()
            }
        );
        ensure!(
            self.workers != Some(0),
            InvalidSettingSnafu {
                name: "workers",
                value: "0".to_string()
            }
        );
        Ok(())
    }

    /// Epoch of the i-th sample of the search, clamped to the end of the search.
    fn sample_epoch(&self, start: Epoch, end: Epoch, index: usize) -> Epoch {
        let epoch = start + self.step * (index as i64);
        if epoch > end {
            end
        } else {
            epoch
        }
    }

    /// Number of samples needed to cover the search range, including both ends.
    fn sample_count(&self, start: Epoch, end: Epoch) -> usize {
        ((end - start).to_seconds() / self.step.to_seconds()).ceil() as usize + 1
    }

    fn progress_bar(&self, num_chunks: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(num_chunks as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:100.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );
        pb.set_message(format!("{self}"));
        pb
    }

    /// Builds the fixed pool of workers used by the search.
    fn worker_pool(&self) -> Result<rayon::ThreadPool, OccultationError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.workers {
            builder = builder.num_threads(workers);
        }
        builder.build().map_err(|e| OccultationError::WorkerPool {
            reason: e.to_string(),
        })
    }

    /// Finds all of the zero crossings of the limb separation strictly within the search range, sorted by epoch.
    pub fn find_crossings<P>(
        &self,
        provider: &P,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<Crossing>, OccultationError>
    where
        P: EphemerisProvider + ?Sized,
    {
        self.validate(start, end)?;

        let num_samples = self.sample_count(start, end);
        let chunks: Vec<Range<usize>> = (0..num_samples)
            .step_by(self.chunk_samples)
            .map(|first| first..(first + self.chunk_samples).min(num_samples))
            .collect();

        info!(
            "Searching for occultations from {start} until {end} over {num_samples} samples in {} chunks",
            chunks.len()
        );

        let pool = self.worker_pool()?;
        let pb = self.progress_bar(chunks.len());

        // Each chunk is independent; collecting preserves the chunk order whatever the scheduling.
        let scans: Vec<ChunkScan> = pool.install(|| {
            chunks
                .par_iter()
                .progress_with(pb)
                .map(|indexes| {
                    scan_chunk(
                        self,
                        provider,
                        indexes.clone().map(|i| self.sample_epoch(start, end, i)),
                    )
                })
                .collect()
        });

        let skipped: usize = scans.iter().map(|scan| scan.skipped).sum();
        if skipped > 0 {
            warn!("{skipped} samples skipped because the ephemeris was not available");
        }

        let mut crossings: Vec<Crossing> = Vec::new();
        let mut prev_last: Option<Sample> = None;
        for scan in scans {
            // Stitch the boundary between this chunk and the previous one
            if let (Some(prev), Some(first)) = (prev_last, scan.first) {
                if let Some(edge) = CrossingEdge::between(prev.value, first.value) {
                    match bisect(self, provider, prev, first, edge) {
                        Ok(crossing) => crossings.push(crossing),
                        Err(e) => error!("discarding {edge} candidate: {e}"),
                    }
                }
            }
            if scan.last.is_some() {
                prev_last = scan.last;
            }
            crossings.extend(scan.crossings);
        }

        crossings.sort_by(|c1, c2| c1.epoch.cmp(&c2.epoch));
        crossings.retain(|c| c.epoch > start && c.epoch < end);

        Ok(crossings)
    }

    /// Finds the occultation events whose ingress and egress are strictly within the search range, sorted by ingress.
    ///
    /// The events are numbered from zero in chronological order. A candidate event whose tangent point cannot be
    /// computed is discarded and reported in the logs.
    pub fn find_events<P>(
        &self,
        provider: &P,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<OccultationEvent>, OccultationError>
    where
        P: EphemerisProvider + ?Sized,
    {
        let crossings = self.find_crossings(provider, start, end)?;
        let arcs = pair_crossings(&crossings);

        let points: Vec<Option<(OccultationPoint, OccultationPoint)>> =
            self.worker_pool()?.install(|| {
                arcs.par_iter()
                    .map(|(ingress, egress)| {
                        let details = OccultationPoint::compute(ingress.epoch, provider)
                            .and_then(|ingress_point| {
                                OccultationPoint::compute(egress.epoch, provider)
                                    .map(|egress_point| (ingress_point, egress_point))
                            });
                        match details {
                            Ok(points) => Some(points),
                            Err(e) => {
                                error!("discarding occultation from {}: {e}", ingress.epoch);
                                None
                            }
                        }
                    })
                    .collect()
            });

        let events: Vec<OccultationEvent> = points
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(id, (ingress, egress))| OccultationEvent {
                id,
                ingress,
                egress,
            })
            .collect();

        match events.len() {
            0 => info!("No occultation found from {start} until {end}"),
            1 => info!("Occultation found once on {}", events[0].ingress.epoch),
            n => info!(
                "Occultations found {n} times from {} until {}",
                events[0].ingress.epoch,
                events[n - 1].egress.epoch
            ),
        };

        Ok(events)
    }
}
