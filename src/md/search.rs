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

use super::{Crossing, CrossingEdge, OccultationError, OccultationLocator, RefinementSnafu};
use crate::cosmic::{EphemerisError, EphemerisProvider};
use crate::time::Epoch;
use snafu::ResultExt;

/// A valid evaluation of the limb separation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Sample {
    pub epoch: Epoch,
    pub value: f64,
}

/// Result of the scan of a contiguous set of samples.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChunkScan {
    /// First valid sample of the chunk
    pub first: Option<Sample>,
    /// Last valid sample of the chunk
    pub last: Option<Sample>,
    pub crossings: Vec<Crossing>,
    pub skipped: usize,
}

/// Evaluates the limb separation (in radians) at the provided epoch.
pub(crate) fn evaluate<P: EphemerisProvider + ?Sized>(
    provider: &P,
    epoch: Epoch,
) -> Result<f64, EphemerisError> {
    Ok(provider.link_geometry(epoch)?.limb_separation_rad())
}

/// Scans the provided epochs in order, refining every sign change between two consecutive valid samples.
///
/// Samples for which the ephemeris is not available are skipped. A candidate whose refinement fails is discarded.
pub(crate) fn scan_chunk<P, I>(locator: &OccultationLocator, provider: &P, epochs: I) -> ChunkScan
where
    P: EphemerisProvider + ?Sized,
    I: IntoIterator<Item = Epoch>,
{
    let mut scan = ChunkScan::default();
    let mut gap = false;

    for epoch in epochs {
        let value = match evaluate(provider, epoch) {
            Ok(value) => value,
            Err(e) => {
                warn!("skipping sample at {epoch}: {e}");
                scan.skipped += 1;
                gap = true;
                continue;
            }
        };
        let sample = Sample { epoch, value };

        if let Some(prev) = scan.last {
            if let Some(edge) = CrossingEdge::between(prev.value, sample.value) {
                if gap {
                    warn!(
                        "{edge} bracket {} -- {} spans skipped samples",
                        prev.epoch, sample.epoch
                    );
                }
                match bisect(locator, provider, prev, sample, edge) {
                    Ok(crossing) => scan.crossings.push(crossing),
                    Err(e) => error!("discarding {edge} candidate: {e}"),
                }
            }
        }

        gap = false;
        if scan.first.is_none() {
            scan.first = Some(sample);
        }
        scan.last = Some(sample);
    }

    scan
}

/// Refines the crossing bracketed by both samples by bisection.
///
/// The search stops when the bracket is narrower than the epoch precision of the locator, or after its maximum
/// number of iterations. The crossing is the middle of the final bracket.
pub(crate) fn bisect<P: EphemerisProvider + ?Sized>(
    locator: &OccultationLocator,
    provider: &P,
    lower: Sample,
    upper: Sample,
    edge: CrossingEdge,
) -> Result<Crossing, OccultationError> {
    let lower_blocked = lower.value < 0.0;
    let (mut xa, mut xb) = (lower.epoch, upper.epoch);

    for _ in 0..locator.max_iterations {
        if xb - xa <= locator.epoch_precision {
            return Ok(Crossing {
                epoch: xa + (xb - xa) * 0.5,
                edge,
                pm_duration: xb - xa,
            });
        }
        let xm = xa + (xb - xa) * 0.5;
        let ym = evaluate(provider, xm).context(RefinementSnafu {
            start: lower.epoch,
            end: upper.epoch,
        })?;
        if (ym < 0.0) == lower_blocked {
            xa = xm;
        } else {
            xb = xm;
        }
    }

    warn!(
        "{edge} bisection stopped after {} iterations with a bracket of {}",
        locator.max_iterations,
        xb - xa
    );
    Ok(Crossing {
        epoch: xa + (xb - xa) * 0.5,
        edge,
        pm_duration: xb - xa,
    })
}

/// Pairs the sorted crossings into (ingress, egress) arcs.
///
/// A leading egress and a trailing ingress are discarded: the search range starts or ends within an occultation.
pub(crate) fn pair_crossings(crossings: &[Crossing]) -> Vec<(Crossing, Crossing)> {
    let mut arcs = Vec::new();
    let mut pending: Option<Crossing> = None;

    for crossing in crossings {
        match crossing.edge {
            CrossingEdge::Ingress => {
                if let Some(prev) = pending.replace(*crossing) {
                    warn!(
                        "ingress at {} has no egress before the ingress at {}, discarding it",
                        prev.epoch, crossing.epoch
                    );
                }
            }
            CrossingEdge::Egress => match pending.take() {
                Some(ingress) => arcs.push((ingress, *crossing)),
                None => debug!("discarding egress at {} without ingress", crossing.epoch),
            },
        }
    }

    if let Some(ingress) = pending {
        debug!("discarding trailing ingress at {}", ingress.epoch);
    }

    arcs
}
