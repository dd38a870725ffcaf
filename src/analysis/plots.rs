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

use super::{MatchedEvent, MatchedEvents};
use crate::io::{InputOutputError, StdIOSnafu};
use crate::md::OccultationPoint;
use crate::time::Epoch;
use plotly::color::NamedColor;
use plotly::common::{HoverInfo, Marker, MarkerSymbol, Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};
use serde::Serialize;
use snafu::ResultExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Quantity on the horizontal axis of a tangent latitude plot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlotAxis {
    Date,
    SolarZenithAngle,
    SolarLongitude,
}

impl PlotAxis {
    fn title(&self) -> &'static str {
        match self {
            Self::Date => "Date (UTC)",
            Self::SolarZenithAngle => "Solar zenith angle [deg]",
            Self::SolarLongitude => "Solar longitude Ls [deg]",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::SolarZenithAngle => "sza",
            Self::SolarLongitude => "ls",
        }
    }
}

/// Formats the epoch as a UTC date string which plotly reads as a date.
fn plot_date(epoch: Epoch) -> String {
    let (y, mm, dd, hh, min, s, _) = epoch.to_gregorian_utc();
    format!("{y:04}-{mm:02}-{dd:02} {hh:02}:{min:02}:{s:02}")
}

fn trace<X>(
    name: &str,
    color: NamedColor,
    x: Vec<X>,
    points: &[&OccultationPoint],
) -> Box<Scatter<X, f64>>
where
    X: Serialize + Clone + 'static,
{
    let y: Vec<f64> = points.iter().map(|p| p.latitude_deg).collect();
    let hover: Vec<String> = points
        .iter()
        .map(|p| {
            format!(
                "{} Ls = {:.1} deg, SZA = {:.1} deg",
                p.epoch, p.solar_longitude_deg, p.sza_deg
            )
        })
        .collect();

    Scatter::new(x, y)
        .mode(Mode::Markers)
        .name(format!("{name} (N = {})", points.len()))
        .marker(Marker::new().symbol(MarkerSymbol::Circle).color(color).size(4))
        .hover_text_array(hover)
        .hover_info(HoverInfo::All)
}

fn add_traces(
    plot: &mut Plot,
    name: &str,
    color: NamedColor,
    points: &[&OccultationPoint],
    axis: PlotAxis,
) {
    match axis {
        PlotAxis::Date => {
            let x: Vec<String> = points.iter().map(|p| plot_date(p.epoch)).collect();
            plot.add_trace(trace(name, color, x, points));
        }
        PlotAxis::SolarZenithAngle => {
            let x: Vec<f64> = points.iter().map(|p| p.sza_deg).collect();
            plot.add_trace(trace(name, color, x, points));
        }
        PlotAxis::SolarLongitude => {
            let x: Vec<f64> = points.iter().map(|p| p.solar_longitude_deg).collect();
            plot.add_trace(trace(name, color, x, points));
        }
    }
}

/// Builds the plot of the tangent point latitude of the events, with one trace for the ingresses and one for the egresses.
pub fn latitude_plot<'a, I>(title: &str, events: I, axis: PlotAxis) -> Plot
where
    I: IntoIterator<Item = &'a MatchedEvent>,
{
    let events: Vec<&MatchedEvent> = events.into_iter().collect();
    let ingresses: Vec<&OccultationPoint> = events.iter().map(|m| &m.event.ingress).collect();
    let egresses: Vec<&OccultationPoint> = events.iter().map(|m| &m.event.egress).collect();

    let layout = Layout::new()
        .title(Title::with_text(title))
        .x_axis(Axis::new().title(Title::with_text(axis.title())))
        .y_axis(
            Axis::new()
                .title(Title::with_text("Tangent point latitude [deg]"))
                .range(vec![-90.0, 90.0]),
        )
        .show_legend(true);

    let mut plot = Plot::new();
    plot.set_layout(layout);
    add_traces(&mut plot, "Ingress", NamedColor::Blue, &ingresses, axis);
    add_traces(&mut plot, "Egress", NamedColor::Red, &egresses, axis);
    plot
}

fn render_html(plot: &Plot, path: &Path) -> Result<(), InputOutputError> {
    let path_str = path.display().to_string();
    let mut file = File::create(path).context(StdIOSnafu {
        action: "creating plot",
        path: path_str.clone(),
    })?;
    file.write_all(plot.to_html().as_bytes()).context(StdIOSnafu {
        action: "writing plot",
        path: path_str,
    })
}

/// Renders the tangent latitude plots of all of the events and of the covered ones in the output directory.
///
/// Returns the paths of the HTML documents written.
pub fn render_plots<P: AsRef<Path>>(
    matched: &MatchedEvents,
    directory: P,
) -> Result<Vec<PathBuf>, InputOutputError> {
    let directory = directory.as_ref();
    std::fs::create_dir_all(directory).context(StdIOSnafu {
        action: "creating plot directory",
        path: directory.display().to_string(),
    })?;

    let mut written = Vec::new();
    for axis in [
        PlotAxis::Date,
        PlotAxis::SolarZenithAngle,
        PlotAxis::SolarLongitude,
    ] {
        let all = latitude_plot(
            &format!("All occultations ({})", matched.summary.total),
            matched.all(),
            axis,
        );
        let path = directory.join(format!("latitude_{}_all.html", axis.slug()));
        render_html(&all, &path)?;
        written.push(path);

        let covered = latitude_plot(
            &format!("Covered occultations ({})", matched.summary.covered),
            matched.covered(),
            axis,
        );
        let path = directory.join(format!("latitude_{}_covered.html", axis.slug()));
        render_html(&covered, &path)?;
        written.push(path);
    }

    info!("{} plots written to {}", written.len(), directory.display());
    Ok(written)
}
