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

extern crate log;
extern crate pretty_env_logger;
extern crate radiocc;

use clap::{Parser, Subcommand};
use log::{error, info};
use radiocc::io::ConfigRepr;
use radiocc::pipeline::{Pipeline, PipelineConfig};
use radiocc::PipelineError;
use std::env::{set_var, var};
use std::path::PathBuf;

const LOG_VAR: &str = "RADIOCC_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "radiocc",
    version,
    about = "Radio occultations of a Mars orbiter and their ground station coverage."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// YAML pipeline configuration
    #[arg(short, long, value_name = "YAML")]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the occultations in the SPICE kernels and write them
    Detect(ConfigArgs),
    /// Fetch the predicted occultations and passes from OPSWeb and write their coverage
    Fetch(ConfigArgs),
    /// Match the written occultations with the written coverage, and plot them
    Match(ConfigArgs),
    /// Run all of the stages
    Run(ConfigArgs),
}

impl Command {
    fn config_path(&self) -> &PathBuf {
        match self {
            Self::Detect(args) | Self::Fetch(args) | Self::Match(args) | Self::Run(args) => {
                &args.config
            }
        }
    }
}

fn main() -> Result<(), PipelineError> {
    let cli = Cli::parse();

    if var(LOG_VAR).is_err() {
        set_var(LOG_VAR, "INFO");
    }

    if pretty_env_logger::try_init_custom_env(LOG_VAR).is_err() {
        println!("could not init logger");
    }

    let config_path = cli.command.config_path();
    let config = PipelineConfig::load(config_path)
        .and_then(|config| config.validate().map(|_| config))
        .map_err(|source| PipelineError::Configuration { source })?;
    info!("Loaded configuration `{}`", config_path.display());

    let pipeline = Pipeline::new(config);

    let outcome = match &cli.command {
        Command::Detect(_) => {
            let provider = pipeline.ephemeris()?;
            info!("{provider}");
            pipeline.detect(&provider).map(|events| {
                info!("{} occultations found", events.len());
            })
        }
        Command::Fetch(_) => {
            let client = pipeline.tracking_client()?;
            info!("{client}");
            pipeline.fetch(&client).map(|report| {
                info!(
                    "{} of {} occultations covered",
                    report.covered().count(),
                    report.occultations.len()
                );
            })
        }
        Command::Match(_) => pipeline.match_files().map(|matched| {
            info!("{}", matched.summary);
        }),
        Command::Run(_) => {
            let provider = pipeline.ephemeris()?;
            let client = pipeline.tracking_client()?;
            pipeline.run(&provider, &client).map(|matched| {
                info!("{}", matched.summary);
            })
        }
    };

    if let Err(e) = &outcome {
        error!("{e}");
    }
    outcome
}
