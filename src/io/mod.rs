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

use crate::time::{Duration, Epoch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::prelude::*;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

mod table;
pub use table::{read_table, write_table, TableHeader};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read configuration file: {source}"))]
    ReadError { source: std::io::Error },

    #[snafu(display("failed to parse YAML configuration file: {source}"))]
    ParseError { source: serde_yaml::Error },

    #[snafu(display("invalid configuration: {msg}"))]
    InvalidConfig { msg: String },
}

impl PartialEq for ConfigError {
    /// No two configuration errors match
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum InputOutputError {
    #[snafu(display("{action} {path} failed: {source}"))]
    StdIOError {
        action: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("{action} {path} failed: {source}"))]
    TableError {
        action: &'static str,
        path: String,
        source: csv::Error,
    },
    #[snafu(display("{path} is missing its table header"))]
    MissingHeader { path: String },
}

pub trait ConfigRepr: Debug + Sized + Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).context(ReadSnafu)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds "Self" from the provided string of a yaml
    fn loads(data: &str) -> Result<Self, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }
}

pub(crate) fn epoch_to_str<S>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{epoch}"))
}

/// A deserializer from Epoch string
pub(crate) fn epoch_from_str<'de, D>(deserializer: D) -> Result<Epoch, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Epoch::from_str(s.trim()).map_err(serde::de::Error::custom)
}

pub(crate) fn duration_to_str<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{duration}"))
}

/// A deserializer from Duration string
pub(crate) fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Duration::from_str(s.trim()).map_err(serde::de::Error::custom)
}

pub(crate) fn maybe_epoch_to_str<S>(epoch: &Option<Epoch>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if let Some(epoch) = epoch {
        epoch_to_str(epoch, serializer)
    } else {
        serializer.serialize_none()
    }
}

/// A deserializer from an optional Epoch string, where an empty string or a null is None.
pub(crate) fn maybe_epoch_from_str<'de, D>(deserializer: D) -> Result<Option<Epoch>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => Epoch::from_str(s.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod ut_io {
    use super::*;
    use serde_derive::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Window {
        #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
        start: Epoch,
        #[serde(
            serialize_with = "duration_to_str",
            deserialize_with = "duration_from_str"
        )]
        step: Duration,
        #[serde(
            default,
            serialize_with = "maybe_epoch_to_str",
            deserialize_with = "maybe_epoch_from_str"
        )]
        end: Option<Epoch>,
    }

    impl ConfigRepr for Window {}

    #[test]
    fn window_yaml() {
        let data = r#"
start: 2023-01-01T00:00:00 UTC
step: 1 s
"#;
        let window = Window::loads(data).unwrap();
        assert_eq!(
            window,
            Window {
                start: Epoch::from_gregorian_utc_at_midnight(2023, 1, 1),
                step: Duration::from_seconds(1.0),
                end: None,
            }
        );

        let reser = serde_yaml::to_string(&window).unwrap();
        assert_eq!(Window::loads(&reser).unwrap(), window);
    }

    #[test]
    fn bad_yaml() {
        assert!(Window::loads("start: yesterday\nstep: 1 s").is_err());
    }
}
