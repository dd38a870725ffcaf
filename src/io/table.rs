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

use super::{InputOutputError, MissingHeaderSnafu, StdIOSnafu, TableSnafu};
use crate::time::Epoch;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::{ensure, ResultExt};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const COMMENT: u8 = b'#';

/// The comment line written at the top of every table exchanged between stages.
#[derive(Clone, Debug, PartialEq)]
pub struct TableHeader {
    pub title: String,
    pub created: Option<Epoch>,
}

impl TableHeader {
    /// Initializes a new header created now.
    pub fn new<S: Into<String>>(title: S) -> Self {
        let created = match Epoch::now() {
            Ok(epoch) => Some(epoch),
            Err(e) => {
                warn!("could not timestamp table: {e}");
                None
            }
        };
        Self {
            title: title.into(),
            created,
        }
    }
}

impl fmt::Display for TableHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.created {
            Some(created) => write!(f, "{} -- created on {created}", self.title),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Writes the rows to the provided path as a CSV table preceded by the header as a comment line.
pub fn write_table<P, T>(path: P, header: &TableHeader, rows: &[T]) -> Result<(), InputOutputError>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path_str = path.as_ref().display().to_string();
    let file = File::create(path.as_ref()).context(StdIOSnafu {
        action: "creating",
        path: path_str.clone(),
    })?;
    let mut buf = BufWriter::new(file);
    writeln!(buf, "{} {header}", COMMENT as char).context(StdIOSnafu {
        action: "writing header to",
        path: path_str.clone(),
    })?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(buf);
    for row in rows {
        wtr.serialize(row).context(TableSnafu {
            action: "writing row to",
            path: path_str.clone(),
        })?;
    }
    wtr.flush().context(StdIOSnafu {
        action: "flushing",
        path: path_str.clone(),
    })?;

    info!("wrote {} rows to {path_str}", rows.len());
    Ok(())
}

/// Reads the table stored at the provided path, returning the title of the table and its rows in file order.
pub fn read_table<P, T>(path: P) -> Result<(String, Vec<T>), InputOutputError>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path_str = path.as_ref().display().to_string();
    let file = File::open(path.as_ref()).context(StdIOSnafu {
        action: "opening",
        path: path_str.clone(),
    })?;
    let mut reader = BufReader::new(file);

    let mut first_line = String::new();
    reader.read_line(&mut first_line).context(StdIOSnafu {
        action: "reading header of",
        path: path_str.clone(),
    })?;
    ensure!(
        first_line.as_bytes().first() == Some(&COMMENT),
        MissingHeaderSnafu {
            path: path_str.clone()
        }
    );
    let title = first_line[1..].trim().to_string();

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(COMMENT))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row.context(TableSnafu {
            action: "reading row of",
            path: path_str.clone(),
        })?);
    }

    debug!("read {} rows from {path_str}", rows.len());
    Ok((title, rows))
}
