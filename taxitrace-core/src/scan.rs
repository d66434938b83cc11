//! Line scanner shared by all flat-text data files.
//!
//! Every input format follows the same conventions: a trailing carriage
//! return is stripped, leading spaces are stripped, lines whose first
//! non-space character is `#` are comments, and the remaining lines are
//! whitespace-delimited positional fields. Malformed numeric fields are a
//! hard error carrying the file path and 1-based line number.

use std::path::{Path, PathBuf};
use std::str::{FromStr, SplitWhitespace};
use std::{fs, io};


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read {path}: {source}")]
    Io {
        path:   PathBuf,
        source: io::Error,
    },
    #[error("{path}:{line}: missing `{field}` field")]
    MissingField { path: PathBuf, line: usize, field: &'static str },
    #[error("{path}:{line}: malformed `{field}` field {value:?}")]
    MalformedField { path: PathBuf, line: usize, field: &'static str, value: String },
}

/// A whole data file read into memory, with comments stripped.
#[derive(Debug)]
pub struct Source {
    path:  PathBuf,
    lines: Vec<(usize, String)>,
}

impl Source {
    /// Reads the file at `path` in one blocking call.
    ///
    /// Comment lines are dropped entirely; blank lines are kept so that
    /// formats using them as record separators can still see them. Line
    /// numbers always refer to the original file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) => return Err(Error::Io { path, source }),
        };

        let lines = text
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.strip_suffix('\r').unwrap_or(line).trim_start_matches(' ');
                if line.starts_with('#') {
                    return None;
                }
                Some((index + 1, line.to_owned()))
            })
            .collect();
        Ok(Self { path, lines })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Iterates over non-blank data lines.
    pub fn lines(&self) -> impl Iterator<Item = Fields<'_>> {
        self.all_lines().filter(|fields| !fields.is_blank())
    }

    /// Iterates over all lines including blank ones,
    /// for formats where a blank line separates records.
    pub fn all_lines(&self) -> impl Iterator<Item = Fields<'_>> {
        self.lines.iter().map(|(number, line)| Fields {
            path: &self.path,
            number: *number,
            raw: line,
            iter: line.split_whitespace(),
        })
    }
}

/// Positional field access into one data line.
pub struct Fields<'a> {
    path:   &'a Path,
    number: usize,
    raw:    &'a str,
    iter:   SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    /// The 1-based line number in the source file.
    #[must_use]
    pub fn number(&self) -> usize { self.number }

    /// The line with comment/CR stripping applied.
    #[must_use]
    pub fn raw(&self) -> &'a str { self.raw }

    #[must_use]
    pub fn is_blank(&self) -> bool { self.raw.trim().is_empty() }

    /// Takes the next whitespace-delimited field verbatim.
    pub fn next_str(&mut self, field: &'static str) -> Result<&'a str, Error> {
        self.iter.next().ok_or_else(|| Error::MissingField {
            path: self.path.to_owned(),
            line: self.number,
            field,
        })
    }

    /// Takes the next field and parses it, failing hard on malformed input.
    pub fn next<T: FromStr>(&mut self, field: &'static str) -> Result<T, Error> {
        let value = self.next_str(field)?;
        value.parse().map_err(|_| Error::MalformedField {
            path: self.path.to_owned(),
            line: self.number,
            field,
            value: value.to_owned(),
        })
    }
}
