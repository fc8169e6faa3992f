//! Streaming reader for the whitespace-separated field format.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::extrema_error::ExtremaError;

/// Iterator over the values of a field file, in file order.
///
/// Reads one line at a time. Yields [`ExtremaError::ParseValue`] for a
/// token that is not a number and [`ExtremaError::Io`] if reading fails;
/// after the first error the iterator is exhausted.
pub struct FieldReader<R, T> {
    reader: R,
    path: PathBuf,
    line: String,
    tokens: std::vec::IntoIter<String>,
    index: usize,
    done: bool,
    _value: PhantomData<T>,
}

impl<R: BufRead, T: FromStr> FieldReader<R, T> {
    /// Wrap `reader`; `path` only labels errors.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            line: String::new(),
            tokens: Vec::new().into_iter(),
            index: 0,
            done: false,
            _value: PhantomData,
        }
    }

    fn next_token(&mut self) -> Result<Option<String>, ExtremaError> {
        loop {
            if let Some(tok) = self.tokens.next() {
                return Ok(Some(tok));
            }
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| ExtremaError::io(&self.path, e))?;
            if n == 0 {
                return Ok(None);
            }
            self.tokens = self
                .line
                .split_ascii_whitespace()
                .map(str::to_owned)
                .collect::<Vec<_>>()
                .into_iter();
        }
    }
}

impl<R: BufRead, T: FromStr> Iterator for FieldReader<R, T> {
    type Item = Result<T, ExtremaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tok = match self.next_token() {
            Ok(Some(tok)) => tok,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let index = self.index;
        self.index += 1;
        match tok.parse::<T>() {
            Ok(v) => Some(Ok(v)),
            Err(_) => {
                self.done = true;
                Some(Err(ExtremaError::ParseValue { index, token: tok }))
            }
        }
    }
}

/// Open `path` for streaming.
pub fn read_field_values<T: FromStr>(
    path: impl AsRef<Path>,
) -> Result<FieldReader<BufReader<File>, T>, ExtremaError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ExtremaError::io(path, e))?;
    Ok(FieldReader::new(BufReader::new(file), path))
}
