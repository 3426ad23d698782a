//! Key/value property text in the subset of the `.properties` format
//! used by calibration files.
//!
//! - one entry per line, `key=value`, `key: value` or `key value`;
//! - lines starting with `#` or `!` are comments, blank lines are ignored;
//! - keys and values are trimmed; the last occurrence of a key wins.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, BufReader, Read, Write};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for line in text.lines() {
            if let Some((k, v)) = parse_line(line) {
                props.insert(k, v);
            }
        }
        props
    }

    pub fn read_from<R: Read>(reader: R) -> std::io::Result<Self> {
        let mut props = Self::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            if let Some((k, v)) = parse_line(&line) {
                props.insert(k, v);
            }
        }
        Ok(props)
    }

    /// Write a `#` header line followed by all entries in key order.
    pub fn write_to<W: Write>(&self, mut writer: W, header: Option<&str>) -> std::io::Result<()> {
        if let Some(header) = header {
            for line in header.lines() {
                writeln!(writer, "#{line}")?;
            }
        }
        write!(writer, "{self}")?;
        writer.flush()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.entries {
            writeln!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start_matches('\u{feff}').trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }
    let split = line
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(line.len());
    let key = line[..split].trim_end();
    let rest = line[split..].trim_start();
    let value = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim();
    Some((key, value))
}
