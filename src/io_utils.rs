//! Raw file access, encoding candidates, and delimiter detection.
//!
//! Readers load the source once as bytes and work from memory:
//!
//! - **Sampling**: the first `sniff_bytes` bytes feed delimiter detection.
//! - **Delimiter detection**: a consistency sniffer over the sample, falling
//!   back to a plain presence check of the configured candidates, then `,`.
//!   Detection runs on bytes so it is independent of the text encoding.
//! - **Encoding**: labels resolve through `encoding_rs`; decoding is strict so
//!   a wrong candidate fails instead of producing replacement characters.

use std::{collections::HashMap, fs, io::Read, path::Path};

use anyhow::{Result, anyhow};
use encoding_rs::Encoding;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

/// Share of sample lines that must agree on a delimiter count.
const SNIFF_CONSISTENCY: f64 = 0.9;

pub fn read_source(path: &Path) -> std::io::Result<Vec<u8>> {
    fs::read(path)
}

/// Returns the leading `limit` bytes and whether the source continues past them.
pub fn sample_bytes(bytes: &[u8], limit: usize) -> (&[u8], bool) {
    if bytes.len() > limit {
        (&bytes[..limit], true)
    } else {
        (bytes, false)
    }
}

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| anyhow!("Unknown encoding '{label}'"))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn detect_delimiter(sample: &[u8], truncated: bool, candidates: &[u8]) -> u8 {
    if let Some(delimiter) = sniff_delimiter(sample, truncated, candidates) {
        return delimiter;
    }
    candidates
        .iter()
        .copied()
        .find(|candidate| sample.contains(candidate))
        .unwrap_or(DEFAULT_CSV_DELIMITER)
}

/// Picks the candidate whose per-line count (outside quotes) is non-zero and
/// the same on at least 90% of the sample lines. Higher consistency wins,
/// then the higher count, then candidate order. `None` when nothing
/// qualifies, e.g. a single-column file.
pub fn sniff_delimiter(sample: &[u8], truncated: bool, candidates: &[u8]) -> Option<u8> {
    let mut lines: Vec<&[u8]> = sample
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .collect();
    if truncated && lines.len() > 1 {
        lines.pop();
    }
    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, f64, usize)> = None;
    for &candidate in candidates {
        let counts = lines.iter().map(|line| count_unquoted(line, candidate));
        let (mode, frequency) = count_mode(counts);
        if mode == 0 {
            continue;
        }
        let consistency = frequency as f64 / lines.len() as f64;
        if consistency < SNIFF_CONSISTENCY {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_consistency, best_mode)) => {
                consistency > best_consistency
                    || (consistency == best_consistency && mode > best_mode)
            }
        };
        if better {
            best = Some((candidate, consistency, mode));
        }
    }
    best.map(|(delimiter, _, _)| delimiter)
}

fn count_unquoted(line: &[u8], delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &byte in line {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

fn count_mode<I>(counts: I) -> (usize, usize)
where
    I: Iterator<Item = usize>,
{
    let mut frequencies: HashMap<usize, usize> = HashMap::new();
    for count in counts {
        *frequencies.entry(count).or_insert(0) += 1;
    }
    frequencies
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .unwrap_or((0, 0))
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
