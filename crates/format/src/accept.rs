//! `Accept` header parsing
//!
//! Turns a header value like `text/plain; q=0.5, text/html` into the list of media ranges the
//! client accepts, most preferred first. Ranges of equal weight keep the order the client sent
//! them in.
//!
//! Entries are separated by commas, or by whitespace in front of a new `type/subtype`, so
//! `text/html text/plain` names two ranges. Entries that cannot be parsed (a missing `/`, an
//! invalid token, a `q` outside `0..=1`) are skipped. The header as a whole is only rejected when
//! it is blank, or when it names entries and none of them is valid.
//!
//! A range with `q=0` marks its type as not acceptable: [`parse_media_ranges`] keeps it with its
//! weight, [`parse_accept`] leaves it out.

use crate::MalformedHeader;
use tracing::trace;

const DEFAULT_WEIGHT: f32 = 1.0;

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    essence: String,
    weight: f32,
}

impl MediaRange {
    /// The lower-cased `type/subtype`, parameters stripped.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn main_type(&self) -> &str {
        self.essence.split_once('/').map_or(self.essence.as_str(), |(main, _)| main)
    }

    /// `*/*` or `type/*`
    pub fn is_wildcard(&self) -> bool {
        self.essence.ends_with("/*")
    }
}

/// Parses an `Accept` header value into the acceptable media types, ordered by descending
/// preference.
///
/// ```
/// use micro_format::parse_accept;
///
/// let types = parse_accept("text/plain; q=0.5, text/html, text/x-dvi; q=0.8, text/x-c").unwrap();
/// assert_eq!(types, vec!["text/html", "text/x-c", "text/x-dvi", "text/plain"]);
/// ```
pub fn parse_accept(value: &str) -> Result<Vec<String>, MalformedHeader> {
    let ranges = parse_media_ranges(value)?;
    Ok(ranges.into_iter().filter(|range| range.weight > 0.0).map(|range| range.essence).collect())
}

/// Like [`parse_accept`], keeping the weight of every range.
pub fn parse_media_ranges(value: &str) -> Result<Vec<MediaRange>, MalformedHeader> {
    if value.trim().is_empty() {
        return Err(MalformedHeader::new("empty accept header"));
    }

    let mut entries = 0_usize;
    let mut ranges = Vec::new();
    for entry in split_entries(value) {
        entries += 1;
        match parse_entry(&entry) {
            Some(range) => ranges.push(range),
            None => trace!(%entry, "skip invalid accept entry"),
        }
    }

    if entries > 0 && ranges.is_empty() {
        return Err(MalformedHeader::new(format!("no valid media range in '{value}'")));
    }

    // stable: equal weights keep header order
    ranges.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    Ok(ranges)
}

fn split_entries(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    for segment in value.split(',') {
        let mut entry = String::new();
        for word in segment.split_whitespace() {
            if !entry.is_empty() && !entry.ends_with([';', '=']) && starts_range(word) {
                entries.push(std::mem::take(&mut entry));
            }
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(word);
        }
        if !entry.is_empty() {
            entries.push(entry);
        }
    }
    entries
}

/// `text/html` or `text/html;q=1`, not `;q=1` or `charset=a/b`
fn starts_range(word: &str) -> bool {
    let head = word.split(';').next().unwrap_or(word);
    head.contains('/') && !head.contains('=')
}

fn parse_entry(entry: &str) -> Option<MediaRange> {
    let mut parts = entry.split(';');
    let essence = parts.next()?.trim();

    let (main, sub) = essence.split_once('/')?;
    if !is_token(main) || !is_token(sub) || (main == "*" && sub != "*") {
        return None;
    }

    let mut weight = DEFAULT_WEIGHT;
    for param in parts.map(str::trim).filter(|param| !param.is_empty()) {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("q") {
            weight = value.trim().parse::<f32>().ok().filter(|q| (0.0..=1.0).contains(q))?;
        }
    }

    Some(MediaRange { essence: essence.to_ascii_lowercase(), weight })
}

/// rfc9110 `token`
fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
