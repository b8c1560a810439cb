//! Entry metadata descriptors.
//!
//! Every content directory carries a small JSON descriptor next to its
//! optional markdown body:
//!
//! ```json
//! {
//!     "Author": "Jane",
//!     "Date": "2024-03-01 18:30",
//!     "Title": "Spring update",
//!     "Desc": "What changed this season",
//!     "Priority": 5,
//!     "Hidden": false,
//!     "Unsafe": false,
//!     "IsIndex": false,
//!     "IsMenu": false,
//!     "ExtraStyle": ["/static/gallery.css"],
//!     "ExtraScript": []
//! }
//! ```
//!
//! Only the shape matters; every key is optional and unknown keys are
//! ignored. Keys are PascalCase, with camelCase aliases accepted.
//!
//! ## Timestamps
//!
//! `Date` uses the fixed layout `YYYY-MM-DD hh:mm`. The layout is enforced
//! character by character before the calendar check, so `2024-3-1 9:05`
//! is rejected even though it is unambiguous.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// chrono format string for `YYYY-MM-DD hh:mm`.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M";

/// Positions of the separators in `YYYY-MM-DD hh:mm`; everything else is a digit.
const LAYOUT_SEPARATORS: [(usize, u8); 3] = [(4, b'-'), (7, b'-'), (10, b' ')];
const LAYOUT_COLON: usize = 13;
const LAYOUT_LEN: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("timestamp {input:?} does not match layout YYYY-MM-DD hh:mm")]
pub struct TimestampError {
    pub input: String,
}

/// A minute-precision publish date.
///
/// The default value (1970-01-01 00:00) stands in for "no date given" and
/// sorts before every real date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        let err = || TimestampError {
            input: input.to_string(),
        };
        if !matches_layout(input.as_bytes()) {
            return Err(err());
        }
        NaiveDateTime::parse_from_str(input, TIMESTAMP_LAYOUT)
            .map(Timestamp)
            .map_err(|_| err())
    }

    pub fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

fn matches_layout(bytes: &[u8]) -> bool {
    if bytes.len() != LAYOUT_LEN {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| {
        if let Some(&(_, sep)) = LAYOUT_SEPARATORS.iter().find(|(pos, _)| *pos == i) {
            b == sep
        } else if i == LAYOUT_COLON {
            b == b':'
        } else {
            b.is_ascii_digit()
        }
    })
}

impl From<NaiveDateTime> for Timestamp {
    /// Truncates to the minute, the precision of the layout.
    fn from(value: NaiveDateTime) -> Self {
        let truncated = value
            .with_second(0)
            .and_then(|v| v.with_nanosecond(0))
            .unwrap_or(value);
        Timestamp(truncated)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_LAYOUT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Timestamp::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("malformed metadata: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

/// Decoded metadata of one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Meta {
    pub author: String,
    pub date: Timestamp,
    pub title: String,
    pub desc: String,
    /// Higher sorts first.
    pub priority: i64,
    pub hidden: bool,
    /// Skip sanitizing the rendered body.
    #[serde(rename = "Unsafe")]
    pub unsafe_html: bool,
    pub is_index: bool,
    pub is_menu: bool,
    pub extra_style: Vec<String>,
    pub extra_script: Vec<String>,
}

/// Wire shape. `Date` stays raw so a bad timestamp is reported as such
/// rather than as a generic JSON error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct RawMeta {
    #[serde(alias = "author")]
    author: String,
    #[serde(alias = "date")]
    date: Option<String>,
    #[serde(alias = "title")]
    title: String,
    #[serde(alias = "desc")]
    desc: String,
    #[serde(alias = "priority")]
    priority: i64,
    #[serde(alias = "hidden")]
    hidden: bool,
    #[serde(rename = "Unsafe", alias = "unsafe")]
    unsafe_html: bool,
    #[serde(alias = "isIndex")]
    is_index: bool,
    #[serde(alias = "isMenu")]
    is_menu: bool,
    #[serde(alias = "extraStyle")]
    extra_style: Vec<String>,
    #[serde(alias = "extraScript")]
    extra_script: Vec<String>,
}

impl Meta {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetaError> {
        let raw: RawMeta = serde_json::from_slice(bytes)?;
        let date = match raw.date.as_deref() {
            Some(text) => Timestamp::parse(text)?,
            None => Timestamp::default(),
        };
        Ok(Meta {
            author: raw.author,
            date,
            title: raw.title,
            desc: raw.desc,
            priority: raw.priority,
            hidden: raw.hidden,
            unsafe_html: raw.unsafe_html,
            is_index: raw.is_index,
            is_menu: raw.is_menu,
            extra_style: raw.extra_style,
            extra_script: raw.extra_script,
        })
    }
}
