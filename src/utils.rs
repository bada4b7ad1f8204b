use std::{collections::BTreeMap, time::Duration};

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

// Shape checks only. Matching is anchored at the start, so trailing ports or
// query strings after a valid prefix are accepted.
static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(www\.)*[\w.#-]+(/[\w.#-]+)*").unwrap());

static HEADER_PAIR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+:\w+").unwrap());

static QUERY_PAIR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+=\w+").unwrap());

static URLENCODED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+=\w+&)*(\w+=\w+)$").unwrap());

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const APPLICATION_JSON: &str = "application/json";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Check that `raw` looks like an HTTP(S) url.
///
/// # Arguments
///
/// * `raw` - The url as typed by the user.
///
/// # Returns
///
/// * `Result<String>` - The url unchanged, or `Error::InvalidUrl`.
pub fn validate_url(raw: &str) -> Result<String> {
    if !URL_REGEX.is_match(raw) {
        return Err(Error::InvalidUrl(raw.to_string()));
    }
    Ok(raw.to_string())
}

/// The two flavours of `key<sep>value` lists the CLI accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `key:value`, used by `--headers`.
    Header,
    /// `key=value`, used by `--queries`.
    Query,
}

impl Separator {
    fn regex(self) -> &'static Regex {
        match self {
            Separator::Header => &HEADER_PAIR_REGEX,
            Separator::Query => &QUERY_PAIR_REGEX,
        }
    }

    fn symbol(self) -> char {
        match self {
            Separator::Header => ':',
            Separator::Query => '=',
        }
    }

    fn label(self) -> &'static str {
        match self {
            Separator::Header => "header",
            Separator::Query => "query param",
        }
    }
}

/// Result of a lenient key/value parse.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyValueList {
    /// Lower-cased keys, last occurrence wins.
    pub entries: BTreeMap<String, String>,
    /// Keys seen more than once, in the order the repeats were met.
    pub duplicates: Vec<String>,
}

/// Pull every `word<sep>word` pair out of `raw`.
///
/// Parsing is lenient: anything that is not a pair of word tokens around the
/// separator is skipped without an error. Keys are lower-cased and a repeated
/// key overwrites the earlier value with a warning.
pub fn parse_key_value_list<S: AsRef<str>>(raw: &[S], separator: Separator) -> KeyValueList {
    let mut list = KeyValueList::default();

    for item in raw {
        for found in separator.regex().find_iter(item.as_ref()) {
            let Some((key, value)) = found.as_str().split_once(separator.symbol()) else {
                continue;
            };
            let key = key.to_lowercase();
            if list.entries.contains_key(&key) {
                warn!(
                    "Duplicate {label}: {label} {key} is entered more than once",
                    label = separator.label()
                );
                list.duplicates.push(key.clone());
            }
            list.entries.insert(key, value.to_string());
        }
    }

    list
}

/// Whether `data` has the `key=value&key=value` shape.
pub fn is_urlencoded(data: &str) -> bool {
    URLENCODED_REGEX.is_match(data)
}

/// Advisory check of a raw body against the form-urlencoded shape.
///
/// Only applies when no content type was given or it is exactly
/// `application/x-www-form-urlencoded`. Empty data means no body.
pub fn validate_body_data(
    data: Option<String>,
    headers: &BTreeMap<String, String>,
) -> Option<String> {
    let data = data.filter(|data| !data.is_empty())?;

    let content_type = headers.get("content-type").map(String::as_str);
    if matches!(content_type, None | Some(FORM_URLENCODED)) && !is_urlencoded(&data) {
        warn!(
            "Bad formatted data: Given Data format doesn't match {} pattern",
            FORM_URLENCODED
        );
    }

    Some(data)
}

/// Advisory JSON check. The text is always returned untouched.
pub fn validate_json(text: Option<String>) -> Option<String> {
    let text = text?;
    if let Err(err) = serde_json::from_str::<serde_json::Value>(&text) {
        warn!("Bad formatted json: Given JSON string format is not valid ({err})");
    }
    Some(text)
}

/// Turn the raw `--timeout` value into a duration. `None` means no timeout.
pub fn validate_timeout(value: Option<i64>) -> Result<Option<Duration>> {
    match value {
        None => Ok(None),
        Some(seconds) if seconds < 0 => Err(Error::InvalidArgument(format!(
            "Timeout cannot be negative (got {seconds})"
        ))),
        Some(seconds) => Ok(Some(Duration::from_secs(seconds.unsigned_abs()))),
    }
}

/// Split a `Content-Type` value into media type and cleaned subtype.
///
/// The subtype is cut at the first `+`, then that piece is cut at the first
/// `;`. Returns `None` when there is no `/` at all.
pub fn split_media_type(content_type: &str) -> Option<(String, String)> {
    let (media_type, subtype) = content_type.split_once('/')?;
    let subtype = subtype
        .split('+')
        .next()
        .unwrap_or_default()
        .split(';')
        .next()
        .unwrap_or_default();

    Some((media_type.trim().to_string(), subtype.trim().to_string()))
}
