//! Navigational addresses (`path?query#fragment`).
//!
//! A [`Location`] keeps every query segment exactly as it was received. Only
//! the segment that a caller explicitly rewrites through
//! [`Location::with_param`] or [`Location::without_param`] is re-encoded, so
//! parameters owned by other parts of the host application survive a round
//! trip byte-for-byte.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::{Url, form_urlencoded};

// Encode set for query names and values. `+` must be escaped because the
// form decoder treats it as a space.
const QUERY_COMPONENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Errors raised while parsing a navigational address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// An absolute address could not be parsed as a URL.
    #[error("invalid absolute url '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },
    /// The address contains whitespace or control characters.
    #[error("address '{input}' contains whitespace or control characters")]
    InvalidCharacter { input: String },
}

/// A parsed navigational address.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    path: String,
    segments: Vec<String>,
    fragment: Option<String>,
}

impl Location {
    /// Creates a location with the given path and an empty query.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            segments: Vec::new(),
            fragment: None,
        }
    }

    /// Parses `path?query#fragment`, a bare `?query`, or an absolute URL.
    ///
    /// Absolute URLs are validated with [`url::Url`]; only their path, query
    /// and fragment are retained, taken verbatim from `input`. Empty query
    /// segments (`a=1&&b=2&`, a lone `?`) are kept as written.
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let trimmed = input.trim();
        let absolute = has_scheme(trimmed);
        let relative = if absolute {
            Url::parse(trimmed).map_err(|error| LocationError::InvalidUrl {
                input: trimmed.to_string(),
                reason: error.to_string(),
            })?;
            strip_origin(trimmed)
        } else {
            trimmed
        };

        if relative.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(LocationError::InvalidCharacter { input: input.to_string() });
        }

        let (rest, fragment) = match relative.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (relative, None),
        };
        let (path, segments) = match rest.split_once('?') {
            Some((path, query)) => (path, split_query(query)),
            None => (rest, Vec::new()),
        };
        let path = if absolute && path.is_empty() { "/" } else { path };

        Ok(Self {
            path: path.to_string(),
            segments,
            fragment,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Raw query string without the leading `?`.
    pub fn query(&self) -> String {
        self.segments.join("&")
    }

    /// Raw query segments in their original order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the decoded value of the first parameter named `name`.
    pub fn param(&self, name: &str) -> Option<String> {
        self.segments
            .iter()
            .filter_map(|segment| decode_segment(segment))
            .find(|(segment_name, _)| segment_name == name)
            .map(|(_, value)| value)
    }

    /// Decoded view of every parameter. When a name repeats, the first value wins.
    pub fn params(&self) -> IndexMap<String, String> {
        let mut params = IndexMap::new();
        for (name, value) in self.segments.iter().filter_map(|segment| decode_segment(segment)) {
            params.entry(name).or_insert(value);
        }
        params
    }

    /// Returns a copy with the parameter `name` set to `value`.
    ///
    /// The first segment named `name` is rewritten in place and any later
    /// duplicates are dropped; when no such segment exists the parameter is
    /// appended. All other segments, the path and the fragment are kept as-is.
    pub fn with_param(&self, name: &str, value: &str) -> Self {
        let encoded = encode_segment(name, value);
        let mut replaced = false;
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        for segment in &self.segments {
            if segment_has_name(segment, name) {
                if !replaced {
                    segments.push(encoded.clone());
                    replaced = true;
                }
                continue;
            }
            segments.push(segment.clone());
        }
        if !replaced {
            segments.push(encoded);
        }
        Self {
            path: self.path.clone(),
            segments,
            fragment: self.fragment.clone(),
        }
    }

    /// Returns a copy with every segment named `name` removed.
    pub fn without_param(&self, name: &str) -> Self {
        Self {
            path: self.path.clone(),
            segments: self
                .segments
                .iter()
                .filter(|segment| !segment_has_name(segment, name))
                .cloned()
                .collect(),
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.segments.is_empty() {
            write!(f, "?{}", self.segments.join("&"))?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Location::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn has_scheme(input: &str) -> bool {
    input.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|ch: char| ch.is_ascii_alphabetic())
            && scheme.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
    })
}

// Everything after `scheme://authority`.
fn strip_origin(input: &str) -> &str {
    let after_scheme = input.split_once("://").map_or(input, |(_, rest)| rest);
    after_scheme
        .find(['/', '?', '#'])
        .map_or("", |start| &after_scheme[start..])
}

fn split_query(query: &str) -> Vec<String> {
    query.split('&').map(str::to_string).collect()
}

fn decode_segment(segment: &str) -> Option<(String, String)> {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
}

fn segment_has_name(segment: &str, name: &str) -> bool {
    decode_segment(segment).is_some_and(|(segment_name, _)| segment_name == name)
}

fn encode_segment(name: &str, value: &str) -> String {
    format!(
        "{}={}",
        utf8_percent_encode(name, QUERY_COMPONENT_ENCODE_SET),
        utf8_percent_encode(value, QUERY_COMPONENT_ENCODE_SET)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relative_address_with_fragment() {
        let location = Location::parse("/profile?lang=en&tabs_1=name#top").expect("parse");
        assert_eq!(location.path(), "/profile");
        assert_eq!(location.query(), "lang=en&tabs_1=name");
        assert_eq!(location.fragment(), Some("top"));
        assert_eq!(location.to_string(), "/profile?lang=en&tabs_1=name#top");
    }

    #[test]
    fn parses_absolute_url_keeping_path_and_query() {
        let location = Location::parse("https://example.com/a/b?x=1").expect("parse");
        assert_eq!(location.to_string(), "/a/b?x=1");
    }

    #[test]
    fn absolute_url_keeps_query_bytes_verbatim() {
        let absolute = Location::parse("https://e.com/p?q=a'b&r=\"x\"&s=ü").expect("parse");
        let relative = Location::parse("/p?q=a'b&r=\"x\"&s=ü").expect("parse");
        assert_eq!(absolute, relative);
        assert_eq!(absolute.with_param("t", "x").to_string(), "/p?q=a'b&r=\"x\"&s=ü&t=x");
    }

    #[test]
    fn absolute_url_without_path_gets_root_path() {
        assert_eq!(Location::parse("https://e.com").expect("parse").to_string(), "/");
        assert_eq!(Location::parse("https://user@e.com:8080?a=1#top").expect("parse").to_string(), "/?a=1#top");
    }

    #[test]
    fn empty_query_segments_survive_untouched() {
        for raw in ["/p?a=1&&b=2&", "/p?", "/p"] {
            assert_eq!(Location::parse(raw).expect("parse").to_string(), raw);
        }
        let location = Location::parse("/p?a=1&&b=2&").expect("parse");
        assert_eq!(location.param("b").as_deref(), Some("2"));
        assert_eq!(location.with_param("a", "3").to_string(), "/p?a=3&&b=2&");
    }

    #[test]
    fn url_inside_query_is_not_mistaken_for_absolute_address() {
        let location = Location::parse("/login?next=https://example.com/x").expect("parse");
        assert_eq!(location.path(), "/login");
        assert_eq!(location.param("next").as_deref(), Some("https://example.com/x"));
    }

    #[test]
    fn rejects_whitespace_in_relative_address() {
        let error = Location::parse("/a b?x=1").unwrap_err();
        assert!(matches!(error, LocationError::InvalidCharacter { .. }));
    }

    #[test]
    fn with_param_preserves_unrelated_segments_verbatim() {
        let location = Location::parse("/p?q=a+b%20c&tabs_1=name&z=%7E").expect("parse");
        let updated = location.with_param("tabs_1", "address");
        assert_eq!(updated.to_string(), "/p?q=a+b%20c&tabs_1=address&z=%7E");
    }

    #[test]
    fn with_param_appends_when_absent_and_drops_duplicates() {
        let location = Location::parse("/p?a=1").expect("parse");
        assert_eq!(location.with_param("t", "x").to_string(), "/p?a=1&t=x");

        let duplicated = Location::parse("/p?t=1&a=1&t=2").expect("parse");
        assert_eq!(duplicated.with_param("t", "3").to_string(), "/p?t=3&a=1");
    }

    #[test]
    fn with_param_escapes_reserved_characters() {
        let location = Location::new("/").with_param("tab", "a&b=c+d e");
        assert_eq!(location.query(), "tab=a%26b%3Dc%2Bd%20e");
        assert_eq!(location.param("tab").as_deref(), Some("a&b=c+d e"));
    }

    #[test]
    fn params_keeps_first_value_for_repeated_names() {
        let location = Location::parse("?a=1&b=2&a=3").expect("parse");
        let params = location.params();
        assert_eq!(params.get("a").map(String::as_str), Some("1"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn without_param_removes_every_occurrence() {
        let location = Location::parse("/p?t=1&a=1&t=2").expect("parse");
        assert_eq!(location.without_param("t").to_string(), "/p?a=1");
    }

    #[test]
    fn serde_uses_display_form() {
        let location = Location::parse("/p?a=1").expect("parse");
        let json = serde_json::to_string(&location).expect("serialize");
        assert_eq!(json, "\"/p?a=1\"");
        let back: Location = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, location);
    }
}
