//! Locating the JSON payload inside free-form model output.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Expected top-level JSON type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
}

impl JsonShape {
    fn brackets(self) -> (char, char) {
        match self {
            Self::Object => ('{', '}'),
            Self::Array => ('[', ']'),
        }
    }

    /// Lowercase name used in prompts and logs.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

fn fence_regex(shape: JsonShape) -> &'static Regex {
    static OBJECT: OnceLock<Regex> = OnceLock::new();
    static ARRAY: OnceLock<Regex> = OnceLock::new();
    let (cell, pattern) = match shape {
        JsonShape::Object => (&OBJECT, r"(?s)```[ \t]*([A-Za-z]*)[ \t]*\r?\n?\s*(\{.*?\})\s*```"),
        JsonShape::Array => (&ARRAY, r"(?s)```[ \t]*([A-Za-z]*)[ \t]*\r?\n?\s*(\[.*?\])\s*```"),
    };
    cell.get_or_init(|| Regex::new(pattern).expect("fence pattern is valid"))
}

fn trailing_comma_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r",(\s*[\]}])").expect("trailing comma pattern is valid"))
}

/// Content of a Markdown code fence whose body is a bracket pair of `shape`.
///
/// Fences tagged `json` win over untagged ones; otherwise the first match is used.
#[must_use]
pub fn fenced_block(text: &str, shape: JsonShape) -> Option<&str> {
    let mut untagged = None;
    for caps in fence_regex(shape).captures_iter(text) {
        let tag = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2)?.as_str();
        if tag.eq_ignore_ascii_case("json") {
            return Some(body);
        }
        if tag.is_empty() && untagged.is_none() {
            untagged = Some(body);
        }
    }
    untagged
}

/// Widest substring from the first opening bracket to the last closing one.
#[must_use]
pub fn widest_span(text: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = shape.brackets();
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Returns the substring of `text` most likely to be valid JSON of `shape`.
///
/// # Errors
///
/// Returns [`Error::NoJsonFound`] when no matching bracket pair exists.
pub fn extract_json(text: &str, shape: JsonShape) -> Result<&str> {
    fenced_block(text, shape).or_else(|| widest_span(text, shape)).ok_or(Error::NoJsonFound)
}

/// Number of distinct cleanup passes available to [`cleanup_candidate`].
pub const CLEANUP_PASSES: u32 = 3;

/// Produces the candidate for the given cleanup pass, each more lenient than the last.
///
/// Pass 0 is [`extract_json`]. Pass 1 ignores code fences and takes the widest
/// bracket span. Pass 2 additionally drops trailing commas and stray control
/// characters. Passes beyond the last repeat it.
///
/// # Errors
///
/// Returns [`Error::NoJsonFound`] when no matching bracket pair exists.
pub fn cleanup_candidate(text: &str, shape: JsonShape, pass: u32) -> Result<String> {
    match pass {
        0 => extract_json(text, shape).map(str::to_string),
        1 => widest_span(text, shape).map(str::to_string).ok_or(Error::NoJsonFound),
        _ => {
            let span = widest_span(text, shape).ok_or(Error::NoJsonFound)?;
            let printable: String = span
                .chars()
                .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
                .collect();
            Ok(trailing_comma_regex().replace_all(&printable, "$1").into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_tagged_fence_is_preferred_over_other_brackets() {
        let text = "Here is a list [not json] first.\n\
                    ```\n[\"untagged\"]\n```\n\
                    ```json\n[{\"id\": 1}]\n```\n\
                    trailing [stuff]";
        assert_eq!(extract_json(text, JsonShape::Array).unwrap(), "[{\"id\": 1}]");
    }

    #[test]
    fn untagged_fence_is_used_when_no_json_tag() {
        let text = "intro {x}\n```\n{\"a\": 1}\n```\noutro";
        assert_eq!(extract_json(text, JsonShape::Object).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn falls_back_to_widest_span_without_fences() {
        let text = "Sure! [ {\"id\": 1}, {\"id\": 2} ] Hope that helps.";
        assert_eq!(
            extract_json(text, JsonShape::Array).unwrap(),
            "[ {\"id\": 1}, {\"id\": 2} ]"
        );
    }

    #[test]
    fn fence_around_other_shape_is_ignored() {
        let text = "```json\n{\"tasks\": []}\n```";
        assert_eq!(extract_json(text, JsonShape::Array).unwrap(), "[]");
    }

    #[test]
    fn missing_brackets_is_no_json_found() {
        assert_eq!(extract_json("no json here", JsonShape::Object), Err(Error::NoJsonFound));
        assert_eq!(extract_json("] backwards [", JsonShape::Array), Err(Error::NoJsonFound));
        assert_eq!(extract_json("", JsonShape::Array), Err(Error::NoJsonFound));
    }

    #[test]
    fn lenient_pass_strips_trailing_commas_and_control_chars() {
        let text = "```json\n{\"a\": [1, 2,],\u{0007} \"b\": 3,}\n```";
        let cleaned = cleanup_candidate(text, JsonShape::Object, 2).unwrap();
        let value: serde_json::Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["a"][1], 2);
        assert_eq!(value["b"], 3);
    }

    #[test]
    fn second_pass_ignores_fences() {
        let text = "```json\n{\"a\": 1}\n``` and {\"b\": 2}";
        assert_eq!(cleanup_candidate(text, JsonShape::Object, 0).unwrap(), "{\"a\": 1}");
        assert_eq!(
            cleanup_candidate(text, JsonShape::Object, 1).unwrap(),
            "{\"a\": 1}\n``` and {\"b\": 2}"
        );
    }
}
