//! Best-effort JSON recovery from reasoner text
//!
//! Model replies often wrap the requested JSON in prose or code fences. The
//! candidate object is the text between the first `{` and the last `}`; if
//! that does not decode to a JSON object the reply is kept verbatim.

use serde_json::{Map, Value};

/// Detail key under which unparseable reasoner text is preserved
pub const RAW_OUTPUT_KEY: &str = "raw_output";

/// Reasoner reply after best-effort parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// The reply contained a JSON object
    Json(Map<String, Value>),
    /// No JSON object could be recovered; the full reply text
    Raw(String),
}

impl ParsedResponse {
    /// The parsed object, if any
    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            ParsedResponse::Json(map) => Some(map),
            ParsedResponse::Raw(_) => None,
        }
    }

    /// True when parsing failed
    pub fn is_raw(&self) -> bool {
        matches!(self, ParsedResponse::Raw(_))
    }

    /// String field of the parsed object
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.as_json()?.get(key)?.as_str()
    }

    /// Convert to an analyzer detail payload
    ///
    /// Raw text lands under [`RAW_OUTPUT_KEY`].
    pub fn into_detail(self) -> Map<String, Value> {
        match self {
            ParsedResponse::Json(map) => map,
            ParsedResponse::Raw(text) => {
                let mut detail = Map::new();
                detail.insert(RAW_OUTPUT_KEY.to_string(), Value::String(text));
                detail
            }
        }
    }
}

/// Recover a JSON object from free text
///
/// # Example
///
/// ```
/// use kyc_verify::reasoner::{parse_best_effort, ParsedResponse};
///
/// let parsed = parse_best_effort("noise {\"status\":\"success\"} more noise");
/// assert_eq!(parsed.str_field("status"), Some("success"));
///
/// assert!(matches!(parse_best_effort("no braces"), ParsedResponse::Raw(_)));
/// ```
pub fn parse_best_effort(text: &str) -> ParsedResponse {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return ParsedResponse::Raw(text.to_string());
    };
    if end < start {
        return ParsedResponse::Raw(text.to_string());
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => ParsedResponse::Json(map),
        Ok(_) | Err(_) => {
            log::debug!("Reasoner reply is not a JSON object, keeping raw text");
            ParsedResponse::Raw(text.to_string())
        }
    }
}
