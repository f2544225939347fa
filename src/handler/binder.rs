//! Request payload binding.
//!
//! # Responsibilities
//! - Build a payload from its zero value, the request body and the query string
//! - Pick a body decoder from the `Content-Type` header
//! - Coerce textual form/query values to the payload's field types
//!
//! # Data Flow
//! ```text
//! factory() ─▶ zero value ─▶ JSON object template
//!     ─▶ overlay body fields (JSON or form)  ─▶ decode check (BindError::Body)
//!     ─▶ fill remaining fields from query    ─▶ decode      (BindError::Query)
//! ```
//!
//! # Design Decisions
//! - Field names are the payload's serde names for body, form and query alike
//! - Body fields win over query fields with the same name
//! - Form and query keys the payload does not accept are ignored
//! - An empty textual value leaves a bool/number field at its zero value
//! - Fields whose zero value hides their type (`None`, an empty list, a
//!   skipped field) take the first of bool, number, string that decodes

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use url::form_urlencoded;

use crate::handler::shape::Shape;

/// Types that can be bound from a request.
///
/// Implemented for every serde record with a `Default` zero value; the
/// [`Shape`] kind still has to be an aggregate for registration to succeed.
pub trait Payload: Shape + Default + Serialize + DeserializeOwned + Send + 'static {}

impl<T> Payload for T where T: Shape + Default + Serialize + DeserializeOwned + Send + 'static {}

/// Request data the binder reads from.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindSource<'a> {
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
    pub query: Option<&'a str>,
}

/// Request-time binding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("failed to read request body: {0}")]
    Read(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("invalid request body: {0}")]
    Body(String),

    #[error("invalid query parameters: {0}")]
    Query(String),

    #[error("{0} does not bind from a JSON object")]
    NotAggregate(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    fn detect(content_type: Option<&str>) -> Result<Self, BindError> {
        let Some(raw) = content_type else {
            return Ok(BodyFormat::Json);
        };
        let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if essence == "application/json" || essence.ends_with("+json") {
            Ok(BodyFormat::Json)
        } else if essence == "application/x-www-form-urlencoded" {
            Ok(BodyFormat::Form)
        } else {
            Err(BindError::UnsupportedContentType(raw.to_string()))
        }
    }
}

/// Bind a fresh `P` from the request.
///
/// `factory` produces the zero value the request data is layered onto.
pub fn bind<P: Payload>(factory: fn() -> P, source: &BindSource<'_>) -> Result<P, BindError> {
    let template = match serde_json::to_value(factory()) {
        Ok(Value::Object(map)) => map,
        _ => return Err(BindError::NotAggregate(std::any::type_name::<P>())),
    };
    let mut fields = template.clone();
    let mut from_body = HashSet::new();
    let mut decoded = None;

    if !source.body.is_empty() {
        match BodyFormat::detect(source.content_type)? {
            BodyFormat::Json => {
                let value: Value = serde_json::from_slice(source.body)
                    .map_err(|e| BindError::Body(e.to_string()))?;
                let Value::Object(body) = value else {
                    return Err(BindError::Body("expected a JSON object".to_string()));
                };
                for (key, value) in body {
                    from_body.insert(key.clone());
                    fields.insert(key, value);
                }
            }
            BodyFormat::Form => {
                for (key, values) in group_pairs(form_urlencoded::parse(source.body)) {
                    if let Some(value) = text_value::<P>(&template, &key, values) {
                        fields.insert(key.clone(), value);
                        from_body.insert(key);
                    }
                }
            }
        }
        decoded = Some(decode::<P>(&fields).map_err(BindError::Body)?);
    }

    let mut query_applied = false;
    if let Some(query) = source.query {
        for (key, values) in group_pairs(form_urlencoded::parse(query.as_bytes())) {
            if from_body.contains(&key) {
                continue;
            }
            if let Some(value) = text_value::<P>(&template, &key, values) {
                fields.insert(key, value);
                query_applied = true;
            }
        }
    }

    match decoded {
        Some(payload) if !query_applied => Ok(payload),
        _ => decode::<P>(&fields).map_err(BindError::Query),
    }
}

fn decode<P: DeserializeOwned>(fields: &Map<String, Value>) -> Result<P, String> {
    serde_json::from_value(Value::Object(fields.clone())).map_err(|e| e.to_string())
}

/// Group `key=value` pairs by key, keeping first-seen key order.
fn group_pairs<'a>(
    pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        match grouped.iter().position(|(k, _)| *k == key) {
            Some(index) => grouped[index].1.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    grouped
}

/// The JSON value for a textual form/query field, or `None` to ignore it.
fn text_value<P: DeserializeOwned>(
    template: &Map<String, Value>,
    key: &str,
    values: Vec<String>,
) -> Option<Value> {
    match template.get(key) {
        Some(slot) if !is_opaque(slot) => Some(coerce(slot, values)),
        slot => infer::<P>(template, key, slot, values),
    }
}

/// A zero value that does not reveal the field's JSON type.
fn is_opaque(slot: &Value) -> bool {
    match slot {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Try candidate values for `key` against the zero value and keep the first
/// one `P` accepts.
///
/// A known field that accepts none keeps its raw text so decoding reports
/// the error; an unknown key is dropped.
fn infer<P: DeserializeOwned>(
    template: &Map<String, Value>,
    key: &str,
    slot: Option<&Value>,
    values: Vec<String>,
) -> Option<Value> {
    let list_only = matches!(slot, Some(Value::Array(_)));
    let mut candidates = Vec::new();
    if !list_only {
        if let Some(first) = values.first() {
            candidates.extend(scalar_candidates(first));
        }
    }
    candidates.extend(list_candidates(&values));

    let mut trial = template.clone();
    for candidate in candidates {
        trial.insert(key.to_string(), candidate.clone());
        if decode::<P>(&trial).is_ok() {
            return Some(candidate);
        }
    }

    slot?;
    Some(if list_only {
        Value::Array(values.into_iter().map(Value::String).collect())
    } else {
        Value::String(values.into_iter().next().unwrap_or_default())
    })
}

fn scalar_candidates(raw: &str) -> Vec<Value> {
    let mut candidates = Vec::new();
    if raw.is_empty() {
        candidates.push(Value::Null);
    }
    if let Some(b) = parse_bool(raw) {
        candidates.push(Value::Bool(b));
    }
    if let Some(n) = parse_number(raw, false).or_else(|| parse_number(raw, true)) {
        candidates.push(Value::Number(n));
    }
    candidates.push(Value::String(raw.to_string()));
    candidates
}

fn list_candidates(values: &[String]) -> Vec<Value> {
    let bools: Option<Vec<Value>> = values
        .iter()
        .map(|raw| parse_bool(raw).map(Value::Bool))
        .collect();
    let numbers: Option<Vec<Value>> = values
        .iter()
        .map(|raw| {
            parse_number(raw, false)
                .or_else(|| parse_number(raw, true))
                .map(Value::Number)
        })
        .collect();
    let strings = values.iter().cloned().map(Value::String).collect();

    bools
        .into_iter()
        .chain(numbers)
        .chain(std::iter::once(strings))
        .map(Value::Array)
        .collect()
}

/// Convert textual values to the JSON type of the field they fill.
fn coerce(slot: &Value, mut values: Vec<String>) -> Value {
    match slot {
        Value::Array(items) => Value::Array(
            values
                .into_iter()
                .map(|raw| coerce_scalar(items.first().unwrap_or(&Value::Null), raw))
                .collect(),
        ),
        _ => {
            let first = if values.is_empty() {
                String::new()
            } else {
                values.swap_remove(0)
            };
            coerce_scalar(slot, first)
        }
    }
}

fn coerce_scalar(slot: &Value, raw: String) -> Value {
    match slot {
        Value::Bool(_) | Value::Number(_) if raw.is_empty() => slot.clone(),
        Value::Bool(_) => parse_bool(&raw).map(Value::Bool).unwrap_or(Value::String(raw)),
        Value::Number(n) => parse_number(&raw, n.is_f64()).map(Value::Number).unwrap_or(Value::String(raw)),
        Value::Object(_) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        _ => Value::String(raw),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_number(raw: &str, float: bool) -> Option<Number> {
    if float {
        return raw.parse::<f64>().ok().and_then(Number::from_f64);
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(Number::from(v));
    }
    raw.parse::<u64>().ok().map(Number::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct GetAgeRequest {
        user_name: Option<String>,
    }
    crate::aggregate!(GetAgeRequest);

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct SearchRequest {
        keyword: String,
        page: u32,
        ratio: f64,
        exact: bool,
        tags: Vec<String>,
    }
    crate::aggregate!(SearchRequest);

    fn json(body: &str) -> BindSource<'_> {
        BindSource {
            content_type: Some("application/json"),
            body: body.as_bytes(),
            query: None,
        }
    }

    #[test]
    fn test_json_body_binds_pointer_field() {
        let req = bind(GetAgeRequest::default, &json(r#"{"user_name":"joe"}"#)).unwrap();
        assert_eq!(req.user_name.as_deref(), Some("joe"));
    }

    #[test]
    fn test_empty_request_is_zero_value() {
        let req = bind(GetAgeRequest::default, &BindSource::default()).unwrap();
        assert_eq!(req, GetAgeRequest::default());
    }

    #[test]
    fn test_query_fills_typed_fields() {
        let source = BindSource {
            query: Some("keyword=rust&page=3&ratio=0.5&exact=t&tags=a&tags=b&unknown=x"),
            ..Default::default()
        };
        let req = bind(SearchRequest::default, &source).unwrap();
        assert_eq!(
            req,
            SearchRequest {
                keyword: "rust".into(),
                page: 3,
                ratio: 0.5,
                exact: true,
                tags: vec!["a".into(), "b".into()],
            }
        );
    }

    #[test]
    fn test_body_wins_over_query() {
        let source = BindSource {
            content_type: Some("application/json; charset=utf-8"),
            body: br#"{"keyword":"body"}"#,
            query: Some("keyword=query&page=2"),
        };
        let req = bind(SearchRequest::default, &source).unwrap();
        assert_eq!(req.keyword, "body");
        assert_eq!(req.page, 2);
    }

    #[test]
    fn test_form_body() {
        let source = BindSource {
            content_type: Some("application/x-www-form-urlencoded"),
            body: b"keyword=hello+world&page=",
            query: None,
        };
        let req = bind(SearchRequest::default, &source).unwrap();
        assert_eq!(req.keyword, "hello world");
        assert_eq!(req.page, 0);
    }

    #[test]
    fn test_missing_content_type_is_json() {
        let source = BindSource {
            content_type: None,
            body: br#"{"page":9}"#,
            query: None,
        };
        assert_eq!(bind(SearchRequest::default, &source).unwrap().page, 9);
    }

    #[test]
    fn test_body_errors() {
        assert!(matches!(bind(SearchRequest::default, &json("{not json")), Err(BindError::Body(_))));
        assert!(matches!(bind(SearchRequest::default, &json("[1,2]")), Err(BindError::Body(_))));
        assert!(matches!(
            bind(SearchRequest::default, &json(r#"{"page":"many"}"#)),
            Err(BindError::Body(_))
        ));

        let source = BindSource {
            content_type: Some("text/plain"),
            body: b"hi",
            query: None,
        };
        assert_eq!(
            bind(SearchRequest::default, &source).unwrap_err(),
            BindError::UnsupportedContentType("text/plain".into())
        );
    }

    #[test]
    fn test_query_error() {
        let source = BindSource {
            query: Some("page=-1"),
            ..Default::default()
        };
        assert!(matches!(bind(SearchRequest::default, &source), Err(BindError::Query(_))));
    }

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct PageRequest {
        page: Option<u32>,
        strict: Option<bool>,
        ids: Vec<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }
    crate::aggregate!(PageRequest);

    fn query(query: &str) -> BindSource<'_> {
        BindSource {
            query: Some(query),
            ..Default::default()
        }
    }

    #[test]
    fn test_query_fills_optional_and_list_fields() {
        let req = bind(PageRequest::default, &query("page=3&strict=1&ids=1&ids=2&name=joe")).unwrap();
        assert_eq!(
            req,
            PageRequest {
                page: Some(3),
                strict: Some(true),
                ids: vec![1, 2],
                name: Some("joe".into()),
            }
        );
    }

    #[test]
    fn test_single_value_fills_list() {
        let req = bind(PageRequest::default, &query("ids=7")).unwrap();
        assert_eq!(req.ids, [7]);
    }

    #[test]
    fn test_numeric_text_into_optional_string() {
        let req = bind(PageRequest::default, &query("name=42&page=")).unwrap();
        assert_eq!(req.name.as_deref(), Some("42"));
        assert_eq!(req.page, None);
    }

    #[test]
    fn test_form_fills_optional_bool() {
        let source = BindSource {
            content_type: Some("application/x-www-form-urlencoded"),
            body: b"strict=true&page=5",
            query: None,
        };
        let req = bind(PageRequest::default, &source).unwrap();
        assert_eq!(req.strict, Some(true));
        assert_eq!(req.page, Some(5));
    }

    #[test]
    fn test_undecodable_optional_field_is_an_error() {
        assert!(matches!(
            bind(PageRequest::default, &query("page=lots")),
            Err(BindError::Query(_))
        ));
        assert!(matches!(
            bind(PageRequest::default, &query("ids=1&ids=x")),
            Err(BindError::Query(_))
        ));
    }

    #[test]
    fn test_non_record_payload_rejected() {
        let err = bind(String::default, &BindSource::default()).unwrap_err();
        assert!(matches!(err, BindError::NotAggregate(_)));
    }
}
