/// Page responses for the trick screens
///
/// The trick pages answer the way a server-rendered site would, expressed as
/// JSON:
///
/// - [`View`]: `200` with `{ "view": "<name>", ...data }`
/// - [`FlashRedirect`]: `303 See Other` with a `Location` header and a body
///   carrying the one-shot flash (`success` or `errors`)
///
/// ```text
/// HTTP/1.1 303 See Other
/// Location: /user/tricks/eager-load-counts
///
/// { "location": "/user/tricks/eager-load-counts", "success": "The trick has been updated." }
/// ```

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tricks_shared::{forms::FieldError, lang::Message};

/// A named page and its data
#[derive(Debug, Clone)]
pub struct View {
    name: &'static str,
    data: Map<String, Value>,
}

impl View {
    /// `data` must be a JSON object; other values are stored under `"data"`
    pub fn new(name: &'static str, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        Self { name, data }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        let mut body = Map::with_capacity(self.data.len() + 1);
        body.insert("view".to_string(), Value::String(self.name.to_string()));
        body.extend(self.data);

        (StatusCode::OK, Json(Value::Object(body))).into_response()
    }
}

/// A redirect with an optional flash payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashRedirect {
    pub location: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl FlashRedirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            success: None,
            errors: Vec::new(),
        }
    }

    /// Redirect to the page the form was submitted from
    ///
    /// Uses the `Referer` header when it points at this site, otherwise
    /// `fallback`.
    pub fn back(headers: &HeaderMap, fallback: impl Into<String>) -> Self {
        Self::to(same_site_referer(headers).unwrap_or_else(|| fallback.into()))
    }

    pub fn with_success(mut self, message: Message) -> Self {
        tracing::debug!(key = message.key(), location = %self.location, "Flashing message");
        self.success = Some(message.text().to_string());
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let location = match HeaderValue::from_str(&self.location) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(location = %self.location, "Unrepresentable redirect target");
                HeaderValue::from_static("/")
            }
        };

        let mut response = (StatusCode::SEE_OTHER, Json(self)).into_response();
        response.headers_mut().insert(header::LOCATION, location);
        response
    }
}

/// Path and query of the `Referer` header, if it names this site
///
/// Accepts a relative path (`/user/tricks/new`) or an absolute URL whose
/// authority equals the request's `Host`. Protocol-relative values (`//evil`,
/// `/\evil`) are refused.
fn same_site_referer(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?.trim();

    if referer.starts_with('/') {
        return is_local_path(referer).then(|| referer.to_string());
    }

    let rest = referer
        .strip_prefix("https://")
        .or_else(|| referer.strip_prefix("http://"))?;
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, "/"),
    };

    let host = headers.get(header::HOST)?.to_str().ok()?;
    if !authority.eq_ignore_ascii_case(host) || !is_local_path(path) {
        return None;
    }

    Some(path.to_string())
}

/// A path browsers resolve against the current origin
///
/// Browsers read a backslash as a slash, so `/\host` is protocol-relative too.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/') && !matches!(chars.next(), Some('/' | '\\'))
}
