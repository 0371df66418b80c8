//! Response rendering.
//!
//! Existing clients compare bodies byte for byte against indented JSON, so
//! every body goes through [`PrettyJson`] rather than `axum::Json`.

use std::fmt::Display;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Fallback body when serialization itself fails.
const SERIALIZATION_FAILED_BODY: &str = "{\n  \"ok\": false\n}";

/// A JSON body rendered with two-space indentation.
#[derive(Debug, Clone)]
pub struct PrettyJson<T>(pub T);

impl<T: Serialize> IntoResponse for PrettyJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string_pretty(&self.0) {
            Ok(body) => (
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )],
                body,
            )
                .into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("application/json"),
                    )],
                    SERIALIZATION_FAILED_BODY,
                )
                    .into_response()
            }
        }
    }
}

/// `{"ok": <bool>}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OkBody {
    /// Outcome flag.
    pub ok: bool,
}

impl OkBody {
    /// `{"ok": true}`.
    pub const SUCCESS: Self = Self { ok: true };
    /// `{"ok": false}`.
    pub const FAILURE: Self = Self { ok: false };
}

/// Key that every body starts with.
const OK_KEY: &str = "ok";

/// `{"ok": true, <key>: <value>, ...}`, with `ok` always first.
///
/// An entry whose key is itself `ok` is left out.
#[derive(Debug, Clone)]
pub struct OkWith<I>(pub I);

impl<I, K, V> Serialize for OkWith<I>
where
    I: IntoIterator<Item = (K, V)> + Clone,
    K: Display,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(OK_KEY, &true)?;
        for (key, value) in self.0.clone() {
            let key = key.to_string();
            if key == OK_KEY {
                tracing::warn!("Omitting entry keyed `ok` from response");
                continue;
            }
            map.serialize_entry(&key, &value)?;
        }
        map.end()
    }
}

/// Give error responses that carry no JSON body of their own the standard
/// `{"ok": false}` body, keeping their status.
///
/// This covers rejections produced outside the handlers, such as the body
/// limit (413), the request timeout (408) and unmatched routes.
pub async fn json_error_bodies(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|value| value == "application/json");
    if is_json {
        return response;
    }

    (status, PrettyJson(OkBody::FAILURE)).into_response()
}
