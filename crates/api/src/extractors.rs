//! Request extractors.

use std::{collections::HashMap, convert::Infallible};

use axum::{
    Form,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::{HeaderMap, header, request::Parts},
};
use bytes::Bytes;
use jardin_common::AppError;
use jardin_core::{Caller, FileUpload, Origin};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::middleware::AppState;

/// The caller resolved by the auth middleware; anonymous when absent.
#[derive(Debug, Clone)]
pub struct CurrentCaller(pub Caller);

impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Caller>()
                .cloned()
                .unwrap_or_else(Caller::anonymous),
        ))
    }
}

/// Scheme and host the client used to reach us.
#[derive(Debug, Clone)]
pub struct RequestOrigin(pub Origin);

impl FromRequestParts<AppState> for RequestOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let host = header_str(&parts.headers, header::HOST.as_str())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()));

        let Some(host) = host else {
            return Ok(Self(state.site_origin.clone()));
        };

        let forwarded_https = state.trust_forwarded_proto
            && header_str(&parts.headers, "x-forwarded-proto")
                .and_then(|v| v.split(',').next())
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));
        let scheme = if forwarded_https { "https" } else { "http" };

        Ok(Self(Origin::new(scheme, &host)))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// A write body given as JSON, a urlencoded form, or multipart form data.
///
/// Text fields are deserialized into `T`; file parts are kept by field name.
#[derive(Debug)]
pub struct Payload<T> {
    /// Deserialized text fields.
    pub input: T,
    /// File parts keyed by field name.
    pub files: HashMap<String, FileUpload>,
}

impl<T> Payload<T> {
    /// Take the file submitted under `field`, if any.
    pub fn take_file(&mut self, field: &str) -> Option<FileUpload> {
        self.files.remove(field)
    }
}

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = header_str(req.headers(), header::CONTENT_TYPE.as_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let (fields, files) = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            read_multipart(multipart).await?
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            let fields = form
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            (Value::Object(fields), HashMap::new())
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            (parse_json(&body)?, HashMap::new())
        };

        let input =
            serde_json::from_value(fields).map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(Self { input, files })
    }
}

fn parse_json(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("JSON parse error - {e}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(AppError::BadRequest(
            "Expected a JSON object as the request body".to_string(),
        ))
    }
}

async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Value, HashMap<String, FileUpload>), AppError> {
    let mut fields = Map::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                // Browsers send an empty part for an untouched file input.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                files.insert(
                    name,
                    FileUpload {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                fields.insert(name, Value::String(text));
            }
        }
    }

    Ok((Value::Object(fields), files))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_empty_object() {
        assert_eq!(parse_json(b"").ok(), Some(Value::Object(Map::new())));
        assert_eq!(parse_json(b"  \n").ok(), Some(Value::Object(Map::new())));
    }

    #[test]
    fn test_body_must_be_object() {
        assert!(matches!(parse_json(b"[1, 2]"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_json(b"{oops"), Err(AppError::BadRequest(_))));
        assert!(parse_json(br#"{"title": "Feria"}"#).is_ok());
    }
}
