//! Axum extractors that run an operation's chain before the handler.

use std::collections::HashMap;
use std::marker::PhantomData;

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Operation, record_from_pairs};
use crate::api::error::ApiError;

macro_rules! validated_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<O> {
            /// The record after validation and sanitizing.
            pub record: Value,
            operation: PhantomData<fn() -> O>,
        }

        impl<O: Operation> $name<O> {
            fn validate(record: Value) -> Result<Self, ApiError> {
                let record = O::chain().apply(record)?;
                Ok(Self {
                    record,
                    operation: PhantomData,
                })
            }

            pub fn into_inner(self) -> Value {
                self.record
            }

            /// Deserialize the validated record into a typed request.
            pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ApiError> {
                serde_json::from_value(self.record)
                    .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
            }
        }
    };
}

validated_record!(
    /// Validated JSON or URL-encoded form body.
    ValidatedBody
);

validated_record!(
    /// Validated query string. All values are strings.
    ValidatedQuery
);

validated_record!(
    /// Validated path parameters. All values are strings.
    ValidatedPath
);

fn is_form(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S, O> FromRequest<S> for ValidatedBody<O>
where
    S: Send + Sync,
    O: Operation,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let record = if is_form(req.headers()) {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            record_from_pairs(pairs)
        } else {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            value
        };
        Self::validate(record)
    }
}

impl<S, O> FromRequestParts<S> for ValidatedQuery<O>
where
    S: Send + Sync,
    O: Operation,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Self::validate(record_from_pairs(pairs))
    }
}

impl<S, O> FromRequestParts<S> for ValidatedPath<O>
where
    S: Send + Sync,
    O: Operation,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Self::validate(record_from_pairs(params))
    }
}
