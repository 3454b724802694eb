// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// The authenticated actor, resolved by the upstream auth collaborator and
/// supplied per request. Core operations receive it as an explicit
/// parameter, never from ambient state.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i32>().ok())
            .map(Actor)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing or invalid x-actor-id header" })),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/posts");
        if let Some(value) = value {
            builder = builder.header(ACTOR_HEADER, value);
        }
        let (parts, _) = builder.body(()).expect("request builds").into_parts();
        parts
    }

    #[test]
    fn resolves_actor_from_header() {
        let mut parts = parts_with_header(Some("42"));
        let actor = tokio_test::block_on(Actor::from_request_parts(&mut parts, &()));
        assert!(matches!(actor, Ok(Actor(42))));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        for value in [None, Some("abc"), Some("")] {
            let mut parts = parts_with_header(value);
            let actor = tokio_test::block_on(Actor::from_request_parts(&mut parts, &()));
            assert!(actor.is_err());
        }
    }
}
