// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::api::handlers::page;
use crate::api::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct HashtagQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// List hashtags with derived post counts
pub async fn list_hashtags(
    State(state): State<AppState>,
    Query(query): Query<HashtagQuery>,
) -> Result<Response, ApiError> {
    let (limit, offset) = page(query.limit, query.offset);
    let hashtags = state.content.list_hashtags(limit, offset).await?;
    Ok(Json(hashtags).into_response())
}

/// Get one hashtag by name, with the posts referencing it. The name is
/// accepted with or without the leading `#`.
pub async fn get_hashtag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let hashtag = state.content.hashtag_detail(&name).await?;
    Ok(Json(hashtag).into_response())
}
