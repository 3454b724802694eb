// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::extract::Actor;
use crate::api::handlers::page;
use crate::api::AppState;
use crate::error::ApiError;
use crate::models::post::{CreatePostInput, UpdatePostInput};
use crate::services::engagement::ToggleOutcome;
use crate::services::feed::FeedFilter;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub hashtags: Option<String>,
    pub author_last_name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// The actor's feed: own posts plus posts from followed authors
pub async fn list_feed(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    let (limit, offset) = page(query.limit, query.offset);
    let filter = FeedFilter {
        hashtags: query.hashtags,
        author_last_name: query.author_last_name,
    };
    let posts = state
        .feed
        .visible_posts(actor_id, &filter, limit, offset)
        .await?;
    Ok(Json(posts).into_response())
}

/// Create a post authored by the actor
pub async fn create_post(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Json(input): Json<CreatePostInput>,
) -> Result<Response, ApiError> {
    let post = state.content.create_post(actor_id, input).await?;
    Ok((StatusCode::CREATED, Json(post)).into_response())
}

/// Get a post visible to the actor
pub async fn get_post(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(post_id): Path<i32>,
) -> Result<Response, ApiError> {
    let post = state.content.get_post(actor_id, post_id).await?;
    Ok(Json(post).into_response())
}

/// Update a post authored by the actor
pub async fn update_post(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(post_id): Path<i32>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Response, ApiError> {
    let post = state.content.update_post(actor_id, post_id, input).await?;
    Ok(Json(post).into_response())
}

/// Delete a post authored by the actor
pub async fn delete_post(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(post_id): Path<i32>,
) -> Result<Response, ApiError> {
    state.content.delete_post(actor_id, post_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Toggle the actor's like on a post
pub async fn toggle_like(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(post_id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.engagement.toggle_like(actor_id, post_id).await? {
        ToggleOutcome::Added => {
            let likes_count = state.engagement.likes_count(post_id).await?;
            Ok((
                StatusCode::CREATED,
                Json(json!({ "liked": true, "likes_count": likes_count })),
            )
                .into_response())
        }
        ToggleOutcome::Removed => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
