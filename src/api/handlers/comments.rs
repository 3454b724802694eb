// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::extract::Actor;
use crate::api::AppState;
use crate::error::ApiError;
use crate::models::comment::CommentInput;

/// List comments attached to a post
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i32>,
) -> Result<Response, ApiError> {
    let comments = state.content.list_comments(post_id).await?;
    Ok(Json(comments).into_response())
}

/// Attach a comment by the actor to a post
pub async fn add_comment(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(post_id): Path<i32>,
    Json(input): Json<CommentInput>,
) -> Result<Response, ApiError> {
    let comment = state.content.add_comment(actor_id, post_id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

/// Edit a comment authored by the actor
pub async fn update_comment(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(comment_id): Path<i32>,
    Json(input): Json<CommentInput>,
) -> Result<Response, ApiError> {
    let comment = state
        .content
        .update_comment(actor_id, comment_id, input)
        .await?;
    Ok(Json(comment).into_response())
}

/// Delete a comment authored by the actor
pub async fn delete_comment(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(comment_id): Path<i32>,
) -> Result<Response, ApiError> {
    state.content.delete_comment(actor_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
