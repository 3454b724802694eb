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
use crate::models::user::{RegisterUserInput, UpdateProfileInput};
use crate::services::engagement::ToggleOutcome;

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FollowsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Register a new user account
pub async fn register_user(
    State(state): State<AppState>,
    Json(input): Json<RegisterUserInput>,
) -> Result<Response, ApiError> {
    let user = state.identity.register_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// Search users by email or name substring
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Response, ApiError> {
    let (limit, offset) = page(query.limit, query.offset);
    let users = state
        .identity
        .search_users(query.name.as_deref().unwrap_or(""), limit, offset)
        .await?;
    Ok(Json(users).into_response())
}

/// Get a user profile with derived counters
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Response, ApiError> {
    let user = state.identity.get_user(user_id).await?;
    Ok(Json(user).into_response())
}

/// Update the actor's own profile
pub async fn update_profile(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(user_id): Path<i32>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Response, ApiError> {
    let user = state.identity.update_profile(actor_id, user_id, input).await?;
    Ok(Json(user).into_response())
}

/// List users following the given user
pub async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<FollowsQuery>,
) -> Result<Response, ApiError> {
    let (limit, offset) = page(query.limit, query.offset);
    let users = state.engagement.followers(user_id, limit, offset).await?;
    Ok(Json(users).into_response())
}

/// List users the given user follows
pub async fn get_following(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<FollowsQuery>,
) -> Result<Response, ApiError> {
    let (limit, offset) = page(query.limit, query.offset);
    let users = state.engagement.following(user_id, limit, offset).await?;
    Ok(Json(users).into_response())
}

/// Toggle the actor's follow edge towards the given user
pub async fn toggle_follow(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(user_id): Path<i32>,
) -> Result<Response, ApiError> {
    match state.engagement.toggle_follow(actor_id, user_id).await? {
        ToggleOutcome::Added => {
            Ok((StatusCode::CREATED, Json(json!({ "following": true }))).into_response())
        }
        ToggleOutcome::Removed => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
