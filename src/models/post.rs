// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::comment::CommentView;
use crate::models::user::UserSummary;
use crate::schema::posts;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub author_id: i32,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

// created_at is deliberately absent: set once at creation, never modified.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = posts)]
pub struct UpdatePost {
    pub content: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostInput {
    pub content: String,
    pub image: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostInput {
    pub content: Option<String>,
    pub image: Option<String>,
    /// Additional hashtags to attach; existing attachments are kept.
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// List rendering with derived counters and hashtags in external form.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: i32,
    pub author: UserSummary,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub hashtags: Vec<String>,
}

/// Detail rendering: a `PostView` plus the attached comments.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub comments: Vec<CommentView>,
}
