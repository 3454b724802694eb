use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::comments;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: i32,
    pub author_id: i32,
    pub post_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComment {
    pub author_id: i32,
    pub post_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub content: String,
}

/// Comment rendering with the author identified by email.
#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
