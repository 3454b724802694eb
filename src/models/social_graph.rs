// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{follows, post_likes};

/// Directed follow edge: `follower_id` follows `following_id`. Both the
/// followers and the following view of the graph derive from this one row.
#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[diesel(table_name = follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub follower_id: i32,
    pub following_id: i32,
}

/// Like edge: membership of a user in a post's like set. No timestamp is
/// recorded.
#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[diesel(table_name = post_likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostLike {
    pub post_id: i32,
    pub user_id: i32,
}
