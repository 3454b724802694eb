// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::db::{Database, DbConnection};
use crate::error::ApiError;
use crate::models::hashtag;
use crate::models::post::{Post, PostView};
use crate::models::user::User;
use crate::schema::{follows, hashtags, post_hashtags, posts, users};
use crate::services::build_post_views;

/// Optional feed narrowing; absent or empty parameters mean "no filter".
#[derive(Debug, Default)]
pub struct FeedFilter {
    pub hashtags: Option<String>,
    pub author_last_name: Option<String>,
}

/// Feed resolver: the visible post set for a viewer as a function of the
/// social graph.
#[derive(Clone)]
pub struct FeedService {
    db: Arc<Database>,
}

impl FeedService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<DbConnection, ApiError> {
        Ok(self.db.get_connection().await?)
    }

    /// Posts whose author is the viewer or someone the viewer follows,
    /// newest first. Filters narrow the scoped set, never widen it.
    pub async fn visible_posts(
        &self,
        viewer_id: i32,
        filter: &FeedFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, ApiError> {
        let mut conn = self.conn().await?;

        let following_ids = follows::table
            .filter(follows::follower_id.eq(viewer_id))
            .select(follows::following_id);

        let mut query = posts::table
            .inner_join(users::table)
            .filter(
                posts::author_id
                    .eq(viewer_id)
                    .or(posts::author_id.eq_any(following_ids)),
            )
            .select((Post::as_select(), User::as_select()))
            .order((posts::created_at.desc(), posts::id.desc()))
            .into_boxed();

        if let Some(tag) = filter.hashtags.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", hashtag::normalize_name(tag));
            query = query.filter(exists(
                post_hashtags::table
                    .inner_join(hashtags::table)
                    .filter(post_hashtags::post_id.eq(posts::id))
                    .filter(hashtags::name.ilike(pattern)),
            ));
        }

        if let Some(name) = filter
            .author_last_name
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            query = query.filter(users::last_name.ilike(format!("%{}%", name)));
        }

        let rows = query
            .limit(limit)
            .offset(offset)
            .load::<(Post, User)>(&mut conn)
            .await?;

        debug!("Resolved feed for user {}: {} posts", viewer_id, rows.len());
        build_post_views(&mut conn, rows).await
    }
}
