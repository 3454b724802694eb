// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::info;

use crate::db::{Database, DbConnection};
use crate::error::ApiError;
use crate::metrics::ENGAGEMENT_TOGGLES;
use crate::models::social_graph::{Follow, PostLike};
use crate::models::user::{User, UserSummary};
use crate::schema::{follows, post_likes, posts, users};
use crate::services::author_visible_to;

/// Result of a toggle: the edge was either added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

impl ToggleOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ToggleOutcome::Added => "added",
            ToggleOutcome::Removed => "removed",
        }
    }
}

/// Engagement engine: like and follow toggles over the shared edge tables,
/// plus the social-graph listings derived from them.
#[derive(Clone)]
pub struct EngagementService {
    db: Arc<Database>,
}

impl EngagementService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<DbConnection, ApiError> {
        Ok(self.db.get_connection().await?)
    }

    /// Flip the actor's membership in a post's like set. The conditional
    /// delete and the compensating insert run in one transaction, so
    /// concurrent toggles on the same edge serialize on the row instead of
    /// double-flipping.
    pub async fn toggle_like(
        &self,
        actor_id: i32,
        post_id: i32,
    ) -> Result<ToggleOutcome, ApiError> {
        let mut conn = self.conn().await?;
        let outcome = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    let author_id = posts::table
                        .find(post_id)
                        .select(posts::author_id)
                        .first::<i32>(conn)
                        .await
                        .optional()?
                        .ok_or(ApiError::NotFound("post"))?;

                    // The post is resolved under feed scope, as the list
                    // endpoint resolves it.
                    if !author_visible_to(conn, actor_id, author_id).await? {
                        return Err(ApiError::NotFound("post"));
                    }

                    let removed =
                        diesel::delete(post_likes::table.find((post_id, actor_id)))
                            .execute(conn)
                            .await?;
                    if removed > 0 {
                        return Ok(ToggleOutcome::Removed);
                    }

                    diesel::insert_into(post_likes::table)
                        .values(&PostLike {
                            post_id,
                            user_id: actor_id,
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                    Ok(ToggleOutcome::Added)
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| e.conflict_on("like edge"))?;

        ENGAGEMENT_TOGGLES
            .with_label_values(&["like", outcome.as_str()])
            .inc();
        info!(
            "Toggled like: user {} -> post {} ({})",
            actor_id,
            post_id,
            outcome.as_str()
        );
        Ok(outcome)
    }

    /// Flip the actor -> target follow edge. Both the followers and the
    /// following view derive from the one edge row, so the dual-sided update
    /// is all-or-nothing within the transaction.
    pub async fn toggle_follow(
        &self,
        actor_id: i32,
        target_id: i32,
    ) -> Result<ToggleOutcome, ApiError> {
        if actor_id == target_id {
            return Err(ApiError::invalid("target", "cannot follow yourself"));
        }

        let mut conn = self.conn().await?;
        let outcome = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    users::table
                        .find(target_id)
                        .select(users::id)
                        .first::<i32>(conn)
                        .await
                        .optional()?
                        .ok_or(ApiError::NotFound("user"))?;

                    let removed =
                        diesel::delete(follows::table.find((actor_id, target_id)))
                            .execute(conn)
                            .await?;
                    if removed > 0 {
                        return Ok(ToggleOutcome::Removed);
                    }

                    diesel::insert_into(follows::table)
                        .values(&Follow {
                            follower_id: actor_id,
                            following_id: target_id,
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                    Ok(ToggleOutcome::Added)
                }
                .scope_boxed()
            })
            .await
            .map_err(|e| e.conflict_on("follow edge"))?;

        ENGAGEMENT_TOGGLES
            .with_label_values(&["follow", outcome.as_str()])
            .inc();
        info!(
            "Toggled follow: {} -> {} ({})",
            actor_id,
            target_id,
            outcome.as_str()
        );
        Ok(outcome)
    }

    /// Users following `user_id` (incoming edges).
    pub async fn followers(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>, ApiError> {
        let mut conn = self.conn().await?;
        ensure_user_exists(&mut conn, user_id).await?;

        let follower_ids = follows::table
            .filter(follows::following_id.eq(user_id))
            .select(follows::follower_id);
        let found = users::table
            .filter(users::id.eq_any(follower_ids))
            .order(users::id.asc())
            .limit(limit)
            .offset(offset)
            .load::<User>(&mut conn)
            .await?;
        Ok(found.into_iter().map(UserSummary::from).collect())
    }

    /// Users that `user_id` follows (outgoing edges).
    pub async fn following(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>, ApiError> {
        let mut conn = self.conn().await?;
        ensure_user_exists(&mut conn, user_id).await?;

        let following_ids = follows::table
            .filter(follows::follower_id.eq(user_id))
            .select(follows::following_id);
        let found = users::table
            .filter(users::id.eq_any(following_ids))
            .order(users::id.asc())
            .limit(limit)
            .offset(offset)
            .load::<User>(&mut conn)
            .await?;
        Ok(found.into_iter().map(UserSummary::from).collect())
    }

    /// Live cardinality of a post's like set.
    pub async fn likes_count(&self, post_id: i32) -> Result<i64, ApiError> {
        let mut conn = self.conn().await?;
        let count = post_likes::table
            .filter(post_likes::post_id.eq(post_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(count)
    }
}

async fn ensure_user_exists(
    conn: &mut diesel_async::AsyncPgConnection,
    user_id: i32,
) -> Result<(), ApiError> {
    users::table
        .find(user_id)
        .select(users::id)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(())
}
