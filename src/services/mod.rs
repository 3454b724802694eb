// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod content;
pub mod engagement;
pub mod feed;
pub mod identity;

use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::ApiError;
use crate::models::hashtag::external_form;
use crate::models::post::{Post, PostView};
use crate::models::social_graph::Follow;
use crate::models::user::User;
use crate::schema::{comments, follows, hashtags, post_hashtags, post_likes};

/// Feed-scope predicate for a single post: the author is the actor, or the
/// actor follows the author.
pub(crate) async fn author_visible_to(
    conn: &mut AsyncPgConnection,
    actor_id: i32,
    author_id: i32,
) -> Result<bool, ApiError> {
    if actor_id == author_id {
        return Ok(true);
    }
    let edge = follows::table
        .find((actor_id, author_id))
        .first::<Follow>(conn)
        .await
        .optional()?;
    Ok(edge.is_some())
}

/// Assemble list views for already-scoped `(post, author)` rows. Counters are
/// derived from live relationship cardinality; grouped queries keep the read
/// path at three statements instead of three per post.
pub(crate) async fn build_post_views(
    conn: &mut AsyncPgConnection,
    rows: Vec<(Post, User)>,
) -> Result<Vec<PostView>, ApiError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let post_ids: Vec<i32> = rows.iter().map(|(post, _)| post.id).collect();

    let like_counts: HashMap<i32, i64> = post_likes::table
        .filter(post_likes::post_id.eq_any(&post_ids))
        .group_by(post_likes::post_id)
        .select((post_likes::post_id, diesel::dsl::count_star()))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    let comment_counts: HashMap<i32, i64> = comments::table
        .filter(comments::post_id.eq_any(&post_ids))
        .group_by(comments::post_id)
        .select((comments::post_id, diesel::dsl::count_star()))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    let tag_rows = post_hashtags::table
        .inner_join(hashtags::table)
        .filter(post_hashtags::post_id.eq_any(&post_ids))
        .order(hashtags::name.asc())
        .select((post_hashtags::post_id, hashtags::name))
        .load::<(i32, String)>(conn)
        .await?;
    let mut tags_by_post: HashMap<i32, Vec<String>> = HashMap::new();
    for (post_id, name) in tag_rows {
        tags_by_post
            .entry(post_id)
            .or_default()
            .push(external_form(&name));
    }

    Ok(rows
        .into_iter()
        .map(|(post, author)| PostView {
            id: post.id,
            likes_count: like_counts.get(&post.id).copied().unwrap_or(0),
            comments_count: comment_counts.get(&post.id).copied().unwrap_or(0),
            hashtags: tags_by_post.remove(&post.id).unwrap_or_default(),
            author: author.into(),
            content: post.content,
            image: post.image,
            created_at: post.created_at,
        })
        .collect())
}
