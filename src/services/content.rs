// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::info;

use crate::db::{Database, DbConnection};
use crate::error::{ApiError, ValidationErrors};
use crate::models::comment::{Comment, CommentInput, CommentView, NewComment};
use crate::models::hashtag::{
    self, Hashtag, HashtagDetail, HashtagView, NewHashtag, MAX_HASHTAG_LEN,
};
use crate::models::post::{
    CreatePostInput, NewPost, Post, PostDetail, UpdatePost, UpdatePostInput,
};
use crate::models::user::User;
use crate::schema::{comments, hashtags, post_hashtags, posts, users};
use crate::services::{author_visible_to, build_post_views};

/// Content store: posts, their comments and their hashtag attachments.
#[derive(Clone)]
pub struct ContentService {
    db: Arc<Database>,
}

impl ContentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<DbConnection, ApiError> {
        Ok(self.db.get_connection().await?)
    }

    /// Create a post for the actor, resolving and attaching hashtags in the
    /// same transaction.
    pub async fn create_post(
        &self,
        actor_id: i32,
        input: CreatePostInput,
    ) -> Result<PostDetail, ApiError> {
        let mut errors = ValidationErrors::new();
        if input.content.trim().is_empty() {
            errors.add("content", "must not be empty");
        }
        validate_hashtag_names(&input.hashtags, &mut errors);
        errors.into_result()?;

        let new_post = NewPost {
            author_id: actor_id,
            content: input.content,
            image: input.image,
            created_at: Utc::now(),
        };
        let names = input.hashtags;

        let mut conn = self.conn().await?;
        let post = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    let post = diesel::insert_into(posts::table)
                        .values(&new_post)
                        .get_result::<Post>(conn)
                        .await?;
                    attach_hashtags(conn, post.id, &names).await?;
                    Ok(post)
                }
                .scope_boxed()
            })
            .await?;

        info!("Created post {} by user {}", post.id, actor_id);
        self.get_post(actor_id, post.id).await
    }

    /// Fetch one post with author, comments and derived counters. Resolved
    /// under the actor's feed scope: a post from an unfollowed author is
    /// reported as missing, exactly as the list endpoint would omit it.
    pub async fn get_post(&self, actor_id: i32, post_id: i32) -> Result<PostDetail, ApiError> {
        let mut conn = self.conn().await?;

        let row = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(post_id))
            .select((Post::as_select(), User::as_select()))
            .first::<(Post, User)>(&mut conn)
            .await
            .optional()?
            .ok_or(ApiError::NotFound("post"))?;

        if !author_visible_to(&mut conn, actor_id, row.0.author_id).await? {
            return Err(ApiError::NotFound("post"));
        }

        let comments = load_comment_views(&mut conn, post_id).await?;
        let mut views = build_post_views(&mut conn, vec![row]).await?;
        let post = views.remove(0);
        Ok(PostDetail { post, comments })
    }

    /// Update a post's content or image and attach additional hashtags.
    /// Only the author may modify a post; `created_at` is never touched.
    pub async fn update_post(
        &self,
        actor_id: i32,
        post_id: i32,
        input: UpdatePostInput,
    ) -> Result<PostDetail, ApiError> {
        let mut errors = ValidationErrors::new();
        if let Some(content) = &input.content {
            if content.trim().is_empty() {
                errors.add("content", "must not be empty");
            }
        }
        validate_hashtag_names(&input.hashtags, &mut errors);
        errors.into_result()?;

        let changes = UpdatePost {
            content: input.content,
            image: input.image,
        };
        let names = input.hashtags;

        let mut conn = self.conn().await?;
        conn.transaction::<_, ApiError, _>(|conn| {
            async move {
                require_author(conn, post_id, actor_id).await?;
                if changes.content.is_some() || changes.image.is_some() {
                    diesel::update(posts::table.find(post_id))
                        .set(&changes)
                        .execute(conn)
                        .await?;
                }
                attach_hashtags(conn, post_id, &names).await
            }
            .scope_boxed()
        })
        .await?;

        info!("Updated post {} by user {}", post_id, actor_id);
        self.get_post(actor_id, post_id).await
    }

    /// Delete a post. Only the author may delete it; comments, likes and
    /// hashtag attachments go with it.
    pub async fn delete_post(&self, actor_id: i32, post_id: i32) -> Result<(), ApiError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, ApiError, _>(|conn| {
            async move {
                require_author(conn, post_id, actor_id).await?;
                diesel::delete(posts::table.find(post_id)).execute(conn).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        info!("Deleted post {} by user {}", post_id, actor_id);
        Ok(())
    }

    /// Attach a comment by the actor to a post. Any authenticated actor may
    /// comment; no follow relationship is required.
    pub async fn add_comment(
        &self,
        actor_id: i32,
        post_id: i32,
        input: CommentInput,
    ) -> Result<CommentView, ApiError> {
        if input.content.trim().is_empty() {
            return Err(ApiError::invalid("content", "must not be empty"));
        }

        let mut conn = self.conn().await?;
        ensure_post_exists(&mut conn, post_id).await?;

        let new_comment = NewComment {
            author_id: actor_id,
            post_id,
            content: input.content,
            created_at: Utc::now(),
        };
        let comment = diesel::insert_into(comments::table)
            .values(&new_comment)
            .get_result::<Comment>(&mut conn)
            .await
            .map_err(|e| match e {
                // The post can disappear between the check and the insert.
                diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::ForeignKeyViolation,
                    _,
                ) => ApiError::NotFound("post"),
                other => ApiError::Database(other),
            })?;

        let author = users::table
            .find(actor_id)
            .select(users::email)
            .first::<String>(&mut conn)
            .await?;

        info!("Added comment {} to post {}", comment.id, post_id);
        Ok(CommentView {
            id: comment.id,
            author,
            content: comment.content,
            created_at: comment.created_at,
        })
    }

    /// Comments attached to a post, oldest first.
    pub async fn list_comments(&self, post_id: i32) -> Result<Vec<CommentView>, ApiError> {
        let mut conn = self.conn().await?;
        ensure_post_exists(&mut conn, post_id).await?;
        load_comment_views(&mut conn, post_id).await
    }

    /// Edit a comment's content. Only the author may modify a comment.
    pub async fn update_comment(
        &self,
        actor_id: i32,
        comment_id: i32,
        input: CommentInput,
    ) -> Result<CommentView, ApiError> {
        if input.content.trim().is_empty() {
            return Err(ApiError::invalid("content", "must not be empty"));
        }

        let mut conn = self.conn().await?;
        let comment = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    let comment = comments::table
                        .find(comment_id)
                        .first::<Comment>(conn)
                        .await
                        .optional()?
                        .ok_or(ApiError::NotFound("comment"))?;
                    if comment.author_id != actor_id {
                        return Err(ApiError::Forbidden(
                            "only the author may edit a comment",
                        ));
                    }
                    let comment = diesel::update(comments::table.find(comment_id))
                        .set(comments::content.eq(input.content))
                        .get_result::<Comment>(conn)
                        .await?;
                    Ok(comment)
                }
                .scope_boxed()
            })
            .await?;

        let author = users::table
            .find(comment.author_id)
            .select(users::email)
            .first::<String>(&mut conn)
            .await?;
        Ok(CommentView {
            id: comment.id,
            author,
            content: comment.content,
            created_at: comment.created_at,
        })
    }

    /// Delete a comment. Only the author may delete it.
    pub async fn delete_comment(&self, actor_id: i32, comment_id: i32) -> Result<(), ApiError> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, ApiError, _>(|conn| {
            async move {
                let author_id = comments::table
                    .find(comment_id)
                    .select(comments::author_id)
                    .first::<i32>(conn)
                    .await
                    .optional()?
                    .ok_or(ApiError::NotFound("comment"))?;
                if author_id != actor_id {
                    return Err(ApiError::Forbidden(
                        "only the author may delete a comment",
                    ));
                }
                diesel::delete(comments::table.find(comment_id))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        info!("Deleted comment {} by user {}", comment_id, actor_id);
        Ok(())
    }

    /// Hashtags with their derived post counts, alphabetical.
    pub async fn list_hashtags(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HashtagView>, ApiError> {
        let mut conn = self.conn().await?;

        let tags = hashtags::table
            .order(hashtags::name.asc())
            .limit(limit)
            .offset(offset)
            .load::<Hashtag>(&mut conn)
            .await?;
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let tag_ids: Vec<i32> = tags.iter().map(|tag| tag.id).collect();
        let counts: std::collections::HashMap<i32, i64> = post_hashtags::table
            .filter(post_hashtags::hashtag_id.eq_any(&tag_ids))
            .group_by(post_hashtags::hashtag_id)
            .select((post_hashtags::hashtag_id, diesel::dsl::count_star()))
            .load::<(i32, i64)>(&mut conn)
            .await?
            .into_iter()
            .collect();

        Ok(tags
            .into_iter()
            .map(|tag| {
                let posts_count = counts.get(&tag.id).copied().unwrap_or(0);
                HashtagView::from_count(tag, posts_count)
            })
            .collect())
    }

    /// Fetch one hashtag by name (accepted with or without the leading `#`)
    /// together with the posts referencing it, newest first.
    pub async fn hashtag_detail(&self, name: &str) -> Result<HashtagDetail, ApiError> {
        let normalized = hashtag::normalize_name(name);
        let mut conn = self.conn().await?;

        let tag = hashtags::table
            .filter(hashtags::name.eq(normalized))
            .first::<Hashtag>(&mut conn)
            .await
            .optional()?
            .ok_or(ApiError::NotFound("hashtag"))?;

        let rows = post_hashtags::table
            .inner_join(posts::table.inner_join(users::table))
            .filter(post_hashtags::hashtag_id.eq(tag.id))
            .order((posts::created_at.desc(), posts::id.desc()))
            .select((Post::as_select(), User::as_select()))
            .load::<(Post, User)>(&mut conn)
            .await?;
        let posts = build_post_views(&mut conn, rows).await?;

        Ok(HashtagDetail {
            id: tag.id,
            name: tag.external_name(),
            posts,
        })
    }
}

/// Resolve each name to an existing hashtag or create it, then attach it to
/// the post. Re-attaching is a no-op; the association has set semantics.
async fn attach_hashtags(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    names: &[String],
) -> Result<(), ApiError> {
    for raw in names {
        let name = hashtag::normalize_name(raw);

        // Race-safe get-or-create keyed on the unique name.
        diesel::insert_into(hashtags::table)
            .values(&NewHashtag {
                name: name.to_string(),
            })
            .on_conflict(hashtags::name)
            .do_nothing()
            .execute(conn)
            .await?;
        let hashtag_id = hashtags::table
            .filter(hashtags::name.eq(name))
            .select(hashtags::id)
            .first::<i32>(conn)
            .await?;

        diesel::insert_into(post_hashtags::table)
            .values((
                post_hashtags::post_id.eq(post_id),
                post_hashtags::hashtag_id.eq(hashtag_id),
            ))
            .on_conflict_do_nothing()
            .execute(conn)
            .await?;
    }
    Ok(())
}

fn validate_hashtag_names(names: &[String], errors: &mut ValidationErrors) {
    for raw in names {
        let name = hashtag::normalize_name(raw);
        if name.trim().is_empty() {
            errors.add("hashtags", format!("empty hashtag name: {:?}", raw));
        } else if name.chars().count() > MAX_HASHTAG_LEN {
            errors.add("hashtags", format!("hashtag name too long: {:?}", raw));
        }
    }
}

async fn ensure_post_exists(conn: &mut AsyncPgConnection, post_id: i32) -> Result<(), ApiError> {
    posts::table
        .find(post_id)
        .select(posts::id)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("post"))?;
    Ok(())
}

async fn require_author(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    actor_id: i32,
) -> Result<(), ApiError> {
    let author_id = posts::table
        .find(post_id)
        .select(posts::author_id)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("post"))?;
    if author_id != actor_id {
        return Err(ApiError::Forbidden("only the author may modify a post"));
    }
    Ok(())
}

async fn load_comment_views(
    conn: &mut AsyncPgConnection,
    post_id: i32,
) -> Result<Vec<CommentView>, ApiError> {
    let rows = comments::table
        .inner_join(users::table)
        .filter(comments::post_id.eq(post_id))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select((Comment::as_select(), users::email))
        .load::<(Comment, String)>(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(comment, author)| CommentView {
            id: comment.id,
            author,
            content: comment.content,
            created_at: comment.created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashtag_names_are_validated_after_normalization() {
        let mut errors = ValidationErrors::new();
        validate_hashtag_names(
            &["python".to_string(), "#news".to_string()],
            &mut errors,
        );
        assert!(errors.is_empty());

        let mut errors = ValidationErrors::new();
        validate_hashtag_names(
            &["#".to_string(), "a".repeat(MAX_HASHTAG_LEN + 1)],
            &mut errors,
        );
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.errors.iter().all(|e| e.field == "hashtags"));
    }
}
