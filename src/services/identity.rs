// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::RunQueryDsl;
use tracing::info;

use crate::db::{Database, DbConnection};
use crate::error::{ApiError, ValidationErrors};
use crate::models::user::{
    NewUser, RegisterUserInput, UpdateProfileInput, UpdateUserProfile, User, UserDetail,
    UserSummary,
};
use crate::schema::{follows, posts, users};

/// Identity store: accounts, credentials and profile fields. The social
/// graph around an account is read here only as derived counters.
#[derive(Clone)]
pub struct IdentityService {
    db: Arc<Database>,
}

impl IdentityService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<DbConnection, ApiError> {
        Ok(self.db.get_connection().await?)
    }

    /// Register a new account with a bcrypt-hashed password.
    pub async fn register_user(&self, input: RegisterUserInput) -> Result<User, ApiError> {
        validate_registration(&input)?;

        let password_hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?;
        let now = Utc::now();
        let new_user = NewUser {
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            bio: input.bio,
            profile_picture: None,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.conn().await?;
        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .get_result::<User>(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ApiError::invalid("email", "already registered")
                }
                other => ApiError::Database(other),
            })?;

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Fetch a user with derived social-graph counters.
    pub async fn get_user(&self, user_id: i32) -> Result<UserDetail, ApiError> {
        let mut conn = self.conn().await?;
        let user = users::table
            .find(user_id)
            .first::<User>(&mut conn)
            .await
            .optional()?
            .ok_or(ApiError::NotFound("user"))?;

        let followers_count = follows::table
            .filter(follows::following_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        let following_count = follows::table
            .filter(follows::follower_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        let posts_count = posts::table
            .filter(posts::author_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        Ok(UserDetail::from_counts(
            user,
            followers_count,
            following_count,
            posts_count,
        ))
    }

    /// Apply profile changes. Only the owner may edit a profile.
    pub async fn update_profile(
        &self,
        actor_id: i32,
        user_id: i32,
        input: UpdateProfileInput,
    ) -> Result<UserDetail, ApiError> {
        if actor_id != user_id {
            return Err(ApiError::Forbidden("only the owner may edit a profile"));
        }

        let changes = UpdateUserProfile {
            first_name: input.first_name,
            last_name: input.last_name,
            bio: input.bio,
            profile_picture: input.profile_picture,
            updated_at: Utc::now(),
        };

        let mut conn = self.conn().await?;
        let updated = diesel::update(users::table.find(user_id))
            .set(&changes)
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(ApiError::NotFound("user"));
        }

        self.get_user(user_id).await
    }

    /// Case-insensitive substring search over email, first and last name.
    pub async fn search_users(
        &self,
        name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserSummary>, ApiError> {
        let mut conn = self.conn().await?;

        let mut query = users::table.order(users::id.asc()).into_boxed();
        if !name.is_empty() {
            let pattern = format!("%{}%", name);
            query = query.filter(
                users::email
                    .ilike(pattern.clone())
                    .or(users::first_name.ilike(pattern.clone()))
                    .or(users::last_name.ilike(pattern)),
            );
        }

        let found = query
            .limit(limit)
            .offset(offset)
            .load::<User>(&mut conn)
            .await?;
        Ok(found.into_iter().map(UserSummary::from).collect())
    }
}

fn validate_registration(input: &RegisterUserInput) -> Result<(), ApiError> {
    let mut errors = ValidationErrors::new();
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.add("email", "must be a valid email address");
    }
    if input.password.chars().count() < 8 {
        errors.add("password", "must be at least 8 characters");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: &str, password: &str) -> RegisterUserInput {
        RegisterUserInput {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            bio: String::new(),
        }
    }

    #[test]
    fn registration_requires_email_shape_and_password_length() {
        assert!(validate_registration(&input("a@example.com", "longenough")).is_ok());

        match validate_registration(&input("", "short")) {
            Err(ApiError::Validation(errors)) => {
                let fields: Vec<_> = errors.errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["email", "password"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        assert!(validate_registration(&input("not-an-email", "longenough")).is_err());
    }
}
