// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::users;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Full name derived as concatenation; never stored.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input accepted at the boundary.
#[derive(Debug, Deserialize)]
pub struct RegisterUserInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
}

/// Profile changes accepted at the boundary.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// Compact user rendering for lists and embedded author fields.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub profile_picture: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        UserSummary {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            profile_picture: user.profile_picture,
        }
    }
}

/// Detail rendering with derived social-graph counters.
#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub bio: String,
    pub profile_picture: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub created_at: DateTime<Utc>,
}

impl UserDetail {
    pub fn from_counts(
        user: User,
        followers_count: i64,
        following_count: i64,
        posts_count: i64,
    ) -> Self {
        let full_name = user.full_name();
        UserDetail {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            full_name,
            bio: user.bio,
            profile_picture: user.profile_picture,
            followers_count,
            following_count,
            posts_count,
            created_at: user.created_at,
        }
    }
}
