// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use diesel::prelude::*;
use serde::Serialize;

use crate::models::post::PostView;
use crate::schema::hashtags;

/// Maximum stored length of a hashtag name (without the `#` prefix).
pub const MAX_HASHTAG_LEN: usize = 60;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = hashtags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Hashtag {
    pub id: i32,
    pub name: String,
}

impl Hashtag {
    /// External representation always carries the `#` prefix.
    pub fn external_name(&self) -> String {
        external_form(&self.name)
    }
}

/// External representation of a (canonical) hashtag name.
pub fn external_form(name: &str) -> String {
    format!("#{name}")
}

#[derive(Debug, Insertable)]
#[diesel(table_name = hashtags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewHashtag {
    pub name: String,
}

/// Canonical form: leading `#` characters stripped, stored as-is otherwise.
pub fn normalize_name(name: &str) -> &str {
    name.trim_start_matches('#')
}

/// List rendering with the derived post count.
#[derive(Debug, Serialize)]
pub struct HashtagView {
    pub id: i32,
    pub name: String,
    pub posts_count: i64,
}

impl HashtagView {
    pub fn from_count(hashtag: Hashtag, posts_count: i64) -> Self {
        let name = hashtag.external_name();
        HashtagView {
            id: hashtag.id,
            name,
            posts_count,
        }
    }
}

/// Detail rendering with the posts referencing the hashtag.
#[derive(Debug, Serialize)]
pub struct HashtagDetail {
    pub id: i32,
    pub name: String,
    pub posts: Vec<PostView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_leading_hash_only() {
        assert_eq!(normalize_name("#python"), "python");
        assert_eq!(normalize_name("python"), "python");
        assert_eq!(normalize_name("##news"), "news");
        assert_eq!(normalize_name("c#"), "c#");
        assert_eq!(normalize_name("#"), "");
    }

    #[test]
    fn external_name_adds_prefix() {
        let tag = Hashtag {
            id: 1,
            name: "python".to_string(),
        };
        assert_eq!(tag.external_name(), "#python");
    }
}
