// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

// Define users table
table! {
    users (id) {
        id -> Integer,
        email -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        bio -> Text,
        profile_picture -> Nullable<Varchar>,
        password_hash -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// Define posts table
table! {
    posts (id) {
        id -> Integer,
        author_id -> Integer,
        content -> Text,
        image -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

// Define comments table
table! {
    comments (id) {
        id -> Integer,
        author_id -> Integer,
        post_id -> Integer,
        content -> Text,
        created_at -> Timestamptz,
    }
}

// Define hashtags table
table! {
    hashtags (id) {
        id -> Integer,
        name -> Varchar,
    }
}

// Association table between posts and hashtags
table! {
    post_hashtags (post_id, hashtag_id) {
        post_id -> Integer,
        hashtag_id -> Integer,
    }
}

// Like edges: membership of a user in a post's like set
table! {
    post_likes (post_id, user_id) {
        post_id -> Integer,
        user_id -> Integer,
    }
}

// Directed follow edges: follower_id follows following_id
table! {
    follows (follower_id, following_id) {
        follower_id -> Integer,
        following_id -> Integer,
    }
}

joinable!(posts -> users (author_id));
joinable!(comments -> users (author_id));
joinable!(comments -> posts (post_id));
joinable!(post_hashtags -> posts (post_id));
joinable!(post_hashtags -> hashtags (hashtag_id));
joinable!(post_likes -> posts (post_id));
joinable!(post_likes -> users (user_id));

// Allow joining the tables if needed; follows references users twice and is
// always queried through explicit filters instead of joinable!.
allow_tables_to_appear_in_same_query!(
    users,
    posts,
    comments,
    hashtags,
    post_hashtags,
    post_likes,
    follows,
);
