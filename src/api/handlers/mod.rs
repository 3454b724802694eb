// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod comments;
pub mod hashtags;
pub mod health;
pub mod metrics;
pub mod posts;
pub mod users;

/// Clamp optional pagination parameters to sane bounds.
pub(crate) fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (limit.unwrap_or(50).clamp(1, 100), offset.unwrap_or(0).max(0))
}
