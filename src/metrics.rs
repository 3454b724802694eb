// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

/// Engagement toggles processed, labelled by edge kind and outcome.
pub static ENGAGEMENT_TOGGLES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "social_api_engagement_toggles_total",
        "Engagement toggle operations processed",
        &["kind", "outcome"]
    )
    .expect("failed to register engagement toggle counter")
});
