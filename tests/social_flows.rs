//! Service-level integration tests against a real PostgreSQL database.
//!
//! These exercise the engagement, feed, content and identity services
//! end-to-end. They are ignored by default; run them with a reachable
//! `DATABASE_URL` (migrations are applied on connect):
//!
//!     cargo test -- --ignored

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mys_social_api::config::Config;
use mys_social_api::db::Database;
use mys_social_api::error::ApiError;
use mys_social_api::models::comment::CommentInput;
use mys_social_api::models::post::{CreatePostInput, UpdatePostInput};
use mys_social_api::models::user::RegisterUserInput;
use mys_social_api::services::content::ContentService;
use mys_social_api::services::engagement::{EngagementService, ToggleOutcome};
use mys_social_api::services::feed::{FeedFilter, FeedService};
use mys_social_api::services::identity::IdentityService;

struct Services {
    identity: IdentityService,
    content: ContentService,
    engagement: EngagementService,
    feed: FeedService,
}

async fn setup() -> Services {
    dotenv::dotenv().ok();
    Config::init().expect("configuration loads");
    let db = Arc::new(Database::new().await.expect("database connects"));
    Services {
        identity: IdentityService::new(db.clone()),
        content: ContentService::new(db.clone()),
        engagement: EngagementService::new(db.clone()),
        feed: FeedService::new(db),
    }
}

fn nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos()
}

async fn register(services: &Services, tag: &str, last_name: &str) -> i32 {
    services
        .identity
        .register_user(RegisterUserInput {
            email: format!("{}-{}@example.com", tag, nanos()),
            password: "correct-horse".to_string(),
            first_name: "Test".to_string(),
            last_name: last_name.to_string(),
            bio: String::new(),
        })
        .await
        .expect("registration succeeds")
        .id
}

async fn create_post(
    services: &Services,
    author_id: i32,
    content: &str,
    hashtags: &[String],
) -> i32 {
    services
        .content
        .create_post(
            author_id,
            CreatePostInput {
                content: content.to_string(),
                image: None,
                hashtags: hashtags.to_vec(),
            },
        )
        .await
        .expect("post creation succeeds")
        .post
        .id
}

#[test_log::test(tokio::test)]
#[ignore = "requires a PostgreSQL database"]
async fn feed_scope_and_like_toggle_scenario() {
    let services = setup().await;
    let author = register(&services, "author", "Arnold").await;
    let viewer = register(&services, "viewer", "Vickers").await;

    let post_id = create_post(&services, author, "hello", &[]).await;

    // Not following: the post is absent from the viewer's feed.
    let feed = services
        .feed
        .visible_posts(viewer, &FeedFilter::default(), 50, 0)
        .await
        .unwrap();
    assert!(feed.iter().all(|p| p.id != post_id));

    // Following: present, with a zero like count.
    assert_eq!(
        services.engagement.toggle_follow(viewer, author).await.unwrap(),
        ToggleOutcome::Added
    );
    let feed = services
        .feed
        .visible_posts(viewer, &FeedFilter::default(), 50, 0)
        .await
        .unwrap();
    let entry = feed
        .iter()
        .find(|p| p.id == post_id)
        .expect("post visible after following");
    assert_eq!(entry.likes_count, 0);

    // Toggling twice returns the like set to its original membership.
    assert_eq!(
        services.engagement.toggle_like(viewer, post_id).await.unwrap(),
        ToggleOutcome::Added
    );
    assert_eq!(services.engagement.likes_count(post_id).await.unwrap(), 1);
    assert_eq!(
        services.engagement.toggle_like(viewer, post_id).await.unwrap(),
        ToggleOutcome::Removed
    );
    assert_eq!(services.engagement.likes_count(post_id).await.unwrap(), 0);
}

#[test_log::test(tokio::test)]
#[ignore = "requires a PostgreSQL database"]
async fn follow_toggle_keeps_both_graph_directions_consistent() {
    let services = setup().await;
    let a = register(&services, "follower", "Able").await;
    let b = register(&services, "followed", "Baker").await;

    assert_eq!(
        services.engagement.toggle_follow(a, b).await.unwrap(),
        ToggleOutcome::Added
    );

    let followers_of_b = services.engagement.followers(b, 100, 0).await.unwrap();
    assert!(followers_of_b.iter().any(|u| u.id == a));
    let following_of_a = services.engagement.following(a, 100, 0).await.unwrap();
    assert!(following_of_a.iter().any(|u| u.id == b));

    // Derived counters agree with the listings.
    assert_eq!(services.identity.get_user(b).await.unwrap().followers_count, 1);
    assert_eq!(services.identity.get_user(a).await.unwrap().following_count, 1);

    assert_eq!(
        services.engagement.toggle_follow(a, b).await.unwrap(),
        ToggleOutcome::Removed
    );
    assert!(services.engagement.followers(b, 100, 0).await.unwrap().is_empty());
    assert!(services.engagement.following(a, 100, 0).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn self_follow_is_rejected() {
    let services = setup().await;
    let user = register(&services, "narcissus", "Pond").await;
    let err = services.engagement.toggle_follow(user, user).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(services.identity.get_user(user).await.unwrap().following_count, 0);
}

#[test_log::test(tokio::test)]
#[ignore = "requires a PostgreSQL database"]
async fn hashtag_get_or_create_is_idempotent() {
    let services = setup().await;
    let author = register(&services, "tagger", "Tate").await;

    // Same canonical name, once bare and once prefixed.
    let tag = format!("python-{}", nanos());
    let p1 = create_post(&services, author, "first", &[tag.clone()]).await;
    let p2 = create_post(&services, author, "second", &[format!("#{}", tag)]).await;

    let detail = services.content.hashtag_detail(&tag).await.unwrap();
    assert_eq!(detail.name, format!("#{}", tag));
    let ids: Vec<i32> = detail.posts.iter().map(|p| p.id).collect();
    assert_eq!(detail.posts.len(), 2);
    assert!(ids.contains(&p1) && ids.contains(&p2));

    // Re-attaching an attached hashtag is a no-op.
    let repeated = format!("news-{}", nanos());
    let p3 = create_post(
        &services,
        author,
        "read all about it",
        &[format!("#{}", repeated), repeated.clone()],
    )
    .await;
    let detail = services.content.hashtag_detail(&format!("#{}", repeated)).await.unwrap();
    assert_eq!(detail.posts.len(), 1);
    assert_eq!(detail.posts[0].id, p3);
    assert_eq!(detail.posts[0].hashtags, vec![format!("#{}", repeated)]);
}

#[test_log::test(tokio::test)]
#[ignore = "requires a PostgreSQL database"]
async fn feed_filters_narrow_the_scoped_set() {
    let services = setup().await;
    let author = register(&services, "writer", "Quillfeather").await;
    let viewer = register(&services, "reader", "Reid").await;
    services.engagement.toggle_follow(viewer, author).await.unwrap();

    let tag = format!("rustlang-{}", nanos());
    let tagged = create_post(&services, author, "tagged", &[tag.clone()]).await;
    let untagged = create_post(&services, author, "untagged", &[]).await;

    // Hashtag filter, case-insensitive substring.
    let filter = FeedFilter {
        hashtags: Some(tag.to_uppercase()),
        author_last_name: None,
    };
    let feed = services.feed.visible_posts(viewer, &filter, 50, 0).await.unwrap();
    assert!(feed.iter().any(|p| p.id == tagged));
    assert!(feed.iter().all(|p| p.id != untagged));

    // Author last-name filter keeps both posts of the followed author.
    let filter = FeedFilter {
        hashtags: None,
        author_last_name: Some("quillfeather".to_string()),
    };
    let feed = services.feed.visible_posts(viewer, &filter, 50, 0).await.unwrap();
    assert!(feed.iter().any(|p| p.id == tagged));
    assert!(feed.iter().any(|p| p.id == untagged));

    // Filters never widen: a non-matching filter returns nothing.
    let filter = FeedFilter {
        hashtags: None,
        author_last_name: Some(format!("nobody-{}", nanos())),
    };
    let feed = services.feed.visible_posts(viewer, &filter, 50, 0).await.unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn empty_comments_are_rejected_and_leave_counts_unchanged() {
    let services = setup().await;
    let author = register(&services, "poster", "Penn").await;
    let post_id = create_post(&services, author, "discuss", &[]).await;

    let err = services
        .content
        .add_comment(
            author,
            post_id,
            CommentInput {
                content: "   ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    let detail = services.content.get_post(author, post_id).await.unwrap();
    assert_eq!(detail.post.comments_count, 0);

    let comment = services
        .content
        .add_comment(
            author,
            post_id,
            CommentInput {
                content: "first!".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(comment.content, "first!");
    let detail = services.content.get_post(author, post_id).await.unwrap();
    assert_eq!(detail.post.comments_count, 1);
    assert_eq!(detail.comments.len(), 1);

    // Commenting on a missing post is a not-found outcome.
    let err = services
        .content
        .add_comment(
            author,
            -1,
            CommentInput {
                content: "ghost".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("post")));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn only_authors_may_mutate_their_content() {
    let services = setup().await;
    let author = register(&services, "owner", "Oakes").await;
    let intruder = register(&services, "intruder", "Iver").await;
    let post_id = create_post(&services, author, "mine", &[]).await;

    let err = services
        .content
        .update_post(
            intruder,
            post_id,
            UpdatePostInput {
                content: Some("stolen".to_string()),
                image: None,
                hashtags: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = services.content.delete_post(intruder, post_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // Commenting requires no ownership or follow relationship.
    let comment = services
        .content
        .add_comment(
            intruder,
            post_id,
            CommentInput {
                content: "drive-by".to_string(),
            },
        )
        .await
        .unwrap();
    let err = services
        .content
        .delete_comment(author, comment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn post_detail_and_likes_follow_feed_scope() {
    let services = setup().await;
    let author = register(&services, "scoped", "Shaw").await;
    let outsider = register(&services, "outsider", "Oswald").await;
    let post_id = create_post(&services, author, "inner circle", &[]).await;

    let err = services.content.get_post(outsider, post_id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound("post")));
    let err = services.engagement.toggle_like(outsider, post_id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound("post")));

    services.engagement.toggle_follow(outsider, author).await.unwrap();
    assert!(services.content.get_post(outsider, post_id).await.is_ok());
    assert_eq!(
        services.engagement.toggle_like(outsider, post_id).await.unwrap(),
        ToggleOutcome::Added
    );
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database"]
async fn post_updates_never_touch_created_at() {
    let services = setup().await;
    let author = register(&services, "editor", "Ellis").await;
    let post_id = create_post(&services, author, "draft", &[]).await;

    let before = services.content.get_post(author, post_id).await.unwrap();
    let after = services
        .content
        .update_post(
            author,
            post_id,
            UpdatePostInput {
                content: Some("final".to_string()),
                image: None,
                hashtags: Vec::new(),
            },
        )
        .await
        .unwrap();

    assert_eq!(after.post.content, "final");
    assert_eq!(after.post.created_at, before.post.created_at);
}
