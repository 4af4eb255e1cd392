use growbuddy::models::{LikeSubject, NotificationKind};
use growbuddy::store::{ProfileUpdate, SocialStore};
use tempfile::TempDir;

// A pooled ":memory:" database would give every connection its own empty
// store, so tests run against a real file in a temp directory.
async fn test_store() -> (TempDir, SocialStore) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
    let store = SocialStore::new(&url, 64).await.unwrap();
    store.init().await.unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_create_user_then_fetch() {
    let (_dir, store) = test_store().await;

    let created = store.create_user("ana", "ana@example.com", "hash-a").await.unwrap();
    let fetched = store.get_user(created.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.username, "ana");
    assert_eq!(fetched.email, "ana@example.com");
    assert_eq!(fetched.password_hash, "hash-a");

    let by_name = store.get_user_by_username("ana").await.unwrap().unwrap();
    assert_eq!(by_name.id, created.id);
    let by_email = store.get_user_by_email("ana@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let (_dir, store) = test_store().await;

    store.create_user("ana", "ana@example.com", "h").await.unwrap();
    assert!(store.create_user("ana", "other@example.com", "h").await.is_err());
    assert!(store.create_user("other", "ana@example.com", "h").await.is_err());

    // A unique-index collision surfaces as 409, not a masked 500
    let err = store.create_user("ana", "third@example.com", "h").await.unwrap_err();
    assert!(matches!(
        growbuddy::AppError::from(err),
        growbuddy::AppError::Conflict(_)
    ));
}

#[tokio::test]
async fn test_profile_update_merges_fields() {
    let (_dir, store) = test_store().await;
    let user = store.create_user("ana", "ana@example.com", "h").await.unwrap();

    store
        .update_profile(
            user.id,
            &ProfileUpdate {
                bio: Some("gardener".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    let updated = store
        .update_profile(
            user.id,
            &ProfileUpdate {
                location: Some("Lisbon".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    // The second update must not clobber the first
    assert_eq!(updated.bio.as_deref(), Some("gardener"));
    assert_eq!(updated.location.as_deref(), Some("Lisbon"));

    assert!(store
        .update_profile(999, &ProfileUpdate::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_user_search_is_prefix_match() {
    let (_dir, store) = test_store().await;
    store.create_user("ana", "a@example.com", "h").await.unwrap();
    store.create_user("anatole", "b@example.com", "h").await.unwrap();
    store.create_user("bo", "c@example.com", "h").await.unwrap();

    let hits = store.search_users("ana", 10).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|u| u.username.starts_with("ana")));
}

#[tokio::test]
async fn test_user_search_treats_wildcards_literally() {
    let (_dir, store) = test_store().await;
    store.create_user("ana_b", "a@example.com", "h").await.unwrap();
    store.create_user("anaxb", "b@example.com", "h").await.unwrap();
    store.create_user("carl", "c@example.com", "h").await.unwrap();

    // "_" in the query must match only a literal underscore
    let hits = store.search_users("ana_", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username, "ana_b");

    // "%" must not act as a match-everything wildcard
    assert!(store.search_users("%", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_post_then_fetch() {
    let (_dir, store) = test_store().await;
    let user = store.create_user("ana", "a@example.com", "h").await.unwrap();

    let media = vec!["/uploads/one.jpg".to_string(), "/uploads/two.jpg".to_string()];
    let post = store.create_post(user.id, "first sprout", &media).await.unwrap();
    let fetched = store.get_post(post.id).await.unwrap().unwrap();

    assert_eq!(fetched.caption, "first sprout");
    assert_eq!(fetched.media_urls, media);
    assert_eq!(fetched.author_id, user.id);
}

#[tokio::test]
async fn test_feed_contains_own_and_followed_posts() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();
    let c = store.create_user("c", "c@example.com", "h").await.unwrap();

    let pa = store.create_post(a.id, "mine", &[]).await.unwrap();
    let pb = store.create_post(b.id, "followed", &[]).await.unwrap();
    let pc = store.create_post(c.id, "stranger", &[]).await.unwrap();

    assert!(store.toggle_follow(a.id, b.id).await.unwrap());

    let feed = store.feed(a.id, 20, 0).await.unwrap();
    let ids: Vec<i64> = feed.iter().map(|p| p.id).collect();

    assert!(ids.contains(&pa.id));
    assert!(ids.contains(&pb.id));
    assert!(!ids.contains(&pc.id));

    // Newest first
    let mut sorted = ids.clone();
    sorted.sort_by(|x, y| y.cmp(x));
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn test_follow_toggle_is_idempotent() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    assert!(store.toggle_follow(a.id, b.id).await.unwrap());
    assert!(store.is_following(a.id, b.id).await.unwrap());
    assert_eq!(store.follower_count(b.id).await.unwrap(), 1);
    assert_eq!(store.following_count(a.id).await.unwrap(), 1);

    // Second toggle restores the original state
    assert!(!store.toggle_follow(a.id, b.id).await.unwrap());
    assert!(!store.is_following(a.id, b.id).await.unwrap());
    assert_eq!(store.follower_count(b.id).await.unwrap(), 0);
    assert_eq!(store.following_count(a.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_like_and_save_toggles() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();
    let post = store.create_post(b.id, "likeable", &[]).await.unwrap();

    assert!(store.toggle_like(a.id, LikeSubject::Post, post.id).await.unwrap());
    assert_eq!(store.like_count(LikeSubject::Post, post.id).await.unwrap(), 1);
    assert!(store.has_liked(a.id, LikeSubject::Post, post.id).await.unwrap());

    assert!(!store.toggle_like(a.id, LikeSubject::Post, post.id).await.unwrap());
    assert_eq!(store.like_count(LikeSubject::Post, post.id).await.unwrap(), 0);

    assert!(store.toggle_save(a.id, post.id).await.unwrap());
    assert_eq!(store.saved_posts(a.id).await.unwrap().len(), 1);
    assert!(!store.toggle_save(a.id, post.id).await.unwrap());
    assert!(store.saved_posts(a.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_post_cascades() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    let post = store.create_post(a.id, "doomed", &[]).await.unwrap();
    let comment = store.create_comment(post.id, b.id, "nice").await.unwrap();
    store.toggle_like(b.id, LikeSubject::Post, post.id).await.unwrap();
    store.toggle_like(a.id, LikeSubject::Comment, comment.id).await.unwrap();
    store.toggle_save(b.id, post.id).await.unwrap();

    assert!(store.delete_post(post.id).await.unwrap());

    assert!(store.get_post(post.id).await.unwrap().is_none());
    assert!(store.comments_for_post(post.id).await.unwrap().is_empty());
    assert_eq!(store.like_count(LikeSubject::Post, post.id).await.unwrap(), 0);
    assert_eq!(store.like_count(LikeSubject::Comment, comment.id).await.unwrap(), 0);
    assert!(store.saved_posts(b.id).await.unwrap().is_empty());

    // Deleting again reports missing
    assert!(!store.delete_post(post.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    let post = store.create_post(a.id, "mine", &[]).await.unwrap();
    store.toggle_follow(b.id, a.id).await.unwrap();
    store.toggle_follow(a.id, b.id).await.unwrap();
    store.create_message(a.id, b.id, "hi").await.unwrap();
    store
        .create_notification(b.id, a.id, NotificationKind::Follow, None)
        .await
        .unwrap();

    assert!(store.delete_user(a.id).await.unwrap());

    assert!(store.get_user(a.id).await.unwrap().is_none());
    assert!(store.get_post(post.id).await.unwrap().is_none());
    assert_eq!(store.follower_count(b.id).await.unwrap(), 0);
    assert_eq!(store.following_count(b.id).await.unwrap(), 0);
    assert!(store.conversations(b.id).await.unwrap().is_empty());
    assert!(store.notifications_for(b.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_user_removes_likes_on_their_comments() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    // B comments under their own post and under A's post; A likes both
    let b_post = store.create_post(b.id, "b's post", &[]).await.unwrap();
    let on_own = store.create_comment(b_post.id, b.id, "self reply").await.unwrap();
    let a_post = store.create_post(a.id, "a's post", &[]).await.unwrap();
    let on_a = store.create_comment(a_post.id, b.id, "drive-by").await.unwrap();

    store.toggle_like(a.id, LikeSubject::Comment, on_own.id).await.unwrap();
    store.toggle_like(a.id, LikeSubject::Comment, on_a.id).await.unwrap();

    assert!(store.delete_user(b.id).await.unwrap());

    // No like row may outlive the comment it points at
    assert_eq!(store.like_count(LikeSubject::Comment, on_own.id).await.unwrap(), 0);
    assert_eq!(store.like_count(LikeSubject::Comment, on_a.id).await.unwrap(), 0);
    assert!(store.get_comment(on_a.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_comments_ordered_oldest_first() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let post = store.create_post(a.id, "p", &[]).await.unwrap();

    let first = store.create_comment(post.id, a.id, "first").await.unwrap();
    let second = store.create_comment(post.id, a.id, "second").await.unwrap();

    let comments = store.comments_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, first.id);
    assert_eq!(comments[1].id, second.id);

    assert!(store.delete_comment(first.id).await.unwrap());
    assert!(store.get_comment(first.id).await.unwrap().is_none());
    assert!(!store.delete_comment(first.id).await.unwrap());
}

#[tokio::test]
async fn test_message_conversation_flow() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();
    let c = store.create_user("c", "c@example.com", "h").await.unwrap();

    store.create_message(a.id, b.id, "hi b").await.unwrap();
    store.create_message(b.id, a.id, "hi a").await.unwrap();
    store.create_message(c.id, a.id, "hello from c").await.unwrap();

    let convo = store.conversation(a.id, b.id).await.unwrap();
    assert_eq!(convo.len(), 2);
    assert_eq!(convo[0].text, "hi b");
    assert_eq!(convo[1].text, "hi a");

    let convos = store.conversations(a.id).await.unwrap();
    assert_eq!(convos.len(), 2);

    let (_, _, unread_from_b) = convos
        .iter()
        .find(|(partner, _, _)| *partner == b.id)
        .cloned()
        .unwrap();
    assert_eq!(unread_from_b, 1);

    assert_eq!(store.mark_conversation_read(a.id, b.id).await.unwrap(), 1);
    let convos = store.conversations(a.id).await.unwrap();
    let (_, _, unread_from_b) = convos
        .iter()
        .find(|(partner, _, _)| *partner == b.id)
        .cloned()
        .unwrap();
    assert_eq!(unread_from_b, 0);
}

#[tokio::test]
async fn test_notifications_never_target_self() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    assert!(store
        .create_notification(a.id, a.id, NotificationKind::Like, None)
        .await
        .unwrap()
        .is_none());

    store
        .create_notification(a.id, b.id, NotificationKind::Follow, None)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.unread_notification_count(a.id).await.unwrap(), 1);
    let notifications = store.notifications_for(a.id, 10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Follow);

    assert!(store
        .mark_notification_read(a.id, notifications[0].id)
        .await
        .unwrap());
    assert_eq!(store.unread_notification_count(a.id).await.unwrap(), 0);

    // Marking someone else's notification fails
    assert!(!store
        .mark_notification_read(b.id, notifications[0].id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_mark_all_notifications_read() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    for _ in 0..3 {
        store
            .create_notification(a.id, b.id, NotificationKind::Message, None)
            .await
            .unwrap();
    }

    assert_eq!(store.unread_notification_count(a.id).await.unwrap(), 3);
    assert_eq!(store.mark_all_notifications_read(a.id).await.unwrap(), 3);
    assert_eq!(store.unread_notification_count(a.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_push_subscription_upsert_and_delete() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();

    store
        .upsert_push_subscription(a.id, "https://push/ep1", "key1", "auth1")
        .await
        .unwrap();

    // Re-registering the same endpoint refreshes instead of duplicating
    let refreshed = store
        .upsert_push_subscription(a.id, "https://push/ep1", "key2", "auth2")
        .await
        .unwrap();
    assert_eq!(refreshed.p256dh, "key2");

    let subs = store.push_subscriptions_for(a.id).await.unwrap();
    assert_eq!(subs.len(), 1);

    assert!(store
        .delete_push_subscription(a.id, "https://push/ep1")
        .await
        .unwrap());
    assert!(store.push_subscriptions_for(a.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_contact_request_stored() {
    let (_dir, store) = test_store().await;

    let request = store
        .create_contact_request("Ana", "ana@example.com", "love the app")
        .await
        .unwrap();
    assert!(request.id > 0);
}

#[tokio::test]
async fn test_hydrated_post_carries_viewer_flags() {
    let (_dir, store) = test_store().await;
    let a = store.create_user("a", "a@example.com", "h").await.unwrap();
    let b = store.create_user("b", "b@example.com", "h").await.unwrap();

    let post = store.create_post(b.id, "hydrate me", &[]).await.unwrap();
    store.toggle_like(a.id, LikeSubject::Post, post.id).await.unwrap();
    store.toggle_save(a.id, post.id).await.unwrap();
    store.create_comment(post.id, a.id, "hello").await.unwrap();

    let views = store.hydrate_posts(a.id, vec![post.clone()]).await.unwrap();
    let view = &views[0];
    assert_eq!(view.author.id, b.id);
    assert_eq!(view.like_count, 1);
    assert_eq!(view.comment_count, 1);
    assert!(view.liked);
    assert!(view.saved);

    // A different viewer sees the counts but not the flags
    let views = store.hydrate_posts(b.id, vec![post]).await.unwrap();
    assert!(!views[0].liked);
    assert!(!views[0].saved);
}
