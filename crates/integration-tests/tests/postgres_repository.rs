//! `PgPostRepository` against a real Postgres started with testcontainers.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{CallerId, PostDraft, PostRepository};
use storage_adapters::PgPostRepository;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Keeps the container alive for as long as the repository is in use.
struct Database {
    _container: ContainerAsync<Postgres>,
    repo: Arc<PgPostRepository>,
}

async fn database() -> Database {
    let container = Postgres::default()
        .with_tag("16-alpine")
        .start()
        .await
        .expect("failed to start Postgres container");
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgresql://postgres:postgres@{host}:{port}/postgres");

    let repo = PgPostRepository::connect(&url, 16).await.unwrap();
    Database {
        _container: container,
        repo: Arc::new(repo),
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

fn draft(username: &str, ts: DateTime<Utc>) -> PostDraft {
    PostDraft::new(username, "caption", "https://images.vistagram.test/p.jpg", ts).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_distinct_callers_are_all_counted() {
    let db = database().await;
    let id = db.repo.insert(draft("busy_post", at(0))).await.unwrap().id;

    let tasks: Vec<_> = (0..50)
        .map(|i| {
            let repo = Arc::clone(&db.repo);
            tokio::spawn(async move {
                let caller = CallerId::new(format!("10.0.0.{i}"));
                let outcome = repo.apply_like_toggle(id, &caller, at(i)).await.unwrap().unwrap();
                assert!(outcome.liked);
                repo.apply_share_increment(id, at(i)).await.unwrap().unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let stored = db.repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.likes_count, 50);
    assert_eq!(stored.liked_by.len(), 50);
    assert_eq!(stored.share_count, 50);
    assert_eq!(stored.updated_at, at(49));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn same_caller_race_keeps_count_and_likers_in_step() {
    let db = database().await;
    let id = db.repo.insert(draft("racy_post", at(0))).await.unwrap().id;

    let tasks: Vec<_> = (0..25)
        .map(|i| {
            let repo = Arc::clone(&db.repo);
            tokio::spawn(async move {
                repo.apply_like_toggle(id, &CallerId::from("1.2.3.4"), at(i)).await.unwrap().unwrap()
            })
        })
        .collect();
    let mut liked_results = 0;
    for task in tasks {
        if task.await.unwrap().liked {
            liked_results += 1;
        }
    }

    let stored = db.repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.likes_count as usize, stored.liked_by.len());
    // 25 toggles by one caller: the odd count ends liked.
    assert_eq!(stored.likes_count, 1);
    assert_eq!(liked_results, 13);
}

#[tokio::test]
async fn equal_timestamps_page_in_insertion_order() {
    let db = database().await;
    let old = db.repo.insert(draft("old_one", at(0))).await.unwrap();
    let tie_a = db.repo.insert(draft("tie_a", at(50))).await.unwrap();
    let newest = db.repo.insert(draft("newest", at(100))).await.unwrap();
    let tie_b = db.repo.insert(draft("tie_b", at(50))).await.unwrap();
    let tie_c = db.repo.insert(draft("tie_c", at(50))).await.unwrap();

    let expected = vec![newest.id, tie_a.id, tie_b.id, tie_c.id, old.id];
    let all: Vec<Uuid> = db.repo.find_page(10, 0).await.unwrap().iter().map(|p| p.id).collect();
    assert_eq!(all, expected);

    let mut walked = Vec::new();
    for offset in (0..5).step_by(2) {
        walked.extend(db.repo.find_page(2, offset).await.unwrap().iter().map(|p| p.id));
    }
    assert_eq!(walked, expected);
    assert!(db.repo.find_page(2, 6).await.unwrap().is_empty());
    assert_eq!(db.repo.count().await.unwrap(), 5);
}

#[tokio::test]
async fn missing_post_updates_nothing() {
    let db = database().await;
    let missing = Uuid::now_v7();
    assert!(db
        .repo
        .apply_like_toggle(missing, &CallerId::from("1.2.3.4"), at(1))
        .await
        .unwrap()
        .is_none());
    assert!(db.repo.apply_share_increment(missing, at(1)).await.unwrap().is_none());
    assert!(db.repo.find_by_id(missing).await.unwrap().is_none());
}
