use std::sync::Arc;
use std::time::Duration;

use snipurl_core::{NewUrl, OwnerId, SetUrlOutcome, ShortCode, StoreState};
use snipurl_storage::{PostgresConfig, PostgresStore, ReadUrlStore, StorageError, UrlStore};
use snipurl_test_infra::postgres::{self, PostgresServer};

struct Fixture {
    _postgres: PostgresServer,
    store: PostgresStore,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(postgres::PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let store = connect_with_retry(&url).await;

        store.migrate().await.expect("create schema");

        Self {
            _postgres: postgres,
            store,
        }
    }
}

async fn connect_with_retry(url: &str) -> PostgresStore {
    let config = PostgresConfig::builder()
        .dsn(url)
        .max_connections(8)
        .build();
    let mut last_error = None;

    for _ in 0..20 {
        match PostgresStore::connect(&config).await {
            Ok(store) => match store.ping().await {
                Ok(()) => return store,
                Err(err) => last_error = Some(err),
            },
            Err(err) => last_error = Some(err),
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn code(value: &str) -> ShortCode {
    ShortCode::new_unchecked(value)
}

fn owner(value: &str) -> OwnerId {
    OwnerId::new(value)
}

fn new_url(c: &str, url: &str) -> NewUrl {
    NewUrl {
        code: code(c),
        original_url: url.to_string(),
    }
}

#[tokio::test]
async fn set_and_get_url() {
    let fixture = Fixture::start().await;

    let outcome = fixture
        .store
        .set_url(&code("abc123"), "https://example.com", &owner("u1"))
        .await
        .unwrap();
    assert!(matches!(outcome, SetUrlOutcome::Created { .. }));

    let url = fixture.store.get_url(&code("abc123")).await.unwrap();
    assert_eq!(url, "https://example.com");

    let err = fixture.store.get_url(&code("missing")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn resubmitting_reports_conflict_or_id_busy() {
    let fixture = Fixture::start().await;
    let created = fixture
        .store
        .set_url(&code("abc123"), "https://example.com", &owner("u1"))
        .await
        .unwrap();

    let again = fixture
        .store
        .set_url(&code("abc123"), "https://example.com", &owner("u2"))
        .await
        .unwrap();
    assert_eq!(
        again,
        SetUrlOutcome::Conflict {
            sequence: created.sequence()
        }
    );

    let err = fixture
        .store
        .set_url(&code("abc123"), "https://other.example", &owner("u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::IdBusy(_)));

    // The losing owner does not take over the record.
    assert!(fixture.store.get_urls(&owner("u2")).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_set_creates_exactly_once() {
    let fixture = Fixture::start().await;
    let store = Arc::new(fixture.store.clone());
    let mut handles = vec![];

    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .set_url(&code("race"), "https://race.example", &owner(&format!("u{i}")))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if let SetUrlOutcome::Created { .. } = handle.await.unwrap().unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn bulk_insert_skips_taken_codes() {
    let fixture = Fixture::start().await;
    fixture
        .store
        .set_url(&code("busy"), "https://old.example", &owner("u1"))
        .await
        .unwrap();

    let inserted = fixture
        .store
        .set_urls(
            vec![
                new_url("one", "https://one.example"),
                new_url("busy", "https://new.example"),
                new_url("two", "https://two.example"),
            ],
            &owner("u1"),
        )
        .await
        .unwrap();

    let codes: Vec<&str> = inserted.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["one", "two"]);
    assert!(inserted.iter().all(|r| r.owner == owner("u1") && !r.deleted));

    assert!(fixture
        .store
        .set_urls(vec![], &owner("u1"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn delete_is_owner_scoped_and_soft() {
    let fixture = Fixture::start().await;
    fixture
        .store
        .set_urls(
            vec![
                new_url("a", "https://a.example"),
                new_url("b", "https://b.example"),
            ],
            &owner("u1"),
        )
        .await
        .unwrap();
    fixture
        .store
        .set_url(&code("c"), "https://c.example", &owner("u2"))
        .await
        .unwrap();

    fixture
        .store
        .delete_urls(&owner("u1"), &[code("a"), code("c")])
        .await
        .unwrap();

    assert!(matches!(
        fixture.store.get_url(&code("a")).await.unwrap_err(),
        StorageError::Deleted(_)
    ));
    assert_eq!(
        fixture.store.get_url(&code("c")).await.unwrap(),
        "https://c.example"
    );

    let listed = fixture.store.get_urls(&owner("u1")).await.unwrap();
    let codes: Vec<&str> = listed.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["b"]);

    // Deleted codes are never handed out again.
    assert!(matches!(
        fixture
            .store
            .set_url(&code("a"), "https://elsewhere.example", &owner("u1"))
            .await
            .unwrap_err(),
        StorageError::IdBusy(_)
    ));
}

#[tokio::test]
async fn state_ignores_anonymous_and_deleted() {
    let fixture = Fixture::start().await;
    fixture
        .store
        .set_url(&code("anon"), "https://anon.example", &OwnerId::anonymous())
        .await
        .unwrap();
    fixture
        .store
        .set_url(&code("a1"), "https://a1.example", &owner("alice"))
        .await
        .unwrap();
    fixture
        .store
        .set_url(&code("a2"), "https://a2.example", &owner("alice"))
        .await
        .unwrap();
    fixture
        .store
        .set_url(&code("b1"), "https://b1.example", &owner("bob"))
        .await
        .unwrap();
    fixture
        .store
        .delete_urls(&owner("alice"), &[code("a2")])
        .await
        .unwrap();

    assert_eq!(
        fixture.store.get_state().await.unwrap(),
        StoreState { urls: 2, owners: 2 }
    );
}

#[tokio::test]
async fn long_owner_ids_are_stored() {
    let fixture = Fixture::start().await;
    let long_owner = owner(&"u".repeat(256));

    fixture
        .store
        .set_url(&code("long"), "https://long.example", &long_owner)
        .await
        .unwrap();
    fixture
        .store
        .set_urls(vec![new_url("batch", "https://batch.example")], &long_owner)
        .await
        .unwrap();

    let listed = fixture.store.get_urls(&long_owner).await.unwrap();
    let codes: Vec<&str> = listed.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["long", "batch"]);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let fixture = Fixture::start().await;

    fixture.store.migrate().await.unwrap();
}
