use bmstore::util::testing::{init_test_env, setup_test_db};
use bmstore::{
    BookmarkDraft, BookmarkRepository, BookmarkStore, DomainError, DomainResult, StoreConfig,
    StoreConfigBuilder,
};
use rstest::*;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[fixture]
fn store() -> (TempDir, BookmarkStore) {
    setup_test_db()
}

fn raw_count(path: &Path, sql: &str) -> i64 {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn titles(bookmarks: &[bmstore::Bookmark]) -> Vec<&str> {
    bookmarks.iter().map(|b| b.title.as_str()).collect()
}

#[rstest]
fn given_new_bookmark_when_get_bookmarks_then_round_trip(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (_dir, repo) = store;
    let before = chrono::Utc::now();

    let id = repo.add_bookmark("T", "http://x.test", None, None, None)?;

    let all = repo.get_bookmarks()?;
    assert_eq!(all.len(), 1);
    let bm = &all[0];
    assert_eq!(bm.id, id);
    assert_eq!(bm.title, "T");
    assert_eq!(bm.url, "http://x.test");
    assert!(bm.description.is_none());
    assert!(bm.content_snippet.is_none());
    assert!(bm.source.is_none());
    assert!(bm.date_added >= before - chrono::Duration::seconds(1));
    assert!(bm.date_added <= chrono::Utc::now() + chrono::Duration::seconds(1));
    Ok(())
}

#[rstest]
fn given_all_fields_when_added_then_stored_verbatim(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (_dir, repo) = store;
    let draft = BookmarkDraft::new("Full", "https://full.test")
        .with_description("a description")
        .with_content_snippet("some captured text")
        .with_source("import.html");

    let id = repo.add(&draft)?;

    let bm = repo.get_bookmark(id)?.expect("bookmark should exist");
    assert_eq!(bm.description.as_deref(), Some("a description"));
    assert_eq!(bm.content_snippet.as_deref(), Some("some captured text"));
    assert_eq!(bm.source.as_deref(), Some("import.html"));
    Ok(())
}

#[rstest]
fn given_existing_url_when_add_then_duplicate_and_store_unchanged(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (_dir, repo) = store;
    repo.add_bookmark("First", "https://dup.test", Some("original"), None, None)?;
    repo.add_bookmark("Other", "https://other.test", None, None, None)?;
    let before = repo.get_bookmarks()?;

    let result = repo.add_bookmark("Second", "https://dup.test", None, None, None);

    assert!(matches!(result, Err(DomainError::DuplicateBookmark(url)) if url == "https://dup.test"));
    assert_eq!(repo.get_bookmarks()?, before);
    assert!(repo.search_bookmarks("second")?.is_empty());
    Ok(())
}

#[rstest]
fn given_missing_id_when_delete_then_false(store: (TempDir, BookmarkStore)) -> DomainResult<()> {
    let (_dir, repo) = store;
    assert!(!repo.delete_bookmark(42)?);

    let id = repo.add_bookmark("Gone soon", "https://gone.test", None, None, None)?;
    assert!(repo.delete_bookmark(id)?);
    assert!(repo.get_bookmarks()?.iter().all(|b| b.id != id));
    assert!(!repo.delete_bookmark(id)?);
    Ok(())
}

#[rstest]
fn given_insert_update_delete_when_searching_then_index_follows(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (dir, repo) = store;
    let id = repo.add_bookmark(
        "Zeppelin handbook",
        "https://zeppelin.test",
        Some("airships"),
        None,
        None,
    )?;
    assert_eq!(titles(&repo.search_bookmarks("zeppelin")?), ["Zeppelin handbook"]);

    repo.update_bookmark(
        id,
        &BookmarkDraft::new("Blimp handbook", "https://zeppelin.test"),
    )?;
    assert!(repo.search_bookmarks("zeppelin")?.is_empty());
    assert!(repo.search_bookmarks("airships")?.is_empty());
    assert_eq!(titles(&repo.search_bookmarks("blimp")?), ["Blimp handbook"]);

    repo.delete_bookmark(id)?;
    assert!(repo.search_bookmarks("blimp")?.is_empty());

    let db = dir.path().join("test.db");
    assert_eq!(raw_count(&db, "SELECT COUNT(*) FROM bookmarks_fts"), 0);
    Ok(())
}

#[rstest]
fn given_two_bookmarks_when_searching_then_scenario_holds(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (_dir, repo) = store;
    repo.add_bookmark("Rust Ownership Guide", "https://rust.test", None, None, None)?;
    repo.add_bookmark("Go Concurrency Patterns", "https://go.test", None, None, None)?;

    let concurrency = repo.search_bookmarks("concurrency")?;
    assert_eq!(titles(&concurrency), ["Go Concurrency Patterns"]);

    let either = repo.search_bookmarks("guide OR patterns")?;
    assert_eq!(either.len(), 2);
    let mut found = titles(&either);
    found.sort();
    assert_eq!(found, ["Go Concurrency Patterns", "Rust Ownership Guide"]);
    Ok(())
}

#[rstest]
fn given_stronger_match_when_searching_then_ranked_first(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (_dir, repo) = store;
    repo.add_bookmark(
        "Cooking notes",
        "https://cooking.test",
        Some("a long page about many kitchen topics, one of them pasta"),
        None,
        None,
    )?;
    repo.add_bookmark(
        "Pasta pasta pasta",
        "https://pasta.test",
        Some("pasta"),
        None,
        None,
    )?;

    let results = repo.search_bookmarks("pasta")?;
    assert_eq!(titles(&results), ["Pasta pasta pasta", "Cooking notes"]);
    Ok(())
}

#[rstest]
#[case("\"rust ownership\"", vec!["Rust Ownership Guide"])]
#[case("\"ownership rust\"", vec![])]
#[case("rust guide", vec!["Rust Ownership Guide"])]
#[case("rust AND patterns", vec![])]
#[case("borrow*", vec!["Borrowing explained"])]
#[case("snippet", vec!["Borrowing explained"])]
fn given_query_grammar_when_searching_then_expected_matches(
    store: (TempDir, BookmarkStore),
    #[case] query: &str,
    #[case] expected: Vec<&str>,
) -> DomainResult<()> {
    let (_dir, repo) = store;
    repo.add_bookmark("Rust Ownership Guide", "https://rust.test", None, None, None)?;
    repo.add_bookmark("Go Concurrency Patterns", "https://go.test", None, None, None)?;
    repo.add_bookmark(
        "Borrowing explained",
        "https://borrow.test",
        None,
        Some("the snippet field is searchable"),
        None,
    )?;

    assert_eq!(titles(&repo.search_bookmarks(query)?), expected);
    Ok(())
}

#[rstest]
#[case("\"unterminated")]
#[case("foo:bar")]
#[case("AND")]
#[case("   ")]
fn given_malformed_query_when_searching_then_invalid_query(
    store: (TempDir, BookmarkStore),
    #[case] query: &str,
) {
    let (_dir, repo) = store;
    repo.add_bookmark("Anything", "https://any.test", None, None, None)
        .unwrap();

    let result = repo.search_bookmarks(query);

    assert!(
        matches!(result, Err(DomainError::InvalidQuery(_))),
        "query {:?} gave {:?}",
        query,
        result
    );
}

#[rstest]
fn given_tagged_bookmark_when_deleted_then_associations_cascade(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (dir, repo) = store;
    let id = repo.add_bookmark("Tagged", "https://tagged.test", None, None, None)?;
    let keep = repo.add_bookmark("Kept", "https://kept.test", None, None, None)?;
    let rust = repo.add_tag("rust", Some("language"), false)?;
    let web = repo.add_tag("web", None, true)?;
    assert!(repo.tag_bookmark(id, rust.id, None)?);
    assert!(repo.tag_bookmark(id, web.id, Some(0.7))?);
    assert!(repo.tag_bookmark(keep, rust.id, None)?);

    assert!(repo.delete_bookmark(id)?);

    let db = dir.path().join("test.db");
    assert_eq!(
        raw_count(
            &db,
            "SELECT COUNT(*) FROM bookmark_tags WHERE bookmark_id NOT IN (SELECT id FROM bookmarks)"
        ),
        0
    );
    assert_eq!(raw_count(&db, "SELECT COUNT(*) FROM bookmark_tags"), 1);

    // tags outlive their last bookmark
    let tags = repo.get_tags()?;
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().any(|(t, n)| t.name == "web" && *n == 0));
    Ok(())
}

#[rstest]
fn given_existing_store_when_opened_again_then_contents_preserved() -> DomainResult<()> {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookmarks.db");

    {
        let repo = BookmarkStore::open(&path)?;
        repo.add_bookmark("Persisted", "https://persisted.test", None, None, None)?;
    }

    let first = BookmarkStore::open(&path)?;
    let second = BookmarkStore::open(&path)?;
    assert_eq!(first.count()?, 1);
    assert_eq!(titles(&second.search_bookmarks("persisted")?), ["Persisted"]);
    assert_eq!(second.path(), path.as_path());

    // no pending migrations on reopen, so no backup copies
    let entries = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains("_backup_"))
        .count();
    assert_eq!(entries, 0);
    Ok(())
}

#[rstest]
fn given_index_rows_removed_behind_our_back_when_reopened_then_reconciled() -> DomainResult<()> {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drift.db");
    {
        let repo = BookmarkStore::open(&path)?;
        repo.add_bookmark("Lighthouse keeping", "https://light.test", None, None, None)?;
    }

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("DELETE FROM bookmarks_fts", []).unwrap();
    conn.execute(
        "INSERT INTO bookmarks_fts(rowid, title) VALUES (999, 'ghost')",
        [],
    )
    .unwrap();
    drop(conn);

    let repo = BookmarkStore::open(&path)?;
    assert_eq!(titles(&repo.search_bookmarks("lighthouse")?), ["Lighthouse keeping"]);
    assert!(repo.search_bookmarks("ghost")?.is_empty());
    Ok(())
}

#[rstest]
fn given_missing_directory_when_open_then_storage_unavailable() {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no/such/dir/bookmarks.db");

    let result = BookmarkStore::open(&path);

    assert!(matches!(result, Err(DomainError::StorageUnavailable(_))));
    assert!(!path.exists());
}

#[rstest]
fn given_create_if_missing_false_when_file_absent_then_storage_unavailable() {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let config = StoreConfigBuilder::default()
        .path(path.clone())
        .create_if_missing(false)
        .build()
        .unwrap();

    let result = BookmarkStore::open_with(config);

    assert!(matches!(result, Err(DomainError::StorageUnavailable(_))));
    assert!(!path.exists());
}

#[rstest]
fn given_corrupt_file_when_open_then_storage_unavailable() {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.db");
    fs::write(&path, vec![b'x'; 4096]).unwrap();

    let result = BookmarkStore::open(&path);

    assert!(matches!(result, Err(DomainError::StorageUnavailable(_))));
}

#[rstest]
fn given_in_memory_path_when_open_then_storage_unavailable() {
    init_test_env();
    let result = BookmarkStore::open(":memory:");
    assert!(matches!(result, Err(DomainError::StorageUnavailable(_))));
}

#[rstest]
fn given_foreign_write_lock_when_adding_then_storage_busy() -> DomainResult<()> {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("busy.db");
    let config = StoreConfigBuilder::default()
        .path(path.clone())
        .busy_timeout(Duration::from_millis(200))
        .build()?;
    let repo = BookmarkStore::open_with(config)?;
    repo.add_bookmark("Before lock", "https://before.test", None, None, None)?;

    let blocker = rusqlite::Connection::open(&path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

    let result = repo.add_bookmark("During lock", "https://during.test", None, None, None);
    assert!(matches!(&result, Err(e @ DomainError::StorageBusy(_)) if e.is_retryable()));

    // readers are not blocked by a pending writer
    assert_eq!(repo.count()?, 1);

    blocker.execute_batch("ROLLBACK").unwrap();
    repo.add_bookmark("During lock", "https://during.test", None, None, None)?;
    assert_eq!(repo.count()?, 2);
    Ok(())
}

#[rstest]
fn given_many_threads_when_adding_then_every_write_lands(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (_dir, repo) = store;

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let repo = repo.clone();
            thread::spawn(move || -> DomainResult<()> {
                for i in 0..10 {
                    repo.add_bookmark(
                        &format!("Thread {} item {}", t, i),
                        &format!("https://t{}.test/{}", t, i),
                        None,
                        None,
                        None,
                    )?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked")?;
    }

    assert_eq!(repo.count()?, 40);
    assert_eq!(repo.search_bookmarks("thread")?.len(), 40);
    Ok(())
}

#[rstest]
fn given_foreign_write_lock_when_opening_unmigrated_file_then_storage_busy() -> DomainResult<()> {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let blocker = rusqlite::Connection::open(&path).unwrap();
    blocker
        .execute_batch(
            "CREATE TABLE bookmarks (id INTEGER PRIMARY KEY, url TEXT UNIQUE NOT NULL,
                 title TEXT NOT NULL, description TEXT, date_added TIMESTAMP NOT NULL,
                 content_snippet TEXT, source TEXT);
             BEGIN IMMEDIATE;",
        )
        .unwrap();
    let config = StoreConfigBuilder::default()
        .path(path.clone())
        .busy_timeout(Duration::from_millis(200))
        .build()?;

    let result = BookmarkStore::open_with(config.clone());
    assert!(
        matches!(&result, Err(e @ DomainError::StorageBusy(_)) if e.is_retryable()),
        "got {:?}",
        result
    );

    blocker.execute_batch("ROLLBACK").unwrap();
    let repo = BookmarkStore::open_with(config)?;
    assert_eq!(repo.count()?, 0);
    Ok(())
}

#[rstest]
fn given_fresh_path_when_opened_concurrently_then_every_open_succeeds() -> DomainResult<()> {
    init_test_env();
    const THREADS: usize = 4;

    for round in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("race_{}.db", round));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || -> DomainResult<usize> {
                    barrier.wait();
                    BookmarkStore::open(&path)?.count()
                })
            })
            .collect();

        for handle in handles {
            let opened = handle.join().expect("opener thread panicked");
            assert!(matches!(opened, Ok(0)), "round {}: {:?}", round, opened);
        }

        let repo = BookmarkStore::open(&path)?;
        repo.add_bookmark("After race", "https://race.test", None, None, None)?;
        assert_eq!(titles(&repo.search_bookmarks("race")?), ["After race"]);
    }
    Ok(())
}

#[rstest]
fn given_index_table_dropped_when_searching_then_storage_error(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (dir, repo) = store;
    repo.add_bookmark("Anything", "https://any.test", None, None, None)?;

    let conn = rusqlite::Connection::open(dir.path().join("test.db")).unwrap();
    conn.execute_batch("DROP TABLE bookmarks_fts").unwrap();
    drop(conn);

    let result = repo.search_bookmarks("x");
    assert!(matches!(result, Err(DomainError::Storage(_))), "got {:?}", result);
    Ok(())
}

#[rstest]
fn given_bookmarks_table_dropped_when_reading_then_storage_error(
    store: (TempDir, BookmarkStore),
) -> DomainResult<()> {
    let (dir, repo) = store;
    repo.add_bookmark("Anything", "https://any.test", None, None, None)?;

    let conn = rusqlite::Connection::open(dir.path().join("test.db")).unwrap();
    conn.execute_batch("DROP TABLE bookmarks").unwrap();
    drop(conn);

    let listed = repo.get_bookmarks();
    assert!(matches!(listed, Err(DomainError::Storage(_))), "got {:?}", listed);
    assert!(matches!(repo.count(), Err(DomainError::Storage(_))));
    assert!(matches!(repo.get_bookmark(1), Err(DomainError::Storage(_))));
    Ok(())
}

/// Schema written by the earlier Python tool: no AUTOINCREMENT, an
/// external-content index, and rows that never made it into the index.
const LEGACY_SCHEMA: &str = "
    CREATE TABLE bookmarks (
        id INTEGER PRIMARY KEY,
        url TEXT UNIQUE NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        date_added TIMESTAMP NOT NULL,
        content_snippet TEXT,
        source TEXT
    );
    CREATE TABLE tags (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        category TEXT,
        auto_generated BOOLEAN
    );
    CREATE TABLE bookmark_tags (
        bookmark_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        confidence FLOAT,
        PRIMARY KEY (bookmark_id, tag_id),
        FOREIGN KEY (bookmark_id) REFERENCES bookmarks(id) ON DELETE CASCADE,
        FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
    );
    INSERT INTO bookmarks (title, url, description, date_added)
    VALUES ('Legacy sailing log', 'https://sail.test', 'knots and tides', '2024-01-15 10:30:00.123456');
    INSERT INTO tags (name, category, auto_generated) VALUES ('sailing', NULL, 0);
    INSERT INTO bookmark_tags (bookmark_id, tag_id, confidence) VALUES (1, 1, 0.9);
    CREATE VIRTUAL TABLE bookmark_fts USING fts5(
        title, description, content_snippet, content=bookmarks
    );
    CREATE TRIGGER bookmarks_ai AFTER INSERT ON bookmarks BEGIN
        INSERT INTO bookmark_fts(rowid, title, description, content_snippet)
        VALUES (new.id, new.title, new.description, new.content_snippet);
    END;
    CREATE TRIGGER bookmarks_ad AFTER DELETE ON bookmarks BEGIN
        DELETE FROM bookmark_fts WHERE rowid = old.id;
    END;
";

#[rstest]
fn given_legacy_store_when_opened_then_adopted_indexed_and_backed_up() -> DomainResult<()> {
    init_test_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(LEGACY_SCHEMA).unwrap();
    }

    let repo = BookmarkStore::open(&path)?;

    let found = repo.search_bookmarks("tides")?;
    assert_eq!(titles(&found), ["Legacy sailing log"]);
    assert_eq!(
        found[0].date_added.format("%Y-%m-%d %H:%M:%S").to_string(),
        "2024-01-15 10:30:00"
    );

    let tags = repo.get_bookmark_tags(1)?;
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tag.name, "sailing");
    assert_eq!(tags[0].confidence, Some(0.9));

    // new writes go through the new index only
    repo.add_bookmark("Modern entry", "https://modern.test", None, None, None)?;
    assert_eq!(titles(&repo.search_bookmarks("modern")?), ["Modern entry"]);
    assert_eq!(
        raw_count(
            &path,
            "SELECT COUNT(*) FROM sqlite_master WHERE name IN ('bookmark_fts', 'bookmarks_ai', 'bookmarks_ad')"
        ),
        0
    );

    let backups: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("legacy_backup_") && name.ends_with(".db"))
        .collect();
    assert_eq!(backups.len(), 1, "backups: {:?}", backups);
    Ok(())
}

#[rstest]
fn given_default_config_when_built_then_matches_new() {
    let built = StoreConfigBuilder::default()
        .path("/tmp/some.db")
        .build()
        .unwrap();
    let plain = StoreConfig::new("/tmp/some.db");
    assert_eq!(built.path, plain.path);
    assert_eq!(built.busy_timeout, plain.busy_timeout);
    assert_eq!(built.pool_size, plain.pool_size);
    assert!(built.create_if_missing);
}
