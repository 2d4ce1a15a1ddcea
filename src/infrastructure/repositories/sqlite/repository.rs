// src/infrastructure/repositories/sqlite/repository.rs

use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::upsert::excluded;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use super::connection::{init_pool, ConnectionPool, PooledConnection};
use super::error::{
    is_query_syntax_error, is_unique_violation, SqliteRepositoryError, SqliteResult,
};
use super::model::{
    DbBookmark, DbBookmarkChanges, DbTag, NewBookmark, NewBookmarkTag, NewTag, TagsFrequency,
};
use super::schema::{bookmark_tags, bookmarks, tags};
use crate::config::StoreConfig;
use crate::domain::bookmark::{Bookmark, BookmarkDraft};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::repositories::repository::BookmarkRepository;
use crate::domain::tag::{BookmarkTag, Tag};

/// Ranked by FTS5 bm25, ties broken by insertion order
const SEARCH_SQL: &str = "
    SELECT b.id, b.url, b.title, b.description, b.date_added, b.content_snippet, b.source
    FROM bookmarks_fts
    JOIN bookmarks b ON b.id = bookmarks_fts.rowid
    WHERE bookmarks_fts MATCH ?
    ORDER BY rank, b.id
";

const TAG_FREQUENCY_SQL: &str = "
    SELECT t.id, t.name, t.category, t.auto_generated, COUNT(bt.bookmark_id) AS n
    FROM tags t
    LEFT JOIN bookmark_tags bt ON bt.tag_id = t.id
    GROUP BY t.id, t.name, t.category, t.auto_generated
    ORDER BY n DESC, t.name ASC
";

#[derive(Clone, Debug)]
pub struct SqliteBookmarkRepository {
    pool: ConnectionPool,
    path: PathBuf,
}

impl SqliteBookmarkRepository {
    /// Open or create the store at `path` with default settings
    pub fn open<P: Into<PathBuf>>(path: P) -> DomainResult<Self> {
        Self::open_with(StoreConfig::new(path))
    }

    /// Open or create the store described by `config`.
    ///
    /// Safe to call repeatedly on the same file: pending migrations are
    /// applied once, existing rows are kept and the search index is
    /// reconciled with the bookmarks table.
    #[instrument(level = "debug")]
    pub fn open_with(config: StoreConfig) -> DomainResult<Self> {
        let pool = init_pool(&config)?;
        info!("Opened bookmark store at {}", config.path.display());
        Ok(Self {
            pool,
            path: config.path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a connection from the pool
    #[instrument(skip_all, level = "trace")]
    pub fn get_connection(&self) -> SqliteResult<PooledConnection> {
        self.pool
            .get()
            .map_err(|e| SqliteRepositoryError::ConnectionPoolError(e.to_string()))
    }

    fn duplicate_or(err: diesel::result::Error, url: &str) -> SqliteRepositoryError {
        if is_unique_violation(&err) {
            SqliteRepositoryError::DuplicateUrl(url.to_string())
        } else {
            SqliteRepositoryError::DatabaseError(err)
        }
    }
}

impl BookmarkRepository for SqliteBookmarkRepository {
    #[instrument(skip(self), level = "debug")]
    fn add_tagged(&self, draft: &BookmarkDraft, tag_names: &[String]) -> DomainResult<i32> {
        let draft = draft.validated()?;
        let names = tag_names
            .iter()
            .map(Tag::normalize_name)
            .collect::<DomainResult<Vec<_>>>()?;
        let mut conn = self.get_connection()?;

        let db_bookmark = NewBookmark::from_draft(&draft, Utc::now().naive_utc());
        debug!("Inserting bookmark: {}", db_bookmark);

        let id = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            let id = diesel::insert_into(bookmarks::table)
                .values(&db_bookmark)
                .returning(bookmarks::id)
                .get_result::<i32>(conn)
                .map_err(|e| Self::duplicate_or(e, &draft.url))?;

            for name in &names {
                let tag = get_or_create_tag(conn, name, None, false)?;
                diesel::insert_into(bookmark_tags::table)
                    .values(&NewBookmarkTag {
                        bookmark_id: id,
                        tag_id: tag.id,
                        confidence: None,
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }
            Ok(id)
        })?;

        debug!("Inserted bookmark {} with id {} and {} tag(s)", draft.url, id, names.len());
        Ok(id)
    }

    #[instrument(skip(self), level = "debug")]
    fn get_bookmarks(&self) -> DomainResult<Vec<Bookmark>> {
        let mut conn = self.get_connection()?;

        let db_bookmarks = bookmarks::table
            .order(bookmarks::id.asc())
            .select(DbBookmark::as_select())
            .load::<DbBookmark>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(db_bookmarks.into_iter().map(Bookmark::from).collect())
    }

    #[instrument(skip(self), level = "debug")]
    fn get_bookmark(&self, id: i32) -> DomainResult<Option<Bookmark>> {
        let mut conn = self.get_connection()?;

        let result = bookmarks::table
            .find(id)
            .select(DbBookmark::as_select())
            .first::<DbBookmark>(&mut conn)
            .optional()
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(result.map(Bookmark::from))
    }

    #[instrument(skip(self), level = "debug")]
    fn get_bookmark_by_url(&self, url: &str) -> DomainResult<Option<Bookmark>> {
        let mut conn = self.get_connection()?;

        let result = bookmarks::table
            .filter(bookmarks::url.eq(url))
            .select(DbBookmark::as_select())
            .first::<DbBookmark>(&mut conn)
            .optional()
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(result.map(Bookmark::from))
    }

    #[instrument(skip(self), level = "debug")]
    fn count(&self) -> DomainResult<usize> {
        let mut conn = self.get_connection()?;

        let n = bookmarks::table
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(n.max(0) as usize)
    }

    #[instrument(skip(self), level = "debug")]
    fn update_bookmark(&self, id: i32, draft: &BookmarkDraft) -> DomainResult<bool> {
        let draft = draft.validated()?;
        let mut conn = self.get_connection()?;

        let updated = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            diesel::update(bookmarks::table.find(id))
                .set(DbBookmarkChanges::from(&draft))
                .execute(conn)
                .map_err(|e| Self::duplicate_or(e, &draft.url))
        })?;

        debug!("Updated {} bookmark(s) with id {}", updated, id);
        Ok(updated > 0)
    }

    #[instrument(skip(self), level = "debug")]
    fn delete_bookmark(&self, id: i32) -> DomainResult<bool> {
        let mut conn = self.get_connection()?;

        // tag links cascade, the index entry goes with the delete trigger
        let deleted = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            Ok(diesel::delete(bookmarks::table.find(id)).execute(conn)?)
        })?;

        debug!("Deleted {} bookmark(s) with id {}", deleted, id);
        Ok(deleted > 0)
    }

    #[instrument(skip(self), level = "debug")]
    fn search_bookmarks(&self, query: &str) -> DomainResult<Vec<Bookmark>> {
        let fts_query = query.trim();
        if fts_query.is_empty() {
            return Err(DomainError::InvalidQuery(
                "Search query cannot be empty".to_string(),
            ));
        }

        let mut conn = self.get_connection()?;

        let db_bookmarks = sql_query(SEARCH_SQL)
            .bind::<Text, _>(fts_query)
            .load::<DbBookmark>(&mut conn)
            .map_err(|e| {
                if is_query_syntax_error(&e) {
                    SqliteRepositoryError::InvalidQuery(format!("'{}': {}", fts_query, e))
                } else {
                    SqliteRepositoryError::DatabaseError(e)
                }
            })?;

        debug!("Query '{}' matched {} bookmark(s)", fts_query, db_bookmarks.len());
        Ok(db_bookmarks.into_iter().map(Bookmark::from).collect())
    }

    #[instrument(skip(self), level = "debug")]
    fn add_tag(
        &self,
        name: &str,
        category: Option<&str>,
        auto_generated: bool,
    ) -> DomainResult<Tag> {
        let name = Tag::normalize_name(name)?;
        let mut conn = self.get_connection()?;

        let db_tag = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            get_or_create_tag(conn, &name, category, auto_generated)
        })?;

        Ok(db_tag.into())
    }

    #[instrument(skip(self), level = "debug")]
    fn get_tags(&self) -> DomainResult<Vec<(Tag, usize)>> {
        let mut conn = self.get_connection()?;

        let frequencies = sql_query(TAG_FREQUENCY_SQL)
            .load::<TagsFrequency>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(frequencies.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), level = "debug")]
    fn delete_tag(&self, id: i32) -> DomainResult<bool> {
        let mut conn = self.get_connection()?;

        let deleted = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            Ok(diesel::delete(tags::table.find(id)).execute(conn)?)
        })?;

        Ok(deleted > 0)
    }

    #[instrument(skip(self), level = "debug")]
    fn tag_bookmark(
        &self,
        bookmark_id: i32,
        tag_id: i32,
        confidence: Option<f64>,
    ) -> DomainResult<bool> {
        let mut conn = self.get_connection()?;

        let linked = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            let bookmark_exists = diesel::select(exists(bookmarks::table.find(bookmark_id)))
                .get_result::<bool>(conn)?;
            let tag_exists =
                diesel::select(exists(tags::table.find(tag_id))).get_result::<bool>(conn)?;

            if !(bookmark_exists && tag_exists) {
                debug!(
                    "Cannot link bookmark {} and tag {}: bookmark exists {}, tag exists {}",
                    bookmark_id, tag_id, bookmark_exists, tag_exists
                );
                return Ok(false);
            }

            diesel::insert_into(bookmark_tags::table)
                .values(&NewBookmarkTag {
                    bookmark_id,
                    tag_id,
                    confidence,
                })
                .on_conflict((bookmark_tags::bookmark_id, bookmark_tags::tag_id))
                .do_update()
                .set(bookmark_tags::confidence.eq(excluded(bookmark_tags::confidence)))
                .execute(conn)?;

            Ok(true)
        })?;

        Ok(linked)
    }

    #[instrument(skip(self), level = "debug")]
    fn untag_bookmark(&self, bookmark_id: i32, tag_id: i32) -> DomainResult<bool> {
        let mut conn = self.get_connection()?;

        let deleted = conn.immediate_transaction::<_, SqliteRepositoryError, _>(|conn| {
            Ok(diesel::delete(
                bookmark_tags::table
                    .filter(bookmark_tags::bookmark_id.eq(bookmark_id))
                    .filter(bookmark_tags::tag_id.eq(tag_id)),
            )
            .execute(conn)?)
        })?;

        Ok(deleted > 0)
    }

    #[instrument(skip(self), level = "debug")]
    fn get_bookmark_tags(&self, bookmark_id: i32) -> DomainResult<Vec<BookmarkTag>> {
        let mut conn = self.get_connection()?;

        let rows = bookmark_tags::table
            .inner_join(tags::table)
            .filter(bookmark_tags::bookmark_id.eq(bookmark_id))
            .order(tags::name.asc())
            .select((DbTag::as_select(), bookmark_tags::confidence))
            .load::<(DbTag, Option<f64>)>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(rows
            .into_iter()
            .map(|(db_tag, confidence)| BookmarkTag {
                bookmark_id,
                tag: db_tag.into(),
                confidence,
            })
            .collect())
    }

    #[instrument(skip(self), level = "debug")]
    fn get_bookmarks_by_tag(&self, name: &str) -> DomainResult<Vec<Bookmark>> {
        let name = Tag::normalize_name(name)?;
        let mut conn = self.get_connection()?;

        let tagged_ids = bookmark_tags::table
            .inner_join(tags::table)
            .filter(tags::name.eq(name))
            .select(bookmark_tags::bookmark_id);

        let db_bookmarks = bookmarks::table
            .filter(bookmarks::id.eq_any(tagged_ids))
            .order(bookmarks::id.asc())
            .select(DbBookmark::as_select())
            .load::<DbBookmark>(&mut conn)
            .map_err(SqliteRepositoryError::DatabaseError)?;

        Ok(db_bookmarks.into_iter().map(Bookmark::from).collect())
    }
}

/// Insert the tag unless the name is taken, then read it back. Runs inside the caller's transaction.
fn get_or_create_tag(
    conn: &mut SqliteConnection,
    name: &str,
    category: Option<&str>,
    auto_generated: bool,
) -> SqliteResult<DbTag> {
    diesel::insert_into(tags::table)
        .values(&NewTag {
            name,
            category,
            auto_generated: Some(auto_generated),
        })
        .on_conflict(tags::name)
        .do_nothing()
        .execute(conn)?;

    Ok(tags::table
        .filter(tags::name.eq(name))
        .select(DbTag::as_select())
        .first::<DbTag>(conn)?)
}
