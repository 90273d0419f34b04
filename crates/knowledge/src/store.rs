//! SQLite FTS5-backed article store.
//!
//! Every article lives in one FTS5 virtual table; relevance is the table's
//! `bm25()` rank, negated so that larger scores are better.

use crate::types::{
    Article, BuildStats, NewArticle, QueryResult, ScoredArticle, SourceText, StoreStats,
    CRAWL_DATE_FORMAT,
};
use ragcourse_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

const SCHEMA: &str = r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS articles USING fts5(
        title,
        content,
        url UNINDEXED,
        publish_date UNINDEXED,
        crawl_date UNINDEXED,
        summary,
        depth UNINDEXED,
        tokenize='unicode61'
    );
"#;

const SELECT_COLUMNS: &str =
    "rowid, title, content, url, publish_date, crawl_date, summary, depth";

/// A durable, full-text indexed collection of articles.
pub struct ArticleStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl ArticleStore {
    /// Build a fresh store at `path` from raw texts, replacing any existing store.
    ///
    /// Blank sources are skipped with a warning and counted in
    /// [`BuildStats::skipped`].
    pub fn build<I>(path: &Path, sources: I) -> AppResult<(Self, BuildStats)>
    where
        I: IntoIterator<Item = SourceText>,
    {
        if path.exists() {
            tracing::info!("Replacing existing store at {:?}", path);
            std::fs::remove_file(path)?;
        }

        let store = Self::open_or_create(path)?;
        let stats = store.extend(sources)?;

        tracing::info!(
            "Built store at {:?}: {} articles, {} skipped in {:.2}s",
            path,
            stats.inserted,
            stats.skipped,
            stats.duration_secs
        );

        Ok((store, stats))
    }

    /// Open an existing store read-only.
    ///
    /// Writes through the returned store fail with [`AppError::Store`]. Fails with [`AppError::StoreUnavailable`] when the file is missing or
    /// does not hold an article table.
    pub fn open(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::StoreUnavailable(format!(
                "No store at {:?}. Build one first with 'ragcourse build'.",
                path
            )));
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| {
                AppError::StoreUnavailable(format!("Failed to open store {:?}: {}", path, e))
            })?;

        let schema: Option<String> = conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'articles'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| {
                AppError::StoreUnavailable(format!("{:?} is not a valid store: {}", path, e))
            })?;

        match schema {
            Some(sql) if sql.to_lowercase().contains("fts5") => {}
            _ => {
                return Err(AppError::StoreUnavailable(format!(
                    "{:?} has no article index",
                    path
                )))
            }
        }

        tracing::debug!("Opened store at {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Open a store for writing, creating the file and schema if needed.
    pub fn open_or_create(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Store(format!("Failed to open store {:?}: {}", path, e)))?;

        log_sql(SCHEMA);
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Store(format!("Failed to create article table: {}", e)))?;

        tracing::debug!("Initialized store at {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add raw texts in one transaction.
    ///
    /// Blank texts and sources that are already stored are skipped.
    pub fn extend<I>(&self, sources: I) -> AppResult<BuildStats>
    where
        I: IntoIterator<Item = SourceText>,
    {
        let start = Instant::now();
        let mut stats = BuildStats::default();
        let mut seen = HashSet::new();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Store(format!("Failed to begin transaction: {}", e)))?;

        for source in sources {
            if source.text.trim().is_empty() {
                let err = AppError::Ingest(format!(
                    "No text in source {}",
                    source.source.as_deref().unwrap_or("<inline>")
                ));
                tracing::warn!("{}", err);
                stats.skipped += 1;
                continue;
            }

            if let Some(ref name) = source.source {
                if !seen.insert(name.clone()) || count_source(&tx, name)? > 0 {
                    tracing::info!("Duplicate source, skipped: {}", name);
                    stats.skipped += 1;
                    continue;
                }
            }

            insert_row(&tx, &NewArticle::from(source))?;
            stats.inserted += 1;
        }

        tx.commit()
            .map_err(|e| AppError::Store(format!("Failed to commit articles: {}", e)))?;

        stats.duration_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }

    /// Insert one article and return its id.
    pub fn insert(&self, article: NewArticle) -> AppResult<i64> {
        if article.text.trim().is_empty() {
            return Err(AppError::Ingest(format!(
                "No text in source {}",
                article.source.as_deref().unwrap_or("<inline>")
            )));
        }

        let conn = self.lock()?;
        insert_row(&conn, &article)
    }

    /// Up to `k` articles ranked by relevance to `text`, best first.
    ///
    /// Ties keep insertion order. A query with no searchable terms returns an
    /// empty result.
    pub fn query(&self, text: &str, k: usize) -> AppResult<QueryResult> {
        let Some(fts_query) = to_fts_query(text) else {
            tracing::debug!("No searchable terms in query: {:?}", text);
            return Ok(QueryResult::default());
        };

        if k == 0 {
            return Ok(QueryResult::default());
        }

        let sql = format!(
            "SELECT {}, bm25(articles) AS relevance_score
             FROM articles
             WHERE articles MATCH ?1
             ORDER BY relevance_score ASC, rowid ASC
             LIMIT ?2",
            SELECT_COLUMNS
        );
        log_sql(&sql);

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Store(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![fts_query, k as i64], |row| {
                let bm25: f64 = row.get(8)?;
                Ok(ScoredArticle {
                    article: row_to_article(row)?,
                    score: -bm25,
                })
            })
            .map_err(|e| AppError::Store(format!("Failed to query articles: {}", e)))?;

        let articles = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Store(format!("Failed to read article row: {}", e)))?;

        tracing::debug!(
            "Query {:?} matched {} articles (requested top-{})",
            fts_query,
            articles.len(),
            k
        );

        Ok(QueryResult { articles })
    }

    /// Fetch one article by id.
    pub fn get(&self, id: i64) -> AppResult<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE rowid = ?1", SELECT_COLUMNS);
        log_sql(&sql);

        let conn = self.lock()?;
        conn.query_row(&sql, [id], row_to_article)
            .optional()
            .map_err(|e| AppError::Store(format!("Failed to read article {}: {}", id, e)))
    }

    /// Number of stored articles.
    pub fn len(&self) -> AppResult<usize> {
        let sql = "SELECT count(*) FROM articles WHERE content IS NOT NULL";
        log_sql(sql);

        let conn = self.lock()?;
        conn.query_row(sql, [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| AppError::Store(format!("Failed to count articles: {}", e)))
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether an article from this source is already stored.
    pub fn contains_source(&self, source: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        Ok(count_source(&conn, source)? > 0)
    }

    /// Crawl depth the source was stored at, if stored.
    pub fn depth_of(&self, source: &str) -> AppResult<Option<u32>> {
        let sql = "SELECT depth FROM articles WHERE url = ?1 LIMIT 1";
        log_sql(sql);

        let conn = self.lock()?;
        conn.query_row(sql, [source], |row| row.get::<_, i64>(0))
            .optional()
            .map(|depth| depth.map(|d| d.max(0) as u32))
            .map_err(|e| AppError::Store(format!("Failed to read depth of {}: {}", source, e)))
    }

    /// Record a new crawl depth for a stored source.
    pub fn set_depth(&self, source: &str, depth: u32) -> AppResult<usize> {
        let sql = "UPDATE articles SET depth = ?1 WHERE url = ?2";
        log_sql(sql);

        let conn = self.lock()?;
        conn.execute(sql, params![depth as i64, source])
            .map_err(|e| AppError::Store(format!("Failed to update depth of {}: {}", source, e)))
    }

    /// Article count, distinct sources and file size.
    pub fn stats(&self) -> AppResult<StoreStats> {
        let articles = self.len()?;

        let sql = "SELECT count(DISTINCT url) FROM articles WHERE url IS NOT NULL";
        log_sql(sql);
        let sources = {
            let conn = self.lock()?;
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map_err(|e| AppError::Store(format!("Failed to count sources: {}", e)))?
                as usize
        };

        let db_size_bytes = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            articles,
            sources,
            db_size_bytes,
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppError::Store(format!("Store connection lock poisoned: {}", e)))
    }
}

fn insert_row(conn: &Connection, article: &NewArticle) -> AppResult<i64> {
    let sql = "INSERT INTO articles(title, content, url, publish_date, crawl_date, summary, depth)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
    log_sql(sql);

    conn.execute(
        sql,
        params![
            article.title,
            article.text,
            article.source,
            article.published_at,
            article.crawled_at.format(CRAWL_DATE_FORMAT).to_string(),
            article.summary,
            article.depth as i64,
        ],
    )
    .map_err(|e| AppError::Store(format!("Failed to insert article: {}", e)))?;

    Ok(conn.last_insert_rowid())
}

fn count_source(conn: &Connection, source: &str) -> AppResult<i64> {
    let sql = "SELECT count(*) FROM articles WHERE url = ?1";
    log_sql(sql);

    conn.query_row(sql, [source], |row| row.get(0))
        .map_err(|e| AppError::Store(format!("Failed to look up {}: {}", source, e)))
}

fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        text: row.get(2)?,
        source: row.get(3)?,
        published_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        crawled_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        summary: row.get(6)?,
        depth: row.get::<_, Option<i64>>(7)?.unwrap_or(0).max(0) as u32,
    })
}

/// Turn free text into an FTS5 query of quoted terms joined with `OR`.
///
/// Every distinct term is kept; bm25 already weighs common words down.
/// Returns `None` when the text has no alphanumeric terms.
pub fn to_fts_query(text: &str) -> Option<String> {
    let mut seen = HashSet::new();
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect();

    if terms.is_empty() {
        return None;
    }

    Some(
        terms
            .iter()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

/// Log a SQL statement on one line.
fn log_sql(sql: &str) {
    tracing::debug!("SQL: {}", sql.split_whitespace().collect::<Vec<_>>().join(" "));
}
