//! Generic table-CRUD contract (§4.8).
//!
//! A row is a loosely-typed `{column: value}` map — the tables behind this
//! interface (`offers`, `slideshow`, `daily_needs`, `trending_products`,
//! `daily_needs_items`, `bg_image`, `users`) have no shared schema, so there
//! is no single Rust struct that fits all of them. Every operation is
//! single-row or filtered-set; no joins.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ContentError;

pub type Row = HashMap<String, Value>;

/// Tables reachable through the generic CRUD interface. Anything else is
/// rejected with [`ContentError::UnknownTable`] before a query is built,
/// since table names are interpolated into SQL text rather than bound as
/// parameters.
pub const KNOWN_TABLES: &[&str] =
    &["offers", "slideshow", "daily_needs", "trending_products", "daily_needs_items", "bg_image", "users"];

#[must_use]
pub fn is_known_table(table: &str) -> bool {
    KNOWN_TABLES.contains(&table)
}

/// Table-level CRUD contract over the collaborator content store (§4.8).
pub trait ContentStore: Send + Sync {
    /// Rows matching every `(column, value)` pair in `filter`. An empty
    /// filter selects the whole table.
    fn select(
        &self,
        table: &str,
        filter: &Row,
    ) -> impl std::future::Future<Output = Result<Vec<Row>, ContentError>> + Send;

    /// Insert one row, returning it as stored (including any
    /// server-assigned columns such as `id`/`created_at`).
    fn insert(&self, table: &str, row: Row) -> impl std::future::Future<Output = Result<Row, ContentError>> + Send;

    /// Apply `new_values` to every row matching `match_map`, returning the
    /// updated rows. `ContentError::NotFound` when nothing matched.
    fn update(
        &self,
        table: &str,
        match_map: &Row,
        new_values: Row,
    ) -> impl std::future::Future<Output = Result<Vec<Row>, ContentError>> + Send;

    /// Delete every row matching `match_map`, returning the deleted rows.
    /// `ContentError::NotFound` when nothing matched.
    fn delete(
        &self,
        table: &str,
        match_map: &Row,
    ) -> impl std::future::Future<Output = Result<Vec<Row>, ContentError>> + Send;
}

pub mod memory {
    //! In-memory fake satisfying [`ContentStore`], used in place of a live
    //! Postgres instance for the rest of this crate's and `pricely-server`'s
    //! tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use serde_json::Value;

    use super::{ContentError, ContentStore, Row};

    #[derive(Default)]
    pub struct MemoryContentStore {
        tables: Mutex<HashMap<String, Vec<Row>>>,
        next_id: Mutex<i64>,
    }

    impl MemoryContentStore {
        #[must_use]
        pub fn new() -> Self {
            Self {
                tables: Mutex::new(HashMap::new()),
                next_id: Mutex::new(1),
            }
        }

        fn row_matches(row: &Row, filter: &Row) -> bool {
            filter.iter().all(|(k, v)| row.get(k) == Some(v))
        }
    }

    impl ContentStore for MemoryContentStore {
        async fn select(&self, table: &str, filter: &Row) -> Result<Vec<Row>, ContentError> {
            if !super::is_known_table(table) {
                return Err(ContentError::UnknownTable(table.to_string()));
            }
            let tables = self.tables.lock().unwrap();
            let rows = tables.get(table).cloned().unwrap_or_default();
            Ok(rows.into_iter().filter(|row| Self::row_matches(row, filter)).collect())
        }

        async fn insert(&self, table: &str, mut row: Row) -> Result<Row, ContentError> {
            if !super::is_known_table(table) {
                return Err(ContentError::UnknownTable(table.to_string()));
            }
            let mut next_id = self.next_id.lock().unwrap();
            row.entry("id".to_string()).or_insert_with(|| Value::Number((*next_id).into()));
            *next_id += 1;
            let mut tables = self.tables.lock().unwrap();
            tables.entry(table.to_string()).or_default().push(row.clone());
            Ok(row)
        }

        async fn update(&self, table: &str, match_map: &Row, new_values: Row) -> Result<Vec<Row>, ContentError> {
            if !super::is_known_table(table) {
                return Err(ContentError::UnknownTable(table.to_string()));
            }
            let mut tables = self.tables.lock().unwrap();
            let Some(rows) = tables.get_mut(table) else {
                return Err(ContentError::NotFound);
            };
            let mut updated = Vec::new();
            for row in rows.iter_mut() {
                if Self::row_matches(row, match_map) {
                    for (k, v) in &new_values {
                        row.insert(k.clone(), v.clone());
                    }
                    updated.push(row.clone());
                }
            }
            if updated.is_empty() {
                return Err(ContentError::NotFound);
            }
            Ok(updated)
        }

        async fn delete(&self, table: &str, match_map: &Row) -> Result<Vec<Row>, ContentError> {
            if !super::is_known_table(table) {
                return Err(ContentError::UnknownTable(table.to_string()));
            }
            let mut tables = self.tables.lock().unwrap();
            let Some(rows) = tables.get_mut(table) else {
                return Err(ContentError::NotFound);
            };
            let (deleted, remaining): (Vec<Row>, Vec<Row>) =
                rows.drain(..).partition(|row| Self::row_matches(row, match_map));
            *rows = remaining;
            if deleted.is_empty() {
                return Err(ContentError::NotFound);
            }
            Ok(deleted)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn insert_then_select_round_trips() {
            let store = MemoryContentStore::new();
            let mut row = Row::new();
            row.insert("image_url".to_string(), Value::String("https://example.test/a.png".to_string()));
            row.insert("price".to_string(), Value::String("199".to_string()));
            let inserted = store.insert("offers", row).await.unwrap();
            assert!(inserted.contains_key("id"));

            let mut filter = Row::new();
            filter.insert("id".to_string(), inserted["id"].clone());
            let selected = store.select("offers", &filter).await.unwrap();
            assert_eq!(selected.len(), 1);
        }

        #[tokio::test]
        async fn update_on_no_match_is_not_found() {
            let store = MemoryContentStore::new();
            let mut filter = Row::new();
            filter.insert("id".to_string(), Value::from(999));
            let err = store.update("offers", &filter, Row::new()).await.unwrap_err();
            assert!(matches!(err, ContentError::NotFound));
        }

        #[tokio::test]
        async fn delete_removes_only_matching_rows() {
            let store = MemoryContentStore::new();
            let mut row_a = Row::new();
            row_a.insert("image_url".to_string(), Value::String("a".to_string()));
            row_a.insert("price".to_string(), Value::String("1".to_string()));
            let mut row_b = Row::new();
            row_b.insert("image_url".to_string(), Value::String("b".to_string()));
            row_b.insert("price".to_string(), Value::String("2".to_string()));
            let inserted_a = store.insert("offers", row_a).await.unwrap();
            store.insert("offers", row_b).await.unwrap();

            let mut filter = Row::new();
            filter.insert("id".to_string(), inserted_a["id"].clone());
            let deleted = store.delete("offers", &filter).await.unwrap();
            assert_eq!(deleted.len(), 1);

            let remaining = store.select("offers", &Row::new()).await.unwrap();
            assert_eq!(remaining.len(), 1);
        }

        #[tokio::test]
        async fn unknown_table_is_rejected() {
            let store = MemoryContentStore::new();
            let err = store.select("admin_users_secret", &Row::new()).await.unwrap_err();
            assert!(matches!(err, ContentError::UnknownTable(_)));
        }
    }
}

pub mod postgres {
    //! Postgres-backed [`ContentStore`]. Every known table (`offers`,
    //! `slideshow`, `daily_needs`, ...) is a document table of
    //! `(id BIGSERIAL, data JSONB)` — these rows have no shared schema,
    //! so a single JSONB column is the natural fit rather than a bespoke
    //! table per content type.

    use std::collections::HashMap;

    use serde_json::Value;
    use sqlx::{PgPool, Row as SqlxRow};

    use super::{is_known_table, ContentError, ContentStore, Row, KNOWN_TABLES};

    pub struct PgContentStore {
        pool: PgPool,
    }

    impl PgContentStore {
        #[must_use]
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        /// Create the document table for every known table if it does not
        /// already exist. Call once at startup; cheap and idempotent.
        ///
        /// # Errors
        ///
        /// Returns [`ContentError::Store`] if any `CREATE TABLE` fails.
        pub async fn ensure_schema(&self) -> Result<(), ContentError> {
            for table in KNOWN_TABLES {
                let stmt = format!("CREATE TABLE IF NOT EXISTS {table} (id BIGSERIAL PRIMARY KEY, data JSONB NOT NULL)");
                sqlx::query(&stmt).execute(&self.pool).await?;
            }
            Ok(())
        }

        async fn select_rows(&self, table: &str) -> Result<Vec<Row>, ContentError> {
            let stmt = format!("SELECT id, data FROM {table}");
            let rows = sqlx::query(&stmt).fetch_all(&self.pool).await?;
            let mut out = Vec::with_capacity(rows.len());
            for record in rows {
                let id: i64 = record.try_get("id")?;
                let data: Value = record.try_get("data")?;
                let mut row = object_to_row(data);
                row.insert("id".to_string(), Value::from(id));
                out.push(row);
            }
            Ok(out)
        }
    }

    fn object_to_row(value: Value) -> Row {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        }
    }

    fn row_matches(row: &Row, filter: &Row) -> bool {
        filter.iter().all(|(k, v)| row.get(k) == Some(v))
    }

    fn row_id(row: &Row) -> Result<i64, ContentError> {
        row.get("id").and_then(Value::as_i64).ok_or_else(|| ContentError::Store {
            reason: "row is missing its id column".to_string(),
        })
    }

    impl ContentStore for PgContentStore {
        async fn select(&self, table: &str, filter: &Row) -> Result<Vec<Row>, ContentError> {
            if !is_known_table(table) {
                return Err(ContentError::UnknownTable(table.to_string()));
            }
            let rows = self.select_rows(table).await?;
            Ok(rows.into_iter().filter(|row| row_matches(row, filter)).collect())
        }

        async fn insert(&self, table: &str, row: Row) -> Result<Row, ContentError> {
            if !is_known_table(table) {
                return Err(ContentError::UnknownTable(table.to_string()));
            }
            let data = Value::Object(row.into_iter().collect());
            let stmt = format!("INSERT INTO {table} (data) VALUES ($1) RETURNING id");
            let id: i64 = sqlx::query_scalar(&stmt).bind(&data).fetch_one(&self.pool).await?;
            let mut inserted = object_to_row(data);
            inserted.insert("id".to_string(), Value::from(id));
            Ok(inserted)
        }

        async fn update(&self, table: &str, match_map: &Row, new_values: Row) -> Result<Vec<Row>, ContentError> {
            let matched = self.select(table, match_map).await?;
            if matched.is_empty() {
                return Err(ContentError::NotFound);
            }
            let mut updated = Vec::with_capacity(matched.len());
            for mut row in matched {
                let id = row_id(&row)?;
                for (key, value) in &new_values {
                    row.insert(key.clone(), value.clone());
                }
                row.remove("id");
                let data = Value::Object(row.clone().into_iter().collect());
                let stmt = format!("UPDATE {table} SET data = $1 WHERE id = $2");
                sqlx::query(&stmt).bind(&data).bind(id).execute(&self.pool).await?;
                row.insert("id".to_string(), Value::from(id));
                updated.push(row);
            }
            Ok(updated)
        }

        async fn delete(&self, table: &str, match_map: &Row) -> Result<Vec<Row>, ContentError> {
            let matched = self.select(table, match_map).await?;
            if matched.is_empty() {
                return Err(ContentError::NotFound);
            }
            for row in &matched {
                let id = row_id(row)?;
                let stmt = format!("DELETE FROM {table} WHERE id = $1");
                sqlx::query(&stmt).bind(id).execute(&self.pool).await?;
            }
            Ok(matched)
        }
    }
}
