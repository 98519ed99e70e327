//! PostgreSQL storage backend implementation.
//!
//! Uses sqlx for database operations and implements the StorageBackend trait.
//! Diagram documents and tags are stored as `jsonb`; the technical-detail
//! filter is evaluated in SQL so listings paginate over matching rows only.

use super::{StorageError, traits::*};
use crate::aggregator::DiagramData;
use crate::models::{
    Diagram, DiagramFilter, DiagramPatch, NewDiagram, NewUser, Page, Pagination, User, UserSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const DIAGRAM_COLUMNS: &str = r#"
    d.id, d.title, d.description, d.data, d.tags, d.created_by, d.version,
    d.is_active, d.created_at, d.updated_at,
    u.name AS creator_name, u.email AS creator_email
"#;

/// Matches when any variable, parameter or argument name of any node
/// contains the bound query, ignoring case. Non-array collections are skipped.
/// Case folding is pinned to the ICU root collation so it follows Unicode
/// rules whatever the database default collation is.
const TECHNICAL_MATCH_SQL: &str = r#"EXISTS (
    SELECT 1
    FROM jsonb_array_elements(
            CASE WHEN jsonb_typeof(d.data->'nodes') = 'array' THEN d.data->'nodes' ELSE '[]'::jsonb END
         ) AS n(node),
         LATERAL (VALUES ('variables'), ('parameters'), ('arguments')) AS cat(key),
         LATERAL jsonb_array_elements(
            CASE WHEN jsonb_typeof(n.node->'details'->cat.key) = 'array'
                 THEN n.node->'details'->cat.key ELSE '[]'::jsonb END
         ) AS i(item)
    WHERE jsonb_typeof(i.item->'name') = 'string'
      AND strpos(lower((i.item->>'name') COLLATE "und-x-icu"), lower("#;

const TECHNICAL_MATCH_TAIL_SQL: &str = r#"::text COLLATE "und-x-icu")) > 0)"#;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct DiagramRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    data: Json<Value>,
    tags: Json<Vec<String>>,
    created_by: Uuid,
    version: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_name: Option<String>,
    creator_email: Option<String>,
}

impl TryFrom<DiagramRow> for Diagram {
    type Error = StorageError;

    fn try_from(row: DiagramRow) -> Result<Self, Self::Error> {
        let data = DiagramData::from_value(&row.data.0).map_err(|e| {
            StorageError::Other(format!("Failed to deserialize diagram {}: {}", row.id, e))
        })?;
        let creator = match (row.creator_name, row.creator_email) {
            (Some(name), Some(email)) => Some(UserSummary {
                id: row.created_by,
                name,
                email,
            }),
            _ => None,
        };
        Ok(Diagram {
            id: row.id,
            title: row.title,
            description: row.description,
            data,
            tags: row.tags.0,
            created_by: row.created_by,
            version: row.version,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            creator,
        })
    }
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a DiagramFilter) {
    builder.push(" WHERE TRUE");
    if filter.active_only {
        builder.push(" AND d.is_active");
    }
    if let Some(owner) = filter.owner {
        builder.push(" AND d.created_by = ").push_bind(owner);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (d.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if !filter.tags.is_empty() {
        builder
            .push(" AND d.tags @> ")
            .push_bind(Json(filter.tags.clone()));
    }
    if let Some(technical) = &filter.technical {
        builder
            .push(" AND ")
            .push(TECHNICAL_MATCH_SQL)
            .push_bind(technical.as_str())
            .push(TECHNICAL_MATCH_TAIL_SQL);
    }
}

/// PostgreSQL storage backend implementation.
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_diagram(
        &self,
        executor: impl sqlx::PgExecutor<'_>,
        diagram_id: Uuid,
        lock: bool,
    ) -> Result<Option<Diagram>, StorageError> {
        let sql = format!(
            "SELECT {DIAGRAM_COLUMNS} FROM diagrams d LEFT JOIN users u ON u.id = d.created_by WHERE d.id = $1{}",
            if lock { " FOR UPDATE OF d" } else { "" }
        );
        let row: Option<DiagramRow> = sqlx::query_as(&sql)
            .bind(diagram_id)
            .fetch_optional(executor)
            .await?;
        row.map(Diagram::try_from).transpose()
    }
}

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let now = Utc::now();
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StorageError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_diagram(&self, diagram_id: Uuid) -> Result<Option<Diagram>, StorageError> {
        self.fetch_diagram(&self.pool, diagram_id, false).await
    }

    async fn create_diagram(&self, diagram: NewDiagram) -> Result<Diagram, StorageError> {
        let diagram_id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO diagrams (id, title, description, data, tags, created_by, version, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, TRUE, $7, $7)
            "#,
        )
        .bind(diagram_id)
        .bind(&diagram.title)
        .bind(&diagram.description)
        .bind(Json(&diagram.data))
        .bind(Json(&diagram.tags))
        .bind(diagram.created_by)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_diagram(diagram_id)
            .await?
            .ok_or_else(|| StorageError::diagram_not_found(diagram_id))
    }

    async fn update_diagram(
        &self,
        diagram_id: Uuid,
        patch: DiagramPatch,
        expected_version: Option<i32>,
    ) -> Result<Diagram, StorageError> {
        let mut tx = self.pool.begin().await?;

        let mut diagram = self
            .fetch_diagram(&mut *tx, diagram_id, true)
            .await?
            .ok_or_else(|| StorageError::diagram_not_found(diagram_id))?;

        if let Some(expected) = expected_version {
            if diagram.version != expected {
                return Err(StorageError::VersionConflict {
                    entity_type: "diagram".to_string(),
                    entity_id: diagram_id.to_string(),
                    expected_version: expected,
                    current_version: diagram.version,
                    current_data: serde_json::to_value(&diagram).ok(),
                });
            }
        }

        patch.apply(&mut diagram, Utc::now());

        sqlx::query(
            r#"
            UPDATE diagrams
            SET title = $1, description = $2, data = $3, tags = $4, version = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&diagram.title)
        .bind(&diagram.description)
        .bind(Json(&diagram.data))
        .bind(Json(&diagram.tags))
        .bind(diagram.version)
        .bind(diagram.updated_at)
        .bind(diagram_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(diagram)
    }

    async fn set_diagram_active(&self, diagram_id: Uuid, is_active: bool) -> Result<(), StorageError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE diagrams
            SET is_active = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(diagram_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            Err(StorageError::diagram_not_found(diagram_id))
        } else {
            Ok(())
        }
    }

    async fn list_diagrams(
        &self,
        filter: &DiagramFilter,
        pagination: Pagination,
    ) -> Result<Page<Diagram>, StorageError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM diagrams d");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query = QueryBuilder::new(format!(
            "SELECT {DIAGRAM_COLUMNS} FROM diagrams d LEFT JOIN users u ON u.id = d.created_by"
        ));
        push_filter(&mut page_query, filter);
        page_query
            .push(" ORDER BY d.updated_at DESC, d.created_at DESC LIMIT ")
            .push_bind(pagination.limit() as i64)
            .push(" OFFSET ")
            .push_bind(pagination.offset() as i64);

        let rows: Vec<DiagramRow> = page_query
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;
        let diagrams = rows
            .into_iter()
            .map(Diagram::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(diagrams, total.max(0) as u64, pagination))
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        Ok(())
    }
}
