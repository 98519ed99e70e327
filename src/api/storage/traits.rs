//! Storage trait definitions for the API storage backends.

use crate::models::{Diagram, DiagramFilter, DiagramPatch, NewDiagram, NewUser, Page, Pagination, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User context for storage operations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
}

/// Storage backend trait for database operations
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, super::StorageError>;

    /// Look up a user by (already normalized) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, super::StorageError>;

    /// Get user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, super::StorageError>;

    /// Get diagram by ID regardless of `is_active`, with its creator attached
    async fn get_diagram(&self, diagram_id: Uuid) -> Result<Option<Diagram>, super::StorageError>;

    /// Create a new diagram at version 1
    async fn create_diagram(&self, diagram: NewDiagram) -> Result<Diagram, super::StorageError>;

    /// Apply a patch with optimistic locking
    async fn update_diagram(
        &self,
        diagram_id: Uuid,
        patch: DiagramPatch,
        expected_version: Option<i32>,
    ) -> Result<Diagram, super::StorageError>;

    /// Soft delete or restore
    async fn set_diagram_active(
        &self,
        diagram_id: Uuid,
        is_active: bool,
    ) -> Result<(), super::StorageError>;

    /// Filtered listing ordered by `updated_at` descending
    async fn list_diagrams(
        &self,
        filter: &DiagramFilter,
        pagination: Pagination,
    ) -> Result<Page<Diagram>, super::StorageError>;

    /// Liveness probe for the health endpoint
    async fn health_check(&self) -> Result<(), super::StorageError> {
        Ok(())
    }
}
