//! In-memory storage backend.
//!
//! Used when no `DATABASE_URL` is configured and by the test suites. All
//! state lives behind one `RwLock`, so a version check and the write that
//! follows it happen atomically.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StorageError, traits::StorageBackend};
use crate::aggregator::{MatchPolicy, search_by_technical_detail};
use crate::models::{
    Diagram, DiagramFilter, DiagramPatch, NewDiagram, NewUser, Page, Pagination, User,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    diagrams: HashMap<Uuid, Diagram>,
}

impl MemoryState {
    fn with_creator(&self, mut diagram: Diagram) -> Diagram {
        diagram.creator = self.users.get(&diagram.created_by).map(User::summary);
        diagram
    }
}

#[derive(Default)]
pub struct MemoryStorageBackend {
    state: RwLock<MemoryState>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn get_diagram(&self, diagram_id: Uuid) -> Result<Option<Diagram>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .diagrams
            .get(&diagram_id)
            .cloned()
            .map(|d| state.with_creator(d)))
    }

    async fn create_diagram(&self, diagram: NewDiagram) -> Result<Diagram, StorageError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let diagram = Diagram {
            id: Uuid::new_v4(),
            title: diagram.title,
            description: diagram.description,
            data: diagram.data,
            tags: diagram.tags,
            created_by: diagram.created_by,
            version: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
            creator: None,
        };
        state.diagrams.insert(diagram.id, diagram.clone());
        Ok(state.with_creator(diagram))
    }

    async fn update_diagram(
        &self,
        diagram_id: Uuid,
        patch: DiagramPatch,
        expected_version: Option<i32>,
    ) -> Result<Diagram, StorageError> {
        let mut state = self.state.write().await;
        let stored = state
            .diagrams
            .get_mut(&diagram_id)
            .ok_or_else(|| StorageError::diagram_not_found(diagram_id))?;

        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(StorageError::VersionConflict {
                    entity_type: "diagram".to_string(),
                    entity_id: diagram_id.to_string(),
                    expected_version: expected,
                    current_version: stored.version,
                    current_data: serde_json::to_value(&*stored).ok(),
                });
            }
        }

        // updated_at never moves backwards
        let now = Utc::now().max(stored.updated_at);
        patch.apply(stored, now);
        let updated = stored.clone();
        Ok(state.with_creator(updated))
    }

    async fn set_diagram_active(&self, diagram_id: Uuid, is_active: bool) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let stored = state
            .diagrams
            .get_mut(&diagram_id)
            .ok_or_else(|| StorageError::diagram_not_found(diagram_id))?;
        stored.is_active = is_active;
        stored.updated_at = Utc::now().max(stored.updated_at);
        Ok(())
    }

    async fn list_diagrams(
        &self,
        filter: &DiagramFilter,
        pagination: Pagination,
    ) -> Result<Page<Diagram>, StorageError> {
        let state = self.state.read().await;
        let candidates = state
            .diagrams
            .values()
            .filter(|d| filter.matches_metadata(d))
            .cloned()
            .map(|d| state.with_creator(d));
        let mut matching: Vec<Diagram> = match &filter.technical {
            Some(query) => search_by_technical_detail(candidates, query, MatchPolicy::CaseInsensitive),
            None => candidates.collect(),
        };

        matching.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(Page::from_items(matching, pagination))
    }
}
