//! Diagram service: ownership, validation and versioning rules on top of a
//! [`StorageBackend`].

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregator::{Connection, DiagramData, Node, TechnicalStats};
use crate::api::validation::ValidationErrors;
use crate::models::diagram::TITLE_MAX;
use crate::models::{
    CreateDiagramRequest, Diagram, DiagramFilter, DiagramPatch, NewDiagram, Page, Pagination,
    TechnicalDetailsView, UpdateDiagramRequest,
};
use crate::storage::{StorageBackend, StorageError};

const COPY_SUFFIX: &str = " (Copy)";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Forbidden(String),
    #[error("Diagram not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Parse a validated `data` object; a typed-parse failure is a `data` field error.
fn parse_data(value: &Value) -> Result<DiagramData, ValidationErrors> {
    DiagramData::from_value(value).map_err(|e| ValidationErrors::single("data", e.to_string()))
}

/// Title for a duplicate, kept within the title length limit.
pub fn copy_title(title: &str) -> String {
    let keep = TITLE_MAX.saturating_sub(COPY_SUFFIX.chars().count());
    let mut copy: String = title.chars().take(keep).collect();
    copy.push_str(COPY_SUFFIX);
    copy
}

#[derive(Clone)]
pub struct DiagramService {
    storage: Arc<dyn StorageBackend>,
}

impl DiagramService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, owner: Uuid, body: &Value) -> Result<Diagram, ServiceError> {
        let request = CreateDiagramRequest::from_json(body)?;
        let data = parse_data(&request.data)?;

        let diagram = self
            .storage
            .create_diagram(NewDiagram {
                title: request.title,
                description: request.description,
                data,
                tags: request.tags.unwrap_or_default(),
                created_by: owner,
            })
            .await?;

        info!("Created diagram {} for user {}", diagram.id, owner);
        Ok(diagram)
    }

    /// Direct lookup; inactive diagrams are returned too.
    pub async fn get(&self, id: Uuid) -> Result<Diagram, ServiceError> {
        self.storage
            .get_diagram(id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn list(
        &self,
        filter: &DiagramFilter,
        pagination: Pagination,
    ) -> Result<Page<Diagram>, ServiceError> {
        Ok(self.storage.list_diagrams(filter, pagination).await?)
    }

    pub async fn update(
        &self,
        caller: Uuid,
        id: Uuid,
        body: &Value,
    ) -> Result<Diagram, ServiceError> {
        let existing = self.get(id).await?;
        if !existing.is_owned_by(caller) {
            warn!("User {} attempted to update diagram {} owned by {}", caller, id, existing.created_by);
            return Err(ServiceError::Forbidden(
                "Unauthorized to update this diagram".to_string(),
            ));
        }

        let request = UpdateDiagramRequest::from_json(body)?;
        let data = request.data.as_ref().map(parse_data).transpose()?;
        let patch = DiagramPatch {
            title: request.title,
            description: request.description,
            data,
            tags: request.tags,
        };
        let bumps_version = patch.touches_data();

        let diagram = self
            .storage
            .update_diagram(id, patch, request.expected_version)
            .await?;

        info!(
            "Updated diagram {} (version {}{})",
            id,
            diagram.version,
            if bumps_version { ", data replaced" } else { "" }
        );
        Ok(diagram)
    }

    /// Soft delete: the row stays, `is_active` becomes false.
    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        if !existing.is_owned_by(caller) {
            warn!("User {} attempted to delete diagram {} owned by {}", caller, id, existing.created_by);
            return Err(ServiceError::Forbidden(
                "Unauthorized to delete this diagram".to_string(),
            ));
        }

        self.storage.set_diagram_active(id, false).await?;
        info!("Deactivated diagram {}", id);
        Ok(())
    }

    /// Copy into a new version-1 diagram owned by the caller.
    pub async fn duplicate(&self, caller: Uuid, id: Uuid) -> Result<Diagram, ServiceError> {
        let source = self.get(id).await?;
        let copy = self
            .storage
            .create_diagram(NewDiagram {
                title: copy_title(&source.title),
                description: source.description,
                data: source.data,
                tags: source.tags,
                created_by: caller,
            })
            .await?;

        info!("Duplicated diagram {} into {} for user {}", id, copy.id, caller);
        Ok(copy)
    }

    pub async fn nodes(&self, id: Uuid) -> Result<Vec<Node>, ServiceError> {
        Ok(self.get(id).await?.nodes().to_vec())
    }

    pub async fn connections(&self, id: Uuid) -> Result<Vec<Connection>, ServiceError> {
        Ok(self.get(id).await?.connections().to_vec())
    }

    pub async fn technical_details(&self, id: Uuid) -> Result<TechnicalDetailsView, ServiceError> {
        Ok(self.get(id).await?.technical_details_view())
    }

    pub async fn technical_stats(&self, id: Uuid) -> Result<TechnicalStats, ServiceError> {
        Ok(self.get(id).await?.technical_stats())
    }
}
