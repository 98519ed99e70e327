//! Diagram document model and request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserSummary;
use crate::aggregator::{self, Connection, DiagramData, Node, TechnicalStats};
use crate::api::validation::{
    ValidationErrors, Validator, nullable_string_at, string_at, string_list_at,
};

pub const TITLE_MAX: usize = 255;
pub const DESCRIPTION_MAX: usize = 1000;
pub const TAG_MAX: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Diagram {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Nodes, connections and editor metadata
    #[schema(value_type = Object)]
    pub data: DiagramData,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_by: Uuid,
    /// Bumped by one every time `data` is replaced
    pub version: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserSummary>,
}

impl Diagram {
    pub fn nodes(&self) -> &[Node] {
        aggregator::extract_nodes(&self.data)
    }

    pub fn connections(&self) -> &[Connection] {
        aggregator::extract_connections(&self.data)
    }

    pub fn nodes_with_technical_details(&self) -> Vec<&Node> {
        aggregator::nodes_with_technical_details(&self.data)
    }

    pub fn technical_items_count(&self) -> usize {
        aggregator::technical_items_count(&self.data)
    }

    pub fn technical_stats(&self) -> TechnicalStats {
        aggregator::technical_stats(&self.data)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }

    pub fn technical_details_view(&self) -> TechnicalDetailsView {
        TechnicalDetailsView {
            nodes: self.nodes_with_technical_details().into_iter().cloned().collect(),
            technical_items_count: self.technical_items_count(),
        }
    }
}

impl AsRef<DiagramData> for Diagram {
    fn as_ref(&self) -> &DiagramData {
        &self.data
    }
}

/// Fields for a diagram about to be stored.
#[derive(Debug, Clone)]
pub struct NewDiagram {
    pub title: String,
    pub description: Option<String>,
    pub data: DiagramData,
    pub tags: Vec<String>,
    pub created_by: Uuid,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DiagramPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub data: Option<DiagramData>,
    pub tags: Option<Vec<String>>,
}

impl DiagramPatch {
    pub fn touches_data(&self) -> bool {
        self.data.is_some()
    }

    /// Apply to a stored diagram; the version moves only when `data` is replaced.
    pub fn apply(self, diagram: &mut Diagram, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            diagram.title = title;
        }
        if let Some(description) = self.description {
            diagram.description = description;
        }
        if let Some(tags) = self.tags {
            diagram.tags = tags;
        }
        if let Some(data) = self.data {
            diagram.data = data;
            diagram.version += 1;
        }
        diagram.updated_at = now;
    }
}

/// Listing filter. The default lists active diagrams of every owner.
#[derive(Debug, Clone)]
pub struct DiagramFilter {
    pub active_only: bool,
    /// Case-insensitive substring over title and description
    pub search: Option<String>,
    /// Diagram must carry every listed tag
    pub tags: Vec<String>,
    pub owner: Option<Uuid>,
    /// Technical-detail name query
    pub technical: Option<String>,
}

impl Default for DiagramFilter {
    fn default() -> Self {
        Self {
            active_only: true,
            search: None,
            tags: Vec::new(),
            owner: None,
            technical: None,
        }
    }
}

impl DiagramFilter {
    /// Title/description/tag/owner predicate; the technical query is evaluated separately.
    pub fn matches_metadata(&self, diagram: &Diagram) -> bool {
        if self.active_only && !diagram.is_active {
            return false;
        }
        if let Some(owner) = self.owner {
            if diagram.created_by != owner {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = diagram.title.to_lowercase().contains(&needle);
            let in_description = diagram
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        self.tags.iter().all(|tag| diagram.tags.contains(tag))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDiagramRequest {
    pub title: String,
    pub description: Option<String>,
    /// Must contain `nodes` and `connections` arrays (either may be null)
    #[schema(value_type = Object)]
    pub data: Value,
    pub tags: Option<Vec<String>>,
}

impl CreateDiagramRequest {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        Validator::new(body)
            .required_string("title", TITLE_MAX)
            .nullable_string("description", DESCRIPTION_MAX)
            .required_object("data")
            .nullable_array("data.nodes")
            .nullable_array("data.connections")
            .nullable_string_array("tags", TAG_MAX)
            .finish()?;

        Ok(Self {
            title: string_at(body, "title").unwrap_or_default(),
            description: nullable_string_at(body, "description").flatten(),
            data: body.get("data").cloned().unwrap_or(Value::Null),
            tags: string_list_at(body, "tags"),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDiagramRequest {
    pub title: Option<String>,
    /// Send `null` to clear
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    pub tags: Option<Vec<String>>,
    /// Reject the update with 409 when the stored version differs
    pub expected_version: Option<i32>,
}

impl UpdateDiagramRequest {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let mut validator = Validator::new(body);
        validator
            .sometimes_string("title", TITLE_MAX)
            .nullable_string("description", DESCRIPTION_MAX)
            .sometimes_object("data")
            .nullable_array("data.nodes")
            .nullable_array("data.connections")
            .nullable_string_array("tags", TAG_MAX);

        let expected_version = match body.get("expected_version") {
            None | Some(Value::Null) => None,
            Some(value) => match value.as_i64().and_then(|v| i32::try_from(v).ok()) {
                Some(v) if v >= 1 => Some(v),
                _ => {
                    let mut errors = validator.finish().err().unwrap_or_default();
                    errors.add(
                        "expected_version",
                        "The expected_version field must be a positive integer.",
                    );
                    return Err(errors);
                }
            },
        };
        validator.finish()?;

        Ok(Self {
            title: string_at(body, "title"),
            description: nullable_string_at(body, "description"),
            data: body.get("data").cloned(),
            tags: string_list_at(body, "tags"),
            expected_version,
        })
    }
}

/// Aggregated technical view returned by `/diagrams/{id}/technical-details`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TechnicalDetailsView {
    #[schema(value_type = Vec<Object>)]
    pub nodes: Vec<Node>,
    pub technical_items_count: usize,
}
