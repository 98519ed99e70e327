//! Typed view over the schemaless diagram `data` payload.
//!
//! The store keeps `data` as an opaque JSON document. These types give the
//! aggregator structured access to the parts it cares about while keeping
//! every other key in `extra` so the document round-trips verbatim.
//!
//! Only the outer shape is enforced: the root must be an object and
//! `nodes`/`connections` must be arrays. Anything below that which does not
//! have the expected shape is kept as [`Lenient::Raw`] and reads as empty,
//! so one odd node never makes a whole document unreadable. The accessor
//! methods turn absent and raw values into empty slices so callers never
//! branch on presence.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};

use super::AggregateError;

static EMPTY_DETAILS: Lazy<TechnicalDetails> = Lazy::new(TechnicalDetails::default);

/// A value of the expected shape, or the JSON it was read from.
///
/// `Raw` values are written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Parsed(T),
    Raw(Value),
}

impl<T> Lenient<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            Lenient::Parsed(value) => Some(value),
            Lenient::Raw(_) => None,
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Parsed(value)
    }
}

fn list_or_empty<T>(list: &Option<Lenient<Vec<T>>>) -> &[T] {
    list.as_ref()
        .and_then(Lenient::parsed)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Structured diagram payload (`diagram.data`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<Connection>>,
    /// Viewport, metadata and any other top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DiagramData {
    /// Parse an opaque JSON document into typed diagram data.
    pub fn from_value(value: &Value) -> Result<Self, AggregateError> {
        Self::deserialize(value).map_err(|e| AggregateError::MalformedDocument(e.to_string()))
    }

    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: Some(nodes),
            ..Self::default()
        }
    }

    /// Nodes, empty when the document has none.
    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or(&[])
    }

    /// Connections, empty when the document has none.
    pub fn connections(&self) -> &[Connection] {
        self.connections.as_deref().unwrap_or(&[])
    }
}

impl AsRef<DiagramData> for DiagramData {
    fn as_ref(&self) -> &DiagramData {
        self
    }
}

/// Node identifier as the editor emits it: a string or a number, anything
/// else kept as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Text(String),
    Number(Number),
    Other(Value),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Text(s) => f.write_str(s),
            NodeId::Number(n) => write!(f, "{}", n),
            NodeId::Other(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct NodeFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Lenient<TechnicalDetails>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// A vertex in `data.nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Lenient<NodeFields>", into = "Lenient<NodeFields>")]
pub struct Node {
    pub id: Option<NodeId>,
    /// Display label; read through [`Node::label`].
    pub label: Option<Value>,
    /// Read through [`Node::details`].
    pub details: Option<Lenient<TechnicalDetails>>,
    pub extra: Map<String, Value>,
    /// The entry as stored when it is not a JSON object.
    raw: Option<Value>,
}

impl From<Lenient<NodeFields>> for Node {
    fn from(entry: Lenient<NodeFields>) -> Self {
        match entry {
            Lenient::Parsed(fields) => Node {
                id: fields.id,
                label: fields.label,
                details: fields.details,
                extra: fields.extra,
                raw: None,
            },
            Lenient::Raw(value) => Node {
                raw: Some(value),
                ..Node::default()
            },
        }
    }
}

impl From<Node> for Lenient<NodeFields> {
    fn from(node: Node) -> Self {
        match node.raw {
            Some(value) => Lenient::Raw(value),
            None => Lenient::Parsed(NodeFields {
                id: node.id,
                label: node.label,
                details: node.details,
                extra: node.extra,
            }),
        }
    }
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Some(NodeId::Text(id.into())),
            label: Some(Value::String(label.into())),
            ..Self::default()
        }
    }

    pub fn with_details(mut self, details: TechnicalDetails) -> Self {
        self.details = Some(details.into());
        self
    }

    /// The label when it is a JSON string.
    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().and_then(Value::as_str)
    }

    /// Technical details; empty when absent or not an object.
    pub fn details(&self) -> &TechnicalDetails {
        self.details
            .as_ref()
            .and_then(Lenient::parsed)
            .unwrap_or(&*EMPTY_DETAILS)
    }

    pub fn variables(&self) -> &[DetailItem] {
        self.details().variables()
    }

    pub fn parameters(&self) -> &[DetailItem] {
        self.details().parameters()
    }

    pub fn arguments(&self) -> &[DetailItem] {
        self.details().arguments()
    }

    pub fn payloads(&self) -> &[PayloadItem] {
        self.details().payloads()
    }
}

/// Optional technical annotations of a node (`node.details`).
///
/// A category that is not an array reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Lenient<Vec<DetailItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Lenient<Vec<DetailItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Lenient<Vec<DetailItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payloads: Option<Lenient<Vec<PayloadItem>>>,
    /// Description, tags and other free-form keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TechnicalDetails {
    pub fn variables(&self) -> &[DetailItem] {
        list_or_empty(&self.variables)
    }

    pub fn parameters(&self) -> &[DetailItem] {
        list_or_empty(&self.parameters)
    }

    pub fn arguments(&self) -> &[DetailItem] {
        list_or_empty(&self.arguments)
    }

    pub fn payloads(&self) -> &[PayloadItem] {
        list_or_empty(&self.payloads)
    }

    /// Named items that take part in technical-detail search.
    pub fn named_items(&self) -> impl Iterator<Item = &DetailItem> {
        self.variables()
            .iter()
            .chain(self.parameters())
            .chain(self.arguments())
    }
}

/// A variable, parameter or argument entry. Any JSON value is accepted;
/// only an object with a string `name` has a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailItem(Value);

impl DetailItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self(json!({ "name": name.into() }))
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }
}

/// Flow direction of a payload item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadDirection {
    Incoming,
    Outgoing,
    /// Absent, non-string, or any other value.
    Other,
}

/// A payload entry (`details.payloads[*]`). Any JSON value is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadItem(Value);

impl PayloadItem {
    pub fn with_direction(direction: impl Into<String>) -> Self {
        Self(json!({ "direction": direction.into() }))
    }

    /// Matches `"incoming"` / `"outgoing"` exactly; everything else is `Other`.
    pub fn direction(&self) -> PayloadDirection {
        match self.0.get("direction").and_then(Value::as_str) {
            Some("incoming") => PayloadDirection::Incoming,
            Some("outgoing") => PayloadDirection::Outgoing,
            _ => PayloadDirection::Other,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ConnectionFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<NodeId>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// An edge in `data.connections`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Lenient<ConnectionFields>", into = "Lenient<ConnectionFields>")]
pub struct Connection {
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
    pub extra: Map<String, Value>,
    raw: Option<Value>,
}

impl From<Lenient<ConnectionFields>> for Connection {
    fn from(entry: Lenient<ConnectionFields>) -> Self {
        match entry {
            Lenient::Parsed(fields) => Connection {
                from: fields.from,
                to: fields.to,
                extra: fields.extra,
                raw: None,
            },
            Lenient::Raw(value) => Connection {
                raw: Some(value),
                ..Connection::default()
            },
        }
    }
}

impl From<Connection> for Lenient<ConnectionFields> {
    fn from(connection: Connection) -> Self {
        match connection.raw {
            Some(value) => Lenient::Raw(value),
            None => Lenient::Parsed(ConnectionFields {
                from: connection.from,
                to: connection.to,
                extra: connection.extra,
            }),
        }
    }
}
