//! Wire shapes for diagrams exchanged with the diagram store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{CanvasError, Result};
use super::geometry::{Point, Size};
use super::types::{Diagram, Link, LinkKind, LinkedRecord, Node, NodeKind, RecordKind};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: NodeKind,
	pub x: f64,
	pub y: f64,
	/// Absent in documents written before sizes were stored.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub width: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub height: Option<f64>,
	#[serde(default)]
	pub label: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(rename = "type", default)]
	pub kind: LinkKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
	#[serde(default)]
	pub nodes: Vec<NodeRecord>,
	#[serde(default)]
	pub links: Vec<LinkRecord>,
}

/// Body of a create or update request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub threat_id: Option<String>,
	pub canvas_data: CanvasData,
}

/// A diagram as returned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDiagram {
	pub diagram_id: String,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub threat_id: Option<String>,
	#[serde(default)]
	pub canvas_data: CanvasData,
	#[serde(default)]
	pub created_by: Option<String>,
	#[serde(default)]
	pub creator_name: Option<String>,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub updated_at: Option<DateTime<Utc>>,
}

/// Picker entry; never carries the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramSummary {
	pub diagram_id: String,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub threat_id: Option<String>,
	#[serde(default)]
	pub created_by: Option<String>,
	#[serde(default)]
	pub creator_name: Option<String>,
	#[serde(default)]
	pub created_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub updated_at: Option<DateTime<Utc>>,
}

impl From<&StoredDiagram> for DiagramSummary {
	fn from(stored: &StoredDiagram) -> Self {
		Self {
			diagram_id: stored.diagram_id.clone(),
			name: stored.name.clone(),
			description: stored.description.clone(),
			threat_id: stored.threat_id.clone(),
			created_by: stored.created_by.clone(),
			creator_name: stored.creator_name.clone(),
			created_at: stored.created_at,
			updated_at: stored.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub total: u64,
	pub page: u32,
	pub page_size: u32,
	pub total_pages: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramFilter {
	pub threat_id: Option<String>,
	pub page: u32,
	pub page_size: u32,
}

impl Default for DiagramFilter {
	fn default() -> Self {
		Self {
			threat_id: None,
			page: 1,
			page_size: 100,
		}
	}
}

impl DiagramFilter {
	pub fn for_threat(threat_id: Option<String>) -> Self {
		Self {
			threat_id,
			..Self::default()
		}
	}
}

// Asset records are stored as the asset itself; threat records as
// `{ threatId, threat }` merged into whatever else the node carried.
fn encode_data(node: &Node) -> Option<Value> {
	let Some(record) = &node.linked_record else {
		return node.extra.clone();
	};
	match record.kind {
		RecordKind::Asset => {
			let mut snapshot = match &record.snapshot {
				Value::Object(map) => map.clone(),
				_ => Map::new(),
			};
			snapshot
				.entry("id")
				.or_insert_with(|| Value::String(record.id.clone()));
			Some(Value::Object(snapshot))
		}
		RecordKind::Threat => {
			let mut data = match &node.extra {
				Some(Value::Object(map)) => map.clone(),
				_ => Map::new(),
			};
			data.insert("threatId".into(), Value::String(record.id.clone()));
			data.insert("threat".into(), record.snapshot.clone());
			Some(Value::Object(data))
		}
	}
}

fn id_string(value: &Value) -> Option<String> {
	match value {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn decode_data(kind: NodeKind, data: Option<Value>) -> (Option<LinkedRecord>, Option<Value>) {
	let Some(data) = data.filter(|v| !v.is_null()) else {
		return (None, None);
	};
	if !kind.accepts_record() {
		return (None, Some(data));
	}
	let Value::Object(mut map) = data else {
		return (None, Some(data));
	};

	if let Some(threat_id) = map.get("threatId").and_then(id_string) {
		let snapshot = map.remove("threat").unwrap_or(Value::Null);
		map.remove("threatId");
		let extra = (!map.is_empty()).then_some(Value::Object(map));
		return (Some(LinkedRecord::threat(threat_id, snapshot)), extra);
	}
	if kind == NodeKind::Asset {
		if let Some(id) = map.get("id").and_then(id_string) {
			return (Some(LinkedRecord::asset(id, Value::Object(map))), None);
		}
	}
	let extra = (!map.is_empty()).then_some(Value::Object(map));
	(None, extra)
}

impl From<&Node> for NodeRecord {
	fn from(node: &Node) -> Self {
		Self {
			id: node.id.clone(),
			kind: node.kind,
			x: node.position.x,
			y: node.position.y,
			width: Some(node.size.width),
			height: Some(node.size.height),
			label: node.label.clone(),
			data: encode_data(node),
		}
	}
}

impl From<NodeRecord> for Node {
	/// Missing or non-positive sizes fall back to the kind's default.
	fn from(record: NodeRecord) -> Self {
		let default = record.kind.default_size();
		let size = Size::new(
			record.width.filter(|w| *w > 0.0).unwrap_or(default.width),
			record.height.filter(|h| *h > 0.0).unwrap_or(default.height),
		);
		let (linked_record, extra) = decode_data(record.kind, record.data);
		Node {
			id: record.id,
			kind: record.kind,
			position: Point::new(record.x, record.y),
			size,
			label: record.label,
			linked_record,
			extra,
		}
	}
}

impl From<&Link> for LinkRecord {
	fn from(link: &Link) -> Self {
		Self {
			id: link.id.clone(),
			source: link.source.clone(),
			target: link.target.clone(),
			kind: link.kind,
		}
	}
}

impl From<LinkRecord> for Link {
	fn from(record: LinkRecord) -> Self {
		Link {
			id: record.id,
			source: record.source,
			target: record.target,
			kind: record.kind,
		}
	}
}

impl CanvasData {
	pub fn from_parts(nodes: &[Node], links: &[Link]) -> Self {
		Self {
			nodes: nodes.iter().map(NodeRecord::from).collect(),
			links: links.iter().map(LinkRecord::from).collect(),
		}
	}
}

impl DiagramDocument {
	/// Builds the request body, refusing diagrams without a name.
	pub fn from_diagram(diagram: &Diagram) -> Result<Self> {
		let name = diagram.name.trim();
		if name.is_empty() {
			return Err(CanvasError::Validation(
				"Please enter a name for the diagram".into(),
			));
		}
		let description = diagram.description.trim();
		Ok(Self {
			name: name.to_string(),
			description: (!description.is_empty()).then(|| description.to_string()),
			threat_id: diagram.threat_id.clone(),
			canvas_data: CanvasData::from_parts(&diagram.nodes, &diagram.links),
		})
	}
}

impl StoredDiagram {
	pub fn into_diagram(self) -> Diagram {
		Diagram {
			id: Some(self.diagram_id),
			name: self.name,
			description: self.description.unwrap_or_default(),
			threat_id: self.threat_id,
			nodes: self.canvas_data.nodes.into_iter().map(Node::from).collect(),
			links: self.canvas_data.links.into_iter().map(Link::from).collect(),
		}
	}
}
