use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::geometry::{Point, Rect, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
	Asset,
	Threat,
	TrustBoundary,
}

impl NodeKind {
	pub const fn default_size(self) -> Size {
		match self {
			NodeKind::Asset | NodeKind::Threat => Size::new(120.0, 80.0),
			NodeKind::TrustBoundary => Size::new(300.0, 200.0),
		}
	}

	/// Stroke and SVG fill color.
	pub const fn color(self) -> &'static str {
		match self {
			NodeKind::Asset => "#3b82f6",
			NodeKind::Threat => "#ef4444",
			NodeKind::TrustBoundary => "#f59e0b",
		}
	}

	/// Translucent canvas fill.
	pub const fn tint(self) -> &'static str {
		match self {
			NodeKind::Asset => "rgba(59, 130, 246, 0.2)",
			NodeKind::Threat => "rgba(239, 68, 68, 0.2)",
			NodeKind::TrustBoundary => "rgba(245, 158, 11, 0.12)",
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			NodeKind::Asset => "asset",
			NodeKind::Threat => "threat",
			NodeKind::TrustBoundary => "trust-boundary",
		}
	}

	/// Only inventory-backed kinds may carry a [`LinkedRecord`].
	pub const fn accepts_record(self) -> bool {
		matches!(self, NodeKind::Asset | NodeKind::Threat)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
	#[default]
	DataFlow,
	Dependency,
}

impl LinkKind {
	pub const fn label(self) -> &'static str {
		match self {
			LinkKind::DataFlow => "Data Flow",
			LinkKind::Dependency => "Dependency",
		}
	}

	pub const fn color(self) -> &'static str {
		match self {
			LinkKind::DataFlow => "#6b7280",
			LinkKind::Dependency => "#8b5cf6",
		}
	}

	pub const fn toggled(self) -> Self {
		match self {
			LinkKind::DataFlow => LinkKind::Dependency,
			LinkKind::Dependency => LinkKind::DataFlow,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
	Asset,
	Threat,
}

/// Reference from a node to a real inventory entity, with a cached copy of
/// the entity as it was when bound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkedRecord {
	pub id: String,
	pub kind: RecordKind,
	pub snapshot: Value,
}

impl LinkedRecord {
	pub fn asset(id: impl Into<String>, snapshot: Value) -> Self {
		Self {
			id: id.into(),
			kind: RecordKind::Asset,
			snapshot,
		}
	}

	pub fn threat(id: impl Into<String>, snapshot: Value) -> Self {
		Self {
			id: id.into(),
			kind: RecordKind::Threat,
			snapshot,
		}
	}

	/// Display title cached in the snapshot (`name` for assets, `title` for threats).
	pub fn title(&self) -> Option<&str> {
		["name", "title"]
			.iter()
			.find_map(|key| self.snapshot.get(key).and_then(Value::as_str))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub kind: NodeKind,
	pub position: Point,
	pub size: Size,
	pub label: String,
	pub linked_record: Option<LinkedRecord>,
	/// Opaque `data` carried by loaded documents that is not a linked record.
	pub extra: Option<Value>,
}

impl Node {
	pub fn rect(&self) -> Rect {
		Rect::new(self.position, self.size)
	}

	pub fn center(&self) -> Point {
		self.rect().center()
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	pub id: String,
	pub source: String,
	pub target: String,
	pub kind: LinkKind,
}

impl Link {
	pub fn touches(&self, node_id: &str) -> bool {
		self.source == node_id || self.target == node_id
	}

	/// Same endpoints regardless of direction.
	pub fn joins(&self, a: &str, b: &str) -> bool {
		(self.source == a && self.target == b) || (self.source == b && self.target == a)
	}
}

/// A diagram as exchanged with persistence and export: metadata plus the
/// node and link sets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagram {
	/// Assigned by the store on first save.
	pub id: Option<String>,
	pub name: String,
	pub description: String,
	pub threat_id: Option<String>,
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
}

impl Diagram {
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Links whose endpoints both resolve, paired with those endpoints.
	pub fn resolved_links(&self) -> impl Iterator<Item = (&Link, &Node, &Node)> {
		self.links.iter().filter_map(|link| {
			Some((link, self.node(&link.source)?, self.node(&link.target)?))
		})
	}
}
