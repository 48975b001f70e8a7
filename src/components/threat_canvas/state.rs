use log::{debug, warn};

use super::geometry::{Point, Size};
use super::interaction::{Editor, Mode, Selection};
use super::model::GraphModel;
use super::types::{Diagram, LinkKind, LinkedRecord, NodeKind, RecordKind};

/// Room left below and right of the furthest node.
pub const CONTENT_PADDING: f64 = 40.0;
/// Inventory assets laid out on an empty canvas when it opens.
pub const SEED_LIMIT: usize = 5;
const SEED_COLUMNS: usize = 3;
const SEED_STEP: (f64, f64) = (200.0, 150.0);
const SEED_ORIGIN: Point = Point::new(100.0, 100.0);

/// Metadata of the diagram being edited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentInfo {
	pub id: Option<String>,
	pub name: String,
	pub description: String,
	pub threat_id: Option<String>,
}

/// Issued when a load starts; the response is applied only if it is still
/// the latest load and the graph was not edited in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
	seq: u64,
	edits: u64,
}

/// Issued when a save starts; a new id is adopted only if the same
/// document is still open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SaveTicket {
	epoch: u64,
}

/// Node facts the toolbar and dialogs need.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSummary {
	pub id: String,
	pub label: String,
	pub kind: NodeKind,
}

/// Plain snapshot of the canvas for reactive UI outside the drawing surface.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasStatus {
	pub mode: Mode,
	pub selected_node: Option<NodeSummary>,
	pub selected_link: Option<(String, LinkKind)>,
	pub connection_source: Option<String>,
	pub document: DocumentInfo,
	pub nodes: usize,
	pub links: usize,
}

impl Default for CanvasStatus {
	fn default() -> Self {
		Self {
			mode: Mode::Idle,
			selected_node: None,
			selected_link: None,
			connection_source: None,
			document: DocumentInfo::default(),
			nodes: 0,
			links: 0,
		}
	}
}

pub struct CanvasState {
	pub editor: Editor,
	pub document: DocumentInfo,
	pub width: f64,
	pub height: f64,
	epoch: u64,
	latest_load: u64,
	drawn: Option<(u64, Size)>,
}

impl CanvasState {
	pub fn new(threat_id: Option<String>, width: f64, height: f64) -> Self {
		Self {
			editor: Editor::new(),
			document: DocumentInfo {
				threat_id,
				..DocumentInfo::default()
			},
			width,
			height,
			epoch: 0,
			latest_load: 0,
			drawn: None,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Drawing size: the viewport, grown to fit every node.
	pub fn canvas_size(&self) -> Size {
		let content = self.editor.graph().content_size();
		Size::new(
			self.width.max(content.width + CONTENT_PADDING),
			self.height.max(content.height + CONTENT_PADDING),
		)
	}

	pub fn needs_redraw(&self) -> bool {
		self.drawn != Some((self.editor.revision(), self.canvas_size()))
	}

	pub fn mark_drawn(&mut self) {
		self.drawn = Some((self.editor.revision(), self.canvas_size()));
	}

	/// Current graph and metadata as a standalone diagram.
	pub fn diagram(&self) -> Diagram {
		let graph = self.editor.graph();
		Diagram {
			id: self.document.id.clone(),
			name: self.document.name.clone(),
			description: self.document.description.clone(),
			threat_id: self.document.threat_id.clone(),
			nodes: graph.nodes().to_vec(),
			links: graph.links().to_vec(),
		}
	}

	/// Starts over with an empty, unsaved diagram.
	pub fn new_diagram(&mut self) {
		self.epoch += 1;
		self.latest_load += 1;
		self.document = DocumentInfo {
			threat_id: self.document.threat_id.take(),
			..DocumentInfo::default()
		};
		self.editor.replace_graph(GraphModel::new());
	}

	pub fn begin_load(&mut self) -> LoadTicket {
		self.latest_load += 1;
		LoadTicket {
			seq: self.latest_load,
			edits: self.editor.edits(),
		}
	}

	/// Replaces the whole graph with `diagram` unless the response is stale.
	pub fn finish_load(&mut self, ticket: LoadTicket, diagram: Diagram) -> bool {
		if ticket.seq != self.latest_load || ticket.edits != self.editor.edits() {
			warn!(
				"discarding stale load of {}",
				diagram.id.as_deref().unwrap_or("unsaved diagram")
			);
			return false;
		}
		self.epoch += 1;
		self.document = DocumentInfo {
			id: diagram.id,
			name: diagram.name,
			description: diagram.description,
			threat_id: diagram.threat_id.or_else(|| self.document.threat_id.take()),
		};
		self.editor
			.replace_graph(GraphModel::from_parts(diagram.nodes, diagram.links));
		true
	}

	pub fn begin_save(&self) -> SaveTicket {
		SaveTicket { epoch: self.epoch }
	}

	/// Adopts the id and metadata of a completed save when the same document
	/// is still open.
	pub fn finish_save(&mut self, ticket: SaveTicket, saved: &Diagram) -> bool {
		if ticket.epoch != self.epoch {
			warn!("save finished after the diagram was replaced; not adopting its id");
			return false;
		}
		self.document.id = saved.id.clone();
		self.document.name = saved.name.trim().to_string();
		self.document.description = saved.description.trim().to_string();
		true
	}

	/// Forgets the id of a diagram deleted from the store so the next save
	/// creates a fresh record.
	pub fn forget_deleted(&mut self, id: &str) {
		if self.document.id.as_deref() == Some(id) {
			debug!("open diagram {id} was deleted");
			self.document.id = None;
			self.epoch += 1;
		}
	}

	/// Lays the first inventory assets out in rows of three when the canvas
	/// is still empty. Returns how many nodes were placed.
	pub fn seed_from_inventory(&mut self, inventory: &[LinkedRecord]) -> usize {
		if !self.editor.graph().nodes().is_empty() {
			return 0;
		}
		let mut graph = GraphModel::new();
		let assets = inventory.iter().filter(|r| r.kind == RecordKind::Asset);
		for (i, record) in assets.take(SEED_LIMIT).enumerate() {
			let position = Point::new(
				SEED_ORIGIN.x + (i % SEED_COLUMNS) as f64 * SEED_STEP.0,
				SEED_ORIGIN.y + (i / SEED_COLUMNS) as f64 * SEED_STEP.1,
			);
			let label = record.title().unwrap_or("New Asset").to_string();
			graph.add_node(NodeKind::Asset, position, label, Some(record.clone()));
		}
		let seeded = graph.nodes().len();
		if seeded > 0 {
			debug!("seeded canvas with {seeded} inventory asset(s)");
			self.editor.replace_graph(graph);
		}
		seeded
	}

	/// First inventory asset not already placed on the canvas.
	pub fn next_inventory_asset(&self, inventory: &[LinkedRecord]) -> Option<LinkedRecord> {
		let placed = |id: &str| {
			self.editor.graph().nodes().iter().any(|n| {
				n.linked_record
					.as_ref()
					.is_some_and(|r| r.kind == RecordKind::Asset && r.id == id)
			})
		};
		inventory
			.iter()
			.find(|r| r.kind == RecordKind::Asset && !placed(&r.id))
			.cloned()
	}

	pub fn status(&self) -> CanvasStatus {
		let graph = self.editor.graph();
		let (selected_node, selected_link) = match self.editor.selection() {
			Selection::Node(id) => (
				graph.node(id).map(|n| NodeSummary {
					id: n.id.clone(),
					label: n.label.clone(),
					kind: n.kind,
				}),
				None,
			),
			Selection::Link(id) => (None, graph.link(id).map(|l| (l.id.clone(), l.kind))),
			Selection::None => (None, None),
		};
		CanvasStatus {
			mode: self.editor.mode(),
			selected_node,
			selected_link,
			connection_source: self
				.editor
				.connection_source()
				.and_then(|id| graph.node(id))
				.map(|n| n.label.clone()),
			document: self.document.clone(),
			nodes: graph.nodes().len(),
			links: graph.links().len(),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn loaded(id: &str) -> Diagram {
		let mut graph = GraphModel::new();
		graph.add_node(NodeKind::Asset, Point::new(0.0, 0.0), "loaded", None);
		Diagram {
			id: Some(id.into()),
			name: "Loaded".into(),
			nodes: graph.nodes().to_vec(),
			..Diagram::default()
		}
	}

	#[test]
	fn load_replaces_graph_and_metadata() {
		let mut state = CanvasState::new(None, 800.0, 600.0);
		state.editor.add_asset(None);
		state.editor.add_asset(None);
		let ticket = state.begin_load();
		assert!(state.finish_load(ticket, loaded("d-1")));
		assert_eq!(state.editor.graph().nodes().len(), 1);
		assert_eq!(state.document.id.as_deref(), Some("d-1"));
		assert_eq!(state.editor.selection(), &Selection::None);
	}

	#[test]
	fn load_is_dropped_after_local_edits() {
		let mut state = CanvasState::new(None, 800.0, 600.0);
		let ticket = state.begin_load();
		state.editor.add_trust_boundary();
		assert!(!state.finish_load(ticket, loaded("d-1")));
		assert_eq!(state.editor.graph().nodes()[0].kind, NodeKind::TrustBoundary);
		assert!(state.document.id.is_none());
	}

	#[test]
	fn only_the_latest_load_applies() {
		let mut state = CanvasState::new(None, 800.0, 600.0);
		let first = state.begin_load();
		let second = state.begin_load();
		assert!(state.finish_load(second, loaded("d-2")));
		assert!(!state.finish_load(first, loaded("d-1")));
		assert_eq!(state.document.id.as_deref(), Some("d-2"));
	}

	#[test]
	fn clearing_the_canvas_invalidates_pending_work() {
		let mut state = CanvasState::new(Some("t-1".into()), 800.0, 600.0);
		let load = state.begin_load();
		let save = state.begin_save();
		state.new_diagram();
		assert!(!state.finish_load(load, loaded("d-1")));
		let saved = Diagram {
			id: Some("d-9".into()),
			..Diagram::default()
		};
		assert!(!state.finish_save(save, &saved));
		assert!(state.document.id.is_none());
		assert_eq!(state.document.threat_id.as_deref(), Some("t-1"));
	}

	#[test]
	fn save_adopts_id() {
		let mut state = CanvasState::new(None, 800.0, 600.0);
		let ticket = state.begin_save();
		let mut saved = state.diagram();
		saved.id = Some("d-3".into());
		saved.name = " PCI Flow ".into();
		assert!(state.finish_save(ticket, &saved));
		assert_eq!(state.document.id.as_deref(), Some("d-3"));
		assert_eq!(state.document.name, "PCI Flow");
		state.forget_deleted("d-3");
		assert!(state.document.id.is_none());
	}

	#[test]
	fn canvas_grows_with_content() {
		let mut state = CanvasState::new(None, 300.0, 200.0);
		assert_eq!(state.canvas_size(), Size::new(300.0, 200.0));
		state.editor.add_trust_boundary();
		assert_eq!(state.canvas_size(), Size::new(540.0, 440.0));
	}

	#[test]
	fn redraw_tracks_revisions() {
		let mut state = CanvasState::new(None, 300.0, 200.0);
		assert!(state.needs_redraw());
		state.mark_drawn();
		assert!(!state.needs_redraw());
		let id = state.editor.add_asset(None);
		assert!(state.needs_redraw());
		state.mark_drawn();
		state.editor.clear_selection();
		assert!(state.needs_redraw());
		assert!(state.status().selected_node.is_none());
		state.editor.select_node(&id);
		assert_eq!(state.status().selected_node.unwrap().label, "New Asset");
	}

	#[test]
	fn empty_canvas_is_seeded_with_five_assets() {
		let mut state = CanvasState::new(None, 800.0, 600.0);
		let mut inventory: Vec<LinkedRecord> = (1..=7)
			.map(|i| LinkedRecord::asset(format!("a-{i}"), json!({ "id": i, "name": format!("Asset {i}") })))
			.collect();
		inventory.insert(0, LinkedRecord::threat("t-1", json!({ "id": "t-1", "title": "XSS" })));

		assert_eq!(state.seed_from_inventory(&inventory), SEED_LIMIT);
		let nodes = state.editor.graph().nodes();
		assert_eq!(nodes[0].label, "Asset 1");
		assert_eq!(nodes[2].position, Point::new(500.0, 100.0));
		assert_eq!(nodes[4].position, Point::new(300.0, 250.0));
		assert!(nodes.iter().all(|n| n.kind == NodeKind::Asset));
		assert_eq!(state.next_inventory_asset(&inventory).unwrap().id, "a-6");

		assert_eq!(state.seed_from_inventory(&inventory), 0);
		assert_eq!(state.editor.graph().nodes().len(), SEED_LIMIT);
	}

	#[test]
	fn inventory_assets_are_used_once() {
		let mut state = CanvasState::new(None, 800.0, 600.0);
		let inventory = vec![
			LinkedRecord::asset("a-1", json!({ "id": "a-1", "name": "Gateway" })),
			LinkedRecord::asset("a-2", json!({ "id": "a-2", "name": "Ledger" })),
		];
		let first = state.next_inventory_asset(&inventory).unwrap();
		assert_eq!(first.id, "a-1");
		state.editor.add_asset(Some(first));
		assert_eq!(state.next_inventory_asset(&inventory).unwrap().id, "a-2");
	}
}
