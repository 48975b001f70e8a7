//! Pointer-driven editing of the graph.
//!
//! [`Editor`] owns the [`GraphModel`] together with the selection and the
//! current [`Interaction`]. Pointer events are resolved into a small state
//! machine:
//!
//! ```text
//! Idle --down on node--> Dragging{Pending} --move > 5px--> Dragging{Drag}
//!   ^                         |                                |
//!   +---------- up / release -+--------------------------------+
//! Idle --start_connection--> Connecting --click node / cancel--> Idle
//! ```
//!
//! A press that never travels past [`DRAG_THRESHOLD`] is a click and leaves
//! the node where it was; once past the threshold, on a move or at release,
//! it is a drag for the rest of the gesture. A drag while connecting picks
//! no target.

use log::{debug, warn};

use super::error::{CanvasError, ElementKind, Result};
use super::geometry::Point;
use super::model::GraphModel;
use super::notice::Notice;
use super::types::{LinkKind, LinkedRecord, Node, NodeKind};

/// Pointer travel, in pixels, that turns a press into a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;
/// New threats land this far right of the selected node.
const THREAT_OFFSET_X: f64 = 150.0;
const TRUST_BOUNDARY_ORIGIN: Point = Point::new(200.0, 200.0);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	None,
	Node(String),
	Link(String),
}

/// Sub-state of a held pointer on a node, in either mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Press {
	/// Not yet past the threshold; still a click.
	Pending { origin: Point },
	Drag,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Interaction {
	#[default]
	Idle,
	Dragging {
		node: String,
		/// Pointer position minus node position at press time.
		anchor: Point,
		press: Press,
	},
	Connecting {
		source: String,
		/// Node pressed while connecting and how far that press has gone.
		pick: Option<(String, Press)>,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
	Idle,
	Dragging,
	Connecting,
}

/// What lies under the pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hit {
	Node(String),
	Link(String),
	Background,
}

#[derive(Clone, Debug, Default)]
pub struct Editor {
	graph: GraphModel,
	selection: Selection,
	interaction: Interaction,
	revision: u64,
	edits: u64,
}

impl Editor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_graph(graph: GraphModel) -> Self {
		Self {
			graph,
			..Self::default()
		}
	}

	pub fn graph(&self) -> &GraphModel {
		&self.graph
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn interaction(&self) -> &Interaction {
		&self.interaction
	}

	pub fn mode(&self) -> Mode {
		match self.interaction {
			Interaction::Idle => Mode::Idle,
			Interaction::Dragging { .. } => Mode::Dragging,
			Interaction::Connecting { .. } => Mode::Connecting,
		}
	}

	/// Bumped on every visible change (graph, selection or mode).
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// Bumped only when the graph content changes or is replaced.
	pub fn edits(&self) -> u64 {
		self.edits
	}

	pub fn connection_source(&self) -> Option<&str> {
		match &self.interaction {
			Interaction::Connecting { source, .. } => Some(source),
			_ => None,
		}
	}

	pub fn selected_node(&self) -> Option<&Node> {
		match &self.selection {
			Selection::Node(id) => self.graph.node(id),
			_ => None,
		}
	}

	fn touch(&mut self) {
		self.revision += 1;
	}

	fn edited(&mut self) {
		self.edits += 1;
		self.touch();
	}

	fn select(&mut self, selection: Selection) {
		if self.selection != selection {
			self.selection = selection;
			self.touch();
		}
	}

	fn set_interaction(&mut self, interaction: Interaction) {
		if self.interaction != interaction {
			self.interaction = interaction;
			self.touch();
		}
	}

	pub fn select_node(&mut self, id: &str) {
		if self.graph.node(id).is_some() {
			self.select(Selection::Node(id.to_string()));
		}
	}

	pub fn select_link(&mut self, id: &str) {
		if self.graph.link(id).is_some() {
			self.select(Selection::Link(id.to_string()));
		}
	}

	pub fn clear_selection(&mut self) {
		self.select(Selection::None);
	}

	/// Resolves a canvas point to the element under it. Nodes sit above
	/// links; links are ignored while connecting so that only node clicks
	/// and background clicks are meaningful.
	pub fn hit_test(&self, p: Point) -> Hit {
		if let Some(node) = self.graph.node_at(p) {
			return Hit::Node(node.id.clone());
		}
		if self.mode() != Mode::Connecting {
			if let Some(link) = self.graph.link_at(p) {
				return Hit::Link(link.id.clone());
			}
		}
		Hit::Background
	}

	pub fn pointer_down(&mut self, hit: Hit, at: Point) -> Option<Notice> {
		if let Interaction::Dragging { .. } = self.interaction {
			// The matching up was lost; finish the stale gesture first.
			self.pointer_released();
		}

		if let Interaction::Connecting { source, .. } = &self.interaction {
			return match hit {
				Hit::Node(id) => {
					let source = source.clone();
					self.set_interaction(Interaction::Connecting {
						source,
						pick: Some((id, Press::Pending { origin: at })),
					});
					None
				}
				Hit::Link(_) | Hit::Background => {
					self.clear_selection();
					self.cancel_connection()
				}
			};
		}

		match hit {
			Hit::Node(id) => {
				let Some(node) = self.graph.node(&id) else {
					return None;
				};
				let anchor = Point::new(at.x - node.position.x, at.y - node.position.y);
				self.select(Selection::Node(id.clone()));
				self.set_interaction(Interaction::Dragging {
					node: id,
					anchor,
					press: Press::Pending { origin: at },
				});
			}
			Hit::Link(id) => self.select(Selection::Link(id)),
			Hit::Background => self.clear_selection(),
		}
		None
	}

	pub fn pointer_move(&mut self, at: Point) {
		match &self.interaction {
			Interaction::Dragging {
				node,
				anchor,
				press,
			} => {
				let (node, anchor) = (node.clone(), *anchor);
				if let Press::Pending { origin } = *press {
					if origin.distance(at) <= DRAG_THRESHOLD {
						return;
					}
					debug!("drag started on {node}");
					self.interaction = Interaction::Dragging {
						node: node.clone(),
						anchor,
						press: Press::Drag,
					};
					self.touch();
				}
				self.move_dragged(&node, anchor, at);
			}
			Interaction::Connecting {
				source,
				pick: Some((target, Press::Pending { origin })),
			} if origin.distance(at) > DRAG_THRESHOLD => {
				debug!("press on {target} became a drag, not a connection pick");
				let (source, target) = (source.clone(), target.clone());
				self.set_interaction(Interaction::Connecting {
					source,
					pick: Some((target, Press::Drag)),
				});
			}
			_ => {}
		}
	}

	fn move_dragged(&mut self, node: &str, anchor: Point, at: Point) {
		let position = Point::new(at.x - anchor.x, at.y - anchor.y);
		match self.graph.update_node_position(node, position) {
			Ok(()) => self.edited(),
			Err(err) => {
				warn!("dropping drag: {err}");
				self.set_interaction(Interaction::Idle);
			}
		}
	}

	pub fn pointer_up(&mut self, at: Point) -> Option<Notice> {
		match &self.interaction {
			Interaction::Dragging {
				press: Press::Drag,
				node,
				..
			} => {
				debug!("drag ended on {node}");
				self.set_interaction(Interaction::Idle);
				None
			}
			Interaction::Dragging {
				press: Press::Pending { origin },
				node,
				anchor,
			} => {
				let (node, anchor) = (node.clone(), *anchor);
				if origin.distance(at) > DRAG_THRESHOLD {
					// Moved past the threshold with no move event in between.
					debug!("drag on {node} resolved at release");
					self.move_dragged(&node, anchor, at);
				} else {
					self.select(Selection::Node(node));
				}
				self.set_interaction(Interaction::Idle);
				None
			}
			Interaction::Connecting {
				source,
				pick: Some((target, press)),
			} => {
				let (source, target, press) = (source.clone(), target.clone(), *press);
				match press {
					Press::Pending { origin } if origin.distance(at) <= DRAG_THRESHOLD => {
						Some(self.complete_connection(&source, &target))
					}
					_ => {
						self.set_interaction(Interaction::Connecting { source, pick: None });
						None
					}
				}
			}
			_ => None,
		}
	}

	/// Pointer released or lost anywhere in the window, possibly outside
	/// the canvas. Ends any drag so the machine cannot stay stuck.
	pub fn pointer_released(&mut self) {
		match &self.interaction {
			Interaction::Dragging { node, .. } => {
				debug!("drag on {node} released outside canvas");
				self.set_interaction(Interaction::Idle);
			}
			Interaction::Connecting {
				source,
				pick: Some(_),
			} => {
				let source = source.clone();
				self.set_interaction(Interaction::Connecting { source, pick: None });
			}
			_ => {}
		}
	}

	pub fn start_connection(&mut self) -> Option<Notice> {
		if self.mode() != Mode::Idle {
			return None;
		}
		let Selection::Node(source) = &self.selection else {
			return Some(Notice::error("Please select a node first"));
		};
		debug!("connection mode from {source}");
		let source = source.clone();
		self.set_interaction(Interaction::Connecting { source, pick: None });
		Some(Notice::info("Click on another node to create a connection"))
	}

	pub fn cancel_connection(&mut self) -> Option<Notice> {
		if self.mode() != Mode::Connecting {
			return None;
		}
		debug!("connection mode cancelled");
		self.set_interaction(Interaction::Idle);
		Some(Notice::info("Connection cancelled"))
	}

	fn complete_connection(&mut self, source: &str, target: &str) -> Notice {
		self.set_interaction(Interaction::Idle);
		match self.graph.add_link(source, target, LinkKind::DataFlow) {
			Ok(id) => {
				debug!("connection {id} created {source} -> {target}");
				self.edited();
				self.select(Selection::Node(target.to_string()));
				Notice::success("Connection created")
			}
			Err(err) => {
				warn!("connection {source} -> {target} rejected: {err}");
				Notice::from(&err)
			}
		}
	}

	pub fn add_asset(&mut self, record: Option<LinkedRecord>) -> String {
		let position = self
			.graph
			.find_overlap_free_position(NodeKind::Asset.default_size());
		let label = record
			.as_ref()
			.and_then(LinkedRecord::title)
			.unwrap_or("New Asset")
			.to_string();
		let id = self.graph.add_node(NodeKind::Asset, position, label, record);
		self.edited();
		self.select(Selection::Node(id.clone()));
		id
	}

	pub fn add_threat(&mut self) -> String {
		let position = match self.selected_node() {
			Some(anchor) => Point::new(anchor.position.x + THREAT_OFFSET_X, anchor.position.y),
			None => self
				.graph
				.find_overlap_free_position(NodeKind::Threat.default_size()),
		};
		let id = self
			.graph
			.add_node(NodeKind::Threat, position, "New Threat", None);
		self.edited();
		id
	}

	pub fn add_trust_boundary(&mut self) -> String {
		let id = self.graph.add_node(
			NodeKind::TrustBoundary,
			TRUST_BOUNDARY_ORIGIN,
			"Trust Boundary",
			None,
		);
		self.edited();
		id
	}

	/// Deletes a node and its links, then repairs selection and mode.
	pub fn remove_node(&mut self, id: &str) -> Result<()> {
		let removed = self.graph.remove_node(id)?;
		debug!(
			"removed {} with {} connection(s)",
			removed.node.label,
			removed.links.len()
		);
		self.edited();

		let selection_gone = match &self.selection {
			Selection::Node(sel) => sel == id,
			Selection::Link(sel) => removed.links.iter().any(|l| &l.id == sel),
			Selection::None => false,
		};
		if selection_gone {
			self.clear_selection();
		}

		match &self.interaction {
			Interaction::Connecting { source, .. } if source == id => {
				debug!("connection source {id} deleted, leaving connection mode");
				self.set_interaction(Interaction::Idle);
			}
			Interaction::Connecting {
				source,
				pick: Some((picked, _)),
			} if picked == id => {
				let source = source.clone();
				self.set_interaction(Interaction::Connecting { source, pick: None });
			}
			Interaction::Dragging { node, .. } if node == id => {
				self.set_interaction(Interaction::Idle);
			}
			_ => {}
		}
		Ok(())
	}

	pub fn remove_link(&mut self, id: &str) -> Result<()> {
		self.graph.remove_link(id)?;
		self.edited();
		if matches!(&self.selection, Selection::Link(sel) if sel == id) {
			self.clear_selection();
		}
		Ok(())
	}

	pub fn delete_selection(&mut self) -> Option<Notice> {
		let result = match self.selection.clone() {
			Selection::Node(id) => self.remove_node(&id).map(|()| Notice::success("Node deleted")),
			Selection::Link(id) => self
				.remove_link(&id)
				.map(|()| Notice::success("Connection deleted")),
			Selection::None => return None,
		};
		Some(result.unwrap_or_else(Notice::from))
	}

	pub fn rename_node(&mut self, id: &str, label: &str) -> Result<()> {
		let label = label.trim();
		if label.is_empty() {
			return Err(CanvasError::Validation("Node label cannot be empty".into()));
		}
		self.graph.update_node_label(id, label)?;
		self.edited();
		Ok(())
	}

	pub fn link_record(&mut self, id: &str, record: LinkedRecord) -> Result<()> {
		self.graph.bind_record(id, record)?;
		self.edited();
		Ok(())
	}

	pub fn set_link_kind(&mut self, id: &str, kind: LinkKind) -> Result<()> {
		self.graph.update_link_kind(id, kind)?;
		self.edited();
		Ok(())
	}

	pub fn toggle_link_kind(&mut self, id: &str) -> Result<LinkKind> {
		let kind = self
			.graph
			.link(id)
			.map(|l| l.kind.toggled())
			.ok_or_else(|| CanvasError::not_found(ElementKind::Link, id))?;
		self.set_link_kind(id, kind)?;
		Ok(kind)
	}

	/// Swaps in a whole new graph, as on load or when starting over.
	pub fn replace_graph(&mut self, graph: GraphModel) {
		self.graph = graph;
		self.selection = Selection::None;
		self.interaction = Interaction::Idle;
		self.edited();
	}
}
