use log::warn;
use uuid::Uuid;

use super::error::{CanvasError, ElementKind, LinkRejection, Result};
use super::geometry::{Point, Rect, Size, clipped_segment, distance_to_segment};
use super::types::{Link, LinkKind, LinkedRecord, Node, NodeKind};

/// Gap kept between a freshly placed node and its neighbours.
pub const PLACEMENT_MARGIN: f64 = 20.0;
pub const PLACEMENT_ATTEMPTS: usize = 50;
const PLACEMENT_ORIGIN: Point = Point::new(100.0, 100.0);
const PLACEMENT_COLUMNS: usize = 5;
const PLACEMENT_STEP_X: f64 = 150.0;
const PLACEMENT_STEP_Y: f64 = 120.0;

/// Pointer slack when picking a link line.
pub const LINK_HIT_TOLERANCE: f64 = 6.0;
/// Size of the kind label drawn at a link's midpoint.
pub const LINK_LABEL_SIZE: Size = Size::new(60.0, 20.0);

/// Nodes removed by [`GraphModel::remove_node`], with the links that went with it.
#[derive(Clone, Debug)]
pub struct RemovedNode {
	pub node: Node,
	pub links: Vec<Link>,
}

/// The diagram graph: ordered nodes (later nodes draw on top) and links.
///
/// Every mutation bumps [`GraphModel::revision`], which callers use to detect
/// edits that happened while a network request was in flight.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	nodes: Vec<Node>,
	links: Vec<Link>,
	revision: u64,
}

fn fresh_id(prefix: &str) -> String {
	format!("{prefix}-{}", Uuid::new_v4())
}

impl GraphModel {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a model from loaded parts. Repeated node ids, self-loops and
	/// repeated connections are dropped with a warning. Links whose endpoints
	/// do not resolve are kept and skipped wherever they are drawn.
	pub fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
		let mut model = Self::new();
		for node in nodes {
			if model.node(&node.id).is_some() {
				warn!("dropping loaded node with repeated id {}", node.id);
				continue;
			}
			model.nodes.push(node);
		}
		for link in links {
			if link.source == link.target {
				warn!("dropping loaded self-loop {} on {}", link.id, link.source);
			} else if model
				.links
				.iter()
				.any(|l| l.id == link.id || l.joins(&link.source, &link.target))
			{
				warn!("dropping repeated loaded connection {}", link.id);
			} else {
				model.links.push(link);
			}
		}
		model
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn links(&self) -> &[Link] {
		&self.links
	}

	pub fn revision(&self) -> u64 {
		self.revision
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.links.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn link(&self, id: &str) -> Option<&Link> {
		self.links.iter().find(|l| l.id == id)
	}

	fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
		self.nodes
			.iter_mut()
			.find(|n| n.id == id)
			.ok_or_else(|| CanvasError::not_found(ElementKind::Node, id))
	}

	fn link_mut(&mut self, id: &str) -> Result<&mut Link> {
		self.links
			.iter_mut()
			.find(|l| l.id == id)
			.ok_or_else(|| CanvasError::not_found(ElementKind::Link, id))
	}

	fn bump(&mut self) {
		self.revision += 1;
	}

	pub fn add_node(
		&mut self,
		kind: NodeKind,
		position: Point,
		label: impl Into<String>,
		linked_record: Option<LinkedRecord>,
	) -> String {
		let id = fresh_id(kind.as_str());
		self.nodes.push(Node {
			id: id.clone(),
			kind,
			position,
			size: kind.default_size(),
			label: label.into(),
			linked_record: linked_record.filter(|_| kind.accepts_record()),
			extra: None,
		});
		self.bump();
		id
	}

	pub fn add_link(&mut self, source: &str, target: &str, kind: LinkKind) -> Result<String> {
		if source == target {
			return Err(CanvasError::InvalidLink(LinkRejection::SelfLoop));
		}
		for endpoint in [source, target] {
			if self.node(endpoint).is_none() {
				return Err(CanvasError::InvalidLink(LinkRejection::MissingEndpoint(
					endpoint.to_string(),
				)));
			}
		}
		if self.links.iter().any(|l| l.joins(source, target)) {
			return Err(CanvasError::InvalidLink(LinkRejection::Duplicate));
		}

		let id = fresh_id("link");
		self.links.push(Link {
			id: id.clone(),
			source: source.to_string(),
			target: target.to_string(),
			kind,
		});
		self.bump();
		Ok(id)
	}

	/// Removes a node and every link incident to it.
	pub fn remove_node(&mut self, id: &str) -> Result<RemovedNode> {
		let idx = self
			.nodes
			.iter()
			.position(|n| n.id == id)
			.ok_or_else(|| CanvasError::not_found(ElementKind::Node, id))?;
		let node = self.nodes.remove(idx);
		let (links, kept): (Vec<Link>, Vec<Link>) = std::mem::take(&mut self.links)
			.into_iter()
			.partition(|l| l.touches(id));
		self.links = kept;
		self.bump();
		Ok(RemovedNode { node, links })
	}

	pub fn remove_link(&mut self, id: &str) -> Result<Link> {
		let idx = self
			.links
			.iter()
			.position(|l| l.id == id)
			.ok_or_else(|| CanvasError::not_found(ElementKind::Link, id))?;
		let link = self.links.remove(idx);
		self.bump();
		Ok(link)
	}

	pub fn update_node_label(&mut self, id: &str, label: impl Into<String>) -> Result<()> {
		self.node_mut(id)?.label = label.into();
		self.bump();
		Ok(())
	}

	pub fn update_node_position(&mut self, id: &str, position: Point) -> Result<()> {
		let node = self.node_mut(id)?;
		if node.position != position {
			node.position = position;
			self.bump();
		}
		Ok(())
	}

	pub fn update_link_kind(&mut self, id: &str, kind: LinkKind) -> Result<()> {
		self.link_mut(id)?.kind = kind;
		self.bump();
		Ok(())
	}

	/// Binds an inventory record to a node, adopting the record's title as
	/// the label when it has one.
	pub fn bind_record(&mut self, id: &str, record: LinkedRecord) -> Result<()> {
		let node = self.node_mut(id)?;
		if !node.kind.accepts_record() {
			return Err(CanvasError::Validation(format!(
				"{} nodes cannot be linked to a record",
				node.kind.as_str()
			)));
		}
		if let Some(title) = record.title() {
			node.label = title.to_string();
		}
		node.linked_record = Some(record);
		self.bump();
		Ok(())
	}

	/// Picks a spot for a new node of `size` clear of existing boxes.
	///
	/// Candidates walk a fixed grid from the top-left; if every one collides,
	/// the last candidate is returned and the overlap is accepted.
	pub fn find_overlap_free_position(&self, size: Size) -> Point {
		let mut candidate = PLACEMENT_ORIGIN;
		for attempt in 0..PLACEMENT_ATTEMPTS {
			candidate = Point::new(
				PLACEMENT_ORIGIN.x + (attempt % PLACEMENT_COLUMNS) as f64 * PLACEMENT_STEP_X,
				PLACEMENT_ORIGIN.y + (attempt / PLACEMENT_COLUMNS) as f64 * PLACEMENT_STEP_Y,
			);
			let rect = Rect::new(candidate, size);
			if !self
				.nodes
				.iter()
				.any(|n| rect.overlaps(&n.rect(), PLACEMENT_MARGIN))
			{
				return candidate;
			}
		}
		warn!("no free position after {PLACEMENT_ATTEMPTS} attempts, overlapping");
		candidate
	}

	/// Topmost node containing `p`.
	pub fn node_at(&self, p: Point) -> Option<&Node> {
		self.nodes.iter().rev().find(|n| n.rect().contains(p))
	}

	/// Clipped endpoints of a link, or `None` when an endpoint is missing.
	pub fn link_segment(&self, link: &Link) -> Option<(Point, Point)> {
		let (source, target) = (self.node(&link.source)?, self.node(&link.target)?);
		Some(clipped_segment(&source.rect(), &target.rect()))
	}

	/// Link whose line or midpoint label lies under `p`.
	pub fn link_at(&self, p: Point) -> Option<&Link> {
		self.links.iter().rev().find(|link| {
			let Some((a, b)) = self.link_segment(link) else {
				return false;
			};
			let label = Rect::centered(a.midpoint(b), LINK_LABEL_SIZE);
			label.contains(p) || distance_to_segment(p, a, b) <= LINK_HIT_TOLERANCE
		})
	}

	/// Extent of all node boxes measured from the canvas origin.
	pub fn content_size(&self) -> Size {
		self.nodes.iter().fold(Size::new(0.0, 0.0), |acc, n| {
			let r = n.rect();
			Size::new(acc.width.max(r.right()), acc.height.max(r.bottom()))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pair() -> (GraphModel, String, String) {
		let mut model = GraphModel::new();
		let a = model.add_node(NodeKind::Asset, Point::new(100.0, 100.0), "Payment API", None);
		let b = model.add_node(NodeKind::Threat, Point::new(250.0, 100.0), "SQL Injection", None);
		(model, a, b)
	}

	#[test]
	fn loaded_parts_drop_broken_entries() {
		let (model, a, b) = pair();
		let mut nodes = model.nodes().to_vec();
		let copy = Node {
			label: "Copy".into(),
			..nodes[0].clone()
		};
		nodes.push(copy);
		let link = |id: &str, source: &str, target: &str| Link {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind: LinkKind::DataFlow,
		};
		let links = vec![
			link("l1", &a, &b),
			link("l2", &b, &a),
			link("l3", &a, &a),
			link("l4", &a, "gone"),
		];

		let loaded = GraphModel::from_parts(nodes, links);
		assert_eq!(loaded.nodes().len(), 2);
		assert_eq!(loaded.node(&a).unwrap().label, "Payment API");
		let ids: Vec<&str> = loaded.links().iter().map(|l| l.id.as_str()).collect();
		assert_eq!(ids, ["l1", "l4"]);
		assert!(loaded.link_segment(&loaded.links()[1]).is_none());
	}

	#[test]
	fn add_node_applies_default_sizes() {
		let mut model = GraphModel::new();
		let a = model.add_node(NodeKind::Asset, Point::default(), "a", None);
		let tb = model.add_node(NodeKind::TrustBoundary, Point::default(), "tb", None);
		assert_eq!(model.node(&a).unwrap().size, Size::new(120.0, 80.0));
		assert_eq!(model.node(&tb).unwrap().size, Size::new(300.0, 200.0));
		assert_ne!(a, tb);
	}

	#[test]
	fn trust_boundaries_drop_records() {
		let mut model = GraphModel::new();
		let record = LinkedRecord::asset("a1", serde_json::json!({ "id": "a1" }));
		let id = model.add_node(NodeKind::TrustBoundary, Point::default(), "tb", Some(record));
		assert!(model.node(&id).unwrap().linked_record.is_none());
	}

	#[test]
	fn duplicate_links_are_rejected_in_both_directions() {
		let (mut model, a, b) = pair();
		model.add_link(&a, &b, LinkKind::DataFlow).unwrap();
		for (s, t) in [(&a, &b), (&b, &a)] {
			assert!(matches!(
				model.add_link(s, t, LinkKind::Dependency),
				Err(CanvasError::InvalidLink(LinkRejection::Duplicate))
			));
		}
		assert_eq!(model.links().len(), 1);
	}

	#[test]
	fn self_loops_are_rejected() {
		let (mut model, a, _) = pair();
		assert!(matches!(
			model.add_link(&a, &a, LinkKind::DataFlow),
			Err(CanvasError::InvalidLink(LinkRejection::SelfLoop))
		));
		assert!(model.links().is_empty());
	}

	#[test]
	fn links_need_existing_endpoints() {
		let (mut model, a, _) = pair();
		assert!(matches!(
			model.add_link(&a, "ghost", LinkKind::DataFlow),
			Err(CanvasError::InvalidLink(LinkRejection::MissingEndpoint(id))) if id == "ghost"
		));
	}

	#[test]
	fn removing_a_node_cascades_to_its_links() {
		let (mut model, a, b) = pair();
		let c = model.add_node(NodeKind::Asset, Point::new(400.0, 100.0), "DB", None);
		model.add_link(&a, &b, LinkKind::DataFlow).unwrap();
		model.add_link(&c, &a, LinkKind::Dependency).unwrap();
		model.add_link(&b, &c, LinkKind::DataFlow).unwrap();

		let removed = model.remove_node(&a).unwrap();
		assert_eq!(removed.node.label, "Payment API");
		assert_eq!(removed.links.len(), 2);
		assert!(model.links().iter().all(|l| !l.touches(&a)));
		assert_eq!(model.links().len(), 1);
	}

	#[test]
	fn updates_on_missing_ids_report_not_found() {
		let mut model = GraphModel::new();
		assert!(matches!(
			model.update_node_label("nope", "x"),
			Err(CanvasError::NotFound { kind: ElementKind::Node, .. })
		));
		assert!(matches!(
			model.update_link_kind("nope", LinkKind::Dependency),
			Err(CanvasError::NotFound { kind: ElementKind::Link, .. })
		));
		assert_eq!(model.revision(), 0);
	}

	#[test]
	fn bind_record_adopts_title() {
		let (mut model, _, b) = pair();
		let record = LinkedRecord::threat("t-9", serde_json::json!({ "id": "t-9", "title": "XSS" }));
		model.bind_record(&b, record).unwrap();
		let node = model.node(&b).unwrap();
		assert_eq!(node.label, "XSS");
		assert_eq!(node.linked_record.as_ref().unwrap().id, "t-9");
	}

	#[test]
	fn placement_skips_occupied_cells() {
		let mut model = GraphModel::new();
		let size = NodeKind::Asset.default_size();
		assert_eq!(model.find_overlap_free_position(size), Point::new(100.0, 100.0));
		model.add_node(NodeKind::Asset, Point::new(100.0, 100.0), "a", None);
		assert_eq!(model.find_overlap_free_position(size), Point::new(250.0, 100.0));
	}

	#[test]
	fn placement_gives_up_after_bounded_attempts() {
		let mut model = GraphModel::new();
		model.add_node(NodeKind::TrustBoundary, Point::new(0.0, 0.0), "huge", None);
		let id = model.nodes()[0].id.clone();
		model.nodes.iter_mut().for_each(|n| n.size = Size::new(5000.0, 5000.0));
		let p = model.find_overlap_free_position(NodeKind::Asset.default_size());
		assert_eq!(p, Point::new(100.0 + 4.0 * 150.0, 100.0 + 9.0 * 120.0));
		assert!(model.node(&id).is_some());
	}

	#[test]
	fn hit_testing_prefers_topmost() {
		let mut model = GraphModel::new();
		let below = model.add_node(NodeKind::TrustBoundary, Point::new(0.0, 0.0), "tb", None);
		let above = model.add_node(NodeKind::Asset, Point::new(50.0, 50.0), "a", None);
		assert_eq!(model.node_at(Point::new(60.0, 60.0)).unwrap().id, above);
		assert_eq!(model.node_at(Point::new(10.0, 10.0)).unwrap().id, below);
		assert!(model.node_at(Point::new(900.0, 900.0)).is_none());
	}

	#[test]
	fn link_hit_testing_uses_clipped_line() {
		let (mut model, a, b) = pair();
		let link = model.add_link(&a, &b, LinkKind::DataFlow).unwrap();
		// a spans x 100..220, b spans 250..370, both y 100..180
		assert_eq!(model.link_at(Point::new(235.0, 142.0)).unwrap().id, link);
		assert!(model.link_at(Point::new(235.0, 170.0)).is_none());
	}
}
