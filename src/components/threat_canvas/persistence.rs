use log::{info, warn};

use super::document::{DiagramDocument, DiagramFilter, DiagramSummary};
use super::error::Result;
use super::store::DiagramStore;
use super::types::Diagram;

/// Moves diagrams between the canvas and a [`DiagramStore`].
///
/// Nothing here touches the live canvas; callers hand in a snapshot and
/// decide what to do with the result.
pub struct PersistenceAdapter<S> {
	store: S,
}

impl<S: DiagramStore> PersistenceAdapter<S> {
	pub fn new(store: S) -> Self {
		Self { store }
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	/// Creates the diagram on first save, updates it afterwards, and records
	/// the id on `diagram`. Empty names are rejected before any request.
	pub async fn save(&self, diagram: &mut Diagram) -> Result<String> {
		let document = DiagramDocument::from_diagram(diagram)?;
		let id = match &diagram.id {
			Some(id) => {
				self.store.update(id, &document).await.inspect_err(|err| {
					warn!("updating diagram {id} failed: {err}");
				})?;
				id.clone()
			}
			None => self.store.create(&document).await.inspect_err(|err| {
				warn!("creating diagram failed: {err}");
			})?,
		};
		info!(
			"saved diagram {id} ({} nodes, {} links)",
			diagram.nodes.len(),
			diagram.links.len()
		);
		diagram.id = Some(id.clone());
		Ok(id)
	}

	pub async fn load(&self, id: &str) -> Result<Diagram> {
		let stored = self.store.get(id).await.inspect_err(|err| {
			warn!("loading diagram {id} failed: {err}");
		})?;
		let diagram = stored.into_diagram();
		info!(
			"loaded diagram {id} ({} nodes, {} links)",
			diagram.nodes.len(),
			diagram.links.len()
		);
		Ok(diagram)
	}

	pub async fn list(&self, filter: &DiagramFilter) -> Result<Vec<DiagramSummary>> {
		self.store.list(filter).await.inspect_err(|err| {
			warn!("listing diagrams failed: {err}");
		})
	}

	pub async fn delete(&self, id: &str) -> Result<()> {
		self.store.delete(id).await.inspect_err(|err| {
			warn!("deleting diagram {id} failed: {err}");
		})?;
		info!("deleted diagram {id}");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;

	use super::super::error::CanvasError;
	use super::super::geometry::{Point, Size};
	use super::super::store::MemoryStore;
	use super::super::types::{LinkKind, Node, NodeKind};
	use super::*;

	fn named(name: &str) -> Diagram {
		Diagram {
			name: name.into(),
			..Diagram::default()
		}
	}

	#[test]
	fn first_save_creates_then_updates() {
		let adapter = PersistenceAdapter::new(MemoryStore::default());
		let mut diagram = named("Flow");
		let id = block_on(adapter.save(&mut diagram)).unwrap();
		assert_eq!(diagram.id.as_deref(), Some(id.as_str()));

		diagram.name = "Flow v2".into();
		let again = block_on(adapter.save(&mut diagram)).unwrap();
		assert_eq!(again, id);
		assert_eq!(adapter.store().len(), 1);
		assert_eq!(block_on(adapter.load(&id)).unwrap().name, "Flow v2");
	}

	#[test]
	fn validation_happens_before_the_store() {
		let store = MemoryStore::default();
		store.set_offline(true);
		let adapter = PersistenceAdapter::new(store);
		let mut diagram = named("");
		assert!(matches!(
			block_on(adapter.save(&mut diagram)),
			Err(CanvasError::Validation(_))
		));
	}

	#[test]
	fn failed_save_leaves_diagram_unsaved() {
		let store = MemoryStore::default();
		store.set_offline(true);
		let adapter = PersistenceAdapter::new(store);
		let mut diagram = named("Flow");
		assert!(matches!(
			block_on(adapter.save(&mut diagram)),
			Err(CanvasError::Persistence { .. })
		));
		assert!(diagram.id.is_none());
		assert!(adapter.store().is_empty());
	}

	#[test]
	fn load_of_unknown_id_is_a_persistence_failure() {
		let adapter = PersistenceAdapter::new(MemoryStore::default());
		assert!(matches!(
			block_on(adapter.load("missing")),
			Err(CanvasError::Persistence { status: Some(404), .. })
		));
	}

	#[test]
	fn list_filters_by_threat_and_delete_removes() {
		let adapter = PersistenceAdapter::new(MemoryStore::default());
		let mut scoped = Diagram {
			threat_id: Some("t-1".into()),
			..named("Scoped")
		};
		let mut other = named("Other");
		let scoped_id = block_on(adapter.save(&mut scoped)).unwrap();
		block_on(adapter.save(&mut other)).unwrap();

		let all = block_on(adapter.list(&DiagramFilter::default())).unwrap();
		assert_eq!(all.len(), 2);
		let filtered = block_on(adapter.list(&DiagramFilter::for_threat(Some("t-1".into())))).unwrap();
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].diagram_id, scoped_id);

		block_on(adapter.delete(&scoped_id)).unwrap();
		assert_eq!(block_on(adapter.list(&DiagramFilter::default())).unwrap().len(), 1);
	}

	#[test]
	fn loaded_graph_matches_saved_graph() {
		let adapter = PersistenceAdapter::new(MemoryStore::default());
		let node = |id: &str, kind: NodeKind, x: f64| Node {
			id: id.into(),
			kind,
			position: Point::new(x, 40.0),
			size: kind.default_size(),
			label: id.to_uppercase(),
			linked_record: None,
			extra: None,
		};
		let mut diagram = Diagram {
			nodes: vec![node("a", NodeKind::Asset, 10.0), node("t", NodeKind::Threat, 200.0)],
			links: vec![super::super::types::Link {
				id: "l".into(),
				source: "a".into(),
				target: "t".into(),
				kind: LinkKind::Dependency,
			}],
			..named("Round trip")
		};
		let id = block_on(adapter.save(&mut diagram)).unwrap();
		let loaded = block_on(adapter.load(&id)).unwrap();
		assert_eq!(loaded, diagram);
		assert_eq!(loaded.nodes[1].size, Size::new(120.0, 80.0));
	}
}
