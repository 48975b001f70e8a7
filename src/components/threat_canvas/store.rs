use std::cell::{Cell, RefCell};

use chrono::Utc;
use uuid::Uuid;

use super::document::{DiagramDocument, DiagramFilter, DiagramSummary, StoredDiagram};
use super::error::{CanvasError, Result};
use super::http::HttpStore;
use crate::config::{CanvasConfig, StoreBackend};

const NOT_FOUND: &str = "Threat model diagram not found";

/// The backend that keeps saved diagrams.
///
/// Futures returned here are driven on the UI thread and need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait DiagramStore {
	/// Stores a new diagram and returns its id.
	async fn create(&self, document: &DiagramDocument) -> Result<String>;
	async fn update(&self, id: &str, document: &DiagramDocument) -> Result<()>;
	async fn get(&self, id: &str) -> Result<StoredDiagram>;
	async fn list(&self, filter: &DiagramFilter) -> Result<Vec<DiagramSummary>>;
	async fn delete(&self, id: &str) -> Result<()>;
}

/// Session-local store, used offline and in tests.
#[derive(Debug)]
pub struct MemoryStore {
	diagrams: RefCell<Vec<StoredDiagram>>,
	creator: String,
	offline: Cell<bool>,
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new("local")
	}
}

impl MemoryStore {
	pub fn new(creator: impl Into<String>) -> Self {
		Self {
			diagrams: RefCell::new(Vec::new()),
			creator: creator.into(),
			offline: Cell::new(false),
		}
	}

	/// While offline every call fails as a network error would.
	pub fn set_offline(&self, offline: bool) {
		self.offline.set(offline);
	}

	pub fn len(&self) -> usize {
		self.diagrams.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn reachable(&self) -> Result<()> {
		if self.offline.get() {
			return Err(CanvasError::persistence("diagram store is unreachable"));
		}
		Ok(())
	}

	fn missing() -> CanvasError {
		CanvasError::Persistence {
			status: Some(404),
			message: NOT_FOUND.into(),
		}
	}
}

impl DiagramStore for MemoryStore {
	async fn create(&self, document: &DiagramDocument) -> Result<String> {
		self.reachable()?;
		let id = Uuid::new_v4().to_string();
		let now = Utc::now();
		self.diagrams.borrow_mut().push(StoredDiagram {
			diagram_id: id.clone(),
			name: document.name.clone(),
			description: document.description.clone(),
			threat_id: document.threat_id.clone(),
			canvas_data: document.canvas_data.clone(),
			created_by: Some(self.creator.clone()),
			creator_name: Some(self.creator.clone()),
			created_at: Some(now),
			updated_at: Some(now),
		});
		Ok(id)
	}

	async fn update(&self, id: &str, document: &DiagramDocument) -> Result<()> {
		self.reachable()?;
		let mut diagrams = self.diagrams.borrow_mut();
		let stored = diagrams
			.iter_mut()
			.find(|d| d.diagram_id == id)
			.ok_or_else(Self::missing)?;
		stored.name = document.name.clone();
		stored.description = document.description.clone();
		stored.canvas_data = document.canvas_data.clone();
		stored.updated_at = Some(Utc::now());
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<StoredDiagram> {
		self.reachable()?;
		self.diagrams
			.borrow()
			.iter()
			.find(|d| d.diagram_id == id)
			.cloned()
			.ok_or_else(Self::missing)
	}

	async fn list(&self, filter: &DiagramFilter) -> Result<Vec<DiagramSummary>> {
		self.reachable()?;
		let diagrams = self.diagrams.borrow();
		let mut matching: Vec<&StoredDiagram> = diagrams
			.iter()
			.filter(|d| filter.threat_id.is_none() || d.threat_id == filter.threat_id)
			.collect();
		matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
		let page_size = filter.page_size.max(1) as usize;
		let skip = (filter.page.max(1) as usize - 1) * page_size;
		Ok(matching
			.into_iter()
			.skip(skip)
			.take(page_size)
			.map(DiagramSummary::from)
			.collect())
	}

	async fn delete(&self, id: &str) -> Result<()> {
		self.reachable()?;
		let mut diagrams = self.diagrams.borrow_mut();
		let idx = diagrams
			.iter()
			.position(|d| d.diagram_id == id)
			.ok_or_else(Self::missing)?;
		diagrams.remove(idx);
		Ok(())
	}
}

/// Store picked from configuration at startup.
pub enum AnyStore {
	Http(HttpStore),
	Memory(MemoryStore),
}

impl AnyStore {
	pub fn from_config(config: &CanvasConfig) -> Self {
		match config.store {
			StoreBackend::Http => AnyStore::Http(HttpStore::new(config)),
			StoreBackend::Memory => AnyStore::Memory(MemoryStore::default()),
		}
	}
}

impl DiagramStore for AnyStore {
	async fn create(&self, document: &DiagramDocument) -> Result<String> {
		match self {
			AnyStore::Http(store) => store.create(document).await,
			AnyStore::Memory(store) => store.create(document).await,
		}
	}

	async fn update(&self, id: &str, document: &DiagramDocument) -> Result<()> {
		match self {
			AnyStore::Http(store) => store.update(id, document).await,
			AnyStore::Memory(store) => store.update(id, document).await,
		}
	}

	async fn get(&self, id: &str) -> Result<StoredDiagram> {
		match self {
			AnyStore::Http(store) => store.get(id).await,
			AnyStore::Memory(store) => store.get(id).await,
		}
	}

	async fn list(&self, filter: &DiagramFilter) -> Result<Vec<DiagramSummary>> {
		match self {
			AnyStore::Http(store) => store.list(filter).await,
			AnyStore::Memory(store) => store.list(filter).await,
		}
	}

	async fn delete(&self, id: &str) -> Result<()> {
		match self {
			AnyStore::Http(store) => store.delete(id).await,
			AnyStore::Memory(store) => store.delete(id).await,
		}
	}
}
