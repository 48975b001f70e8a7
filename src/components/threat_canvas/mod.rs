//! Threat-model diagram editor.
//!
//! Everything except the component itself is plain Rust over the graph and
//! runs without a browser; `component` binds it to a Leptos view and a 2D
//! canvas.

mod component;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
mod http;
pub mod interaction;
pub mod model;
pub mod notice;
pub mod persistence;
mod render;
pub mod state;
pub mod store;
pub mod types;

pub use component::ThreatModelCanvas;
pub use error::{CanvasError, Result};
pub use http::HttpStore;
pub use interaction::Editor;
pub use model::GraphModel;
pub use persistence::PersistenceAdapter;
pub use state::CanvasState;
pub use store::{AnyStore, DiagramStore, MemoryStore};
pub use types::{Diagram, Link, LinkKind, LinkedRecord, Node, NodeKind};
