use std::fmt;

/// Why a link could not be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkRejection {
	SelfLoop,
	Duplicate,
	MissingEndpoint(String),
}

impl fmt::Display for LinkRejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LinkRejection::SelfLoop => f.write_str("cannot connect a node to itself"),
			LinkRejection::Duplicate => f.write_str("connection already exists"),
			LinkRejection::MissingEndpoint(id) => write!(f, "node {id} does not exist"),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
	Node,
	Link,
}

impl fmt::Display for ElementKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ElementKind::Node => "node",
			ElementKind::Link => "connection",
		})
	}
}

/// Every failure the canvas can report. None of them are fatal; each one maps
/// to a user-facing notice.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
	#[error("invalid connection: {0}")]
	InvalidLink(LinkRejection),
	#[error("{kind} {id} not found")]
	NotFound { kind: ElementKind, id: String },
	#[error("{0}")]
	Validation(String),
	#[error("diagram store error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
	Persistence { status: Option<u16>, message: String },
	#[error("malformed diagram document: {0}")]
	Codec(#[from] serde_json::Error),
}

impl CanvasError {
	pub fn not_found(kind: ElementKind, id: impl Into<String>) -> Self {
		CanvasError::NotFound {
			kind,
			id: id.into(),
		}
	}

	pub fn persistence(message: impl Into<String>) -> Self {
		CanvasError::Persistence {
			status: None,
			message: message.into(),
		}
	}
}

pub type Result<T> = std::result::Result<T, CanvasError>;
