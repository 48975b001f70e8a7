use super::error::CanvasError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
	Info,
	Success,
	Warning,
	Error,
}

impl NoticeLevel {
	pub const fn css_class(self) -> &'static str {
		match self {
			NoticeLevel::Info => "notice notice-info",
			NoticeLevel::Success => "notice notice-success",
			NoticeLevel::Warning => "notice notice-warning",
			NoticeLevel::Error => "notice notice-error",
		}
	}
}

/// Transient message shown to the user after an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	pub level: NoticeLevel,
	pub message: String,
}

impl Notice {
	pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
		Self {
			level,
			message: message.into(),
		}
	}

	pub fn info(message: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Info, message)
	}

	pub fn success(message: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Success, message)
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Warning, message)
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self::new(NoticeLevel::Error, message)
	}
}

impl From<&CanvasError> for Notice {
	fn from(err: &CanvasError) -> Self {
		match err {
			CanvasError::NotFound { .. } => Notice::warning(err.to_string()),
			_ => Notice::error(err.to_string()),
		}
	}
}

impl From<CanvasError> for Notice {
	fn from(err: CanvasError) -> Self {
		Notice::from(&err)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::threat_canvas::error::ElementKind;

	#[test]
	fn each_level_has_one_modifier_class() {
		assert_eq!(NoticeLevel::Info.css_class(), "notice notice-info");
		assert_eq!(NoticeLevel::Error.css_class().matches("notice ").count(), 1);
	}

	#[test]
	fn missing_elements_are_warnings() {
		let missing = CanvasError::not_found(ElementKind::Link, "l-1");
		assert_eq!(Notice::from(missing).level, NoticeLevel::Warning);
		let invalid = CanvasError::Validation("Please enter a diagram name".into());
		assert_eq!(Notice::from(&invalid).level, NoticeLevel::Error);
	}
}
