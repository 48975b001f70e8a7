//! Build-time configuration.

/// Where saved diagrams live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
	/// The risk platform's REST API.
	Http,
	/// Kept in memory for the lifetime of the page.
	Memory,
}

/// Settings for the canvas, resolved from `THREAT_CANVAS_*` variables at
/// compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasConfig {
	/// API root including the version prefix, without a trailing slash.
	pub api_base_url: String,
	pub store: StoreBackend,
	/// Session-storage key holding the bearer token.
	pub token_key: String,
}

const DEFAULT_API_URL: &str = "http://localhost:8000";
const API_VERSION: &str = "/v1";
const DEFAULT_TOKEN_KEY: &str = "auth_token";

impl Default for CanvasConfig {
	fn default() -> Self {
		Self::from_env()
	}
}

impl CanvasConfig {
	pub fn from_env() -> Self {
		Self::from_values(
			option_env!("THREAT_CANVAS_API_URL"),
			option_env!("THREAT_CANVAS_STORE"),
		)
	}

	/// Applies defaults to raw values; unknown backends fall back to HTTP.
	pub fn from_values(api_url: Option<&str>, store: Option<&str>) -> Self {
		let base = api_url
			.map(str::trim)
			.filter(|u| !u.is_empty())
			.unwrap_or(DEFAULT_API_URL)
			.trim_end_matches('/');
		let store = match store.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
			Some("memory") => StoreBackend::Memory,
			_ => StoreBackend::Http,
		};
		Self {
			api_base_url: format!("{base}{API_VERSION}"),
			store,
			token_key: DEFAULT_TOKEN_KEY.to_string(),
		}
	}

	pub fn diagrams_url(&self) -> String {
		format!("{}/threats/diagrams", self.api_base_url)
	}
}
