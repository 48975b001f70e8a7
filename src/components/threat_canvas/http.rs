use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::document::{DiagramDocument, DiagramFilter, DiagramSummary, Page, StoredDiagram};
use super::error::{CanvasError, Result};
use super::store::DiagramStore;
use crate::config::CanvasConfig;

pub(super) fn js_err(err: JsValue) -> CanvasError {
	CanvasError::persistence(
		err.as_string()
			.or_else(|| {
				err.dyn_ref::<js_sys::Error>()
					.map(|e| String::from(e.message()))
			})
			.unwrap_or_else(|| "network request failed".into()),
	)
}

/// Pulls FastAPI's `detail` out of an error body.
fn error_detail(status: u16, body: &str) -> String {
	match serde_json::from_str::<Value>(body).ok().and_then(|v| v.get("detail").cloned()) {
		Some(Value::String(detail)) => detail,
		Some(other) => other.to_string(),
		None if !body.trim().is_empty() => body.trim().to_string(),
		None => format!("request failed with status {status}"),
	}
}

/// Diagram store backed by the REST API under `/threats/diagrams`.
#[derive(Clone, Debug)]
pub struct HttpStore {
	endpoint: String,
	token_key: String,
}

impl HttpStore {
	pub fn new(config: &CanvasConfig) -> Self {
		Self {
			endpoint: config.diagrams_url(),
			token_key: config.token_key.clone(),
		}
	}

	fn token(&self) -> Option<String> {
		web_sys::window()?
			.session_storage()
			.ok()??
			.get_item(&self.token_key)
			.ok()?
	}

	async fn send(&self, method: &str, url: &str, body: Option<String>) -> Result<String> {
		let opts = RequestInit::new();
		opts.set_method(method);
		opts.set_mode(RequestMode::Cors);
		if let Some(body) = &body {
			opts.set_body(&JsValue::from_str(body));
		}
		let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
		let headers = request.headers();
		headers
			.set("Content-Type", "application/json")
			.map_err(js_err)?;
		if let Some(token) = self.token() {
			headers
				.set("Authorization", &format!("Bearer {token}"))
				.map_err(js_err)?;
		}

		let window = web_sys::window().ok_or_else(|| CanvasError::persistence("no window"))?;
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(js_err)?
			.dyn_into()
			.map_err(js_err)?;
		let status = response.status();
		let text = JsFuture::from(response.text().map_err(js_err)?)
			.await
			.map_err(js_err)?
			.as_string()
			.unwrap_or_default();

		if !response.ok() {
			warn!("{method} {url} failed with {status}");
			return Err(CanvasError::Persistence {
				status: Some(status),
				message: error_detail(status, &text),
			});
		}
		Ok(text)
	}

	async fn send_json<T: DeserializeOwned>(
		&self,
		method: &str,
		url: &str,
		body: Option<String>,
	) -> Result<T> {
		let text = self.send(method, url, body).await?;
		Ok(serde_json::from_str(&text)?)
	}

	fn item_url(&self, id: &str) -> String {
		format!(
			"{}/{}",
			self.endpoint,
			String::from(js_sys::encode_uri_component(id))
		)
	}
}

impl DiagramStore for HttpStore {
	async fn create(&self, document: &DiagramDocument) -> Result<String> {
		let body = serde_json::to_string(document)?;
		let created: StoredDiagram = self.send_json("POST", &self.endpoint, Some(body)).await?;
		Ok(created.diagram_id)
	}

	async fn update(&self, id: &str, document: &DiagramDocument) -> Result<()> {
		let body = serde_json::to_string(document)?;
		self.send("PUT", &self.item_url(id), Some(body)).await?;
		Ok(())
	}

	async fn get(&self, id: &str) -> Result<StoredDiagram> {
		self.send_json("GET", &self.item_url(id), None).await
	}

	async fn list(&self, filter: &DiagramFilter) -> Result<Vec<DiagramSummary>> {
		let mut url = format!(
			"{}?page={}&page_size={}",
			self.endpoint, filter.page, filter.page_size
		);
		if let Some(threat_id) = &filter.threat_id {
			url.push_str("&threat_id=");
			url.push_str(&String::from(js_sys::encode_uri_component(threat_id)));
		}
		let page: Page<DiagramSummary> = self.send_json("GET", &url, None).await?;
		Ok(page.items)
	}

	async fn delete(&self, id: &str) -> Result<()> {
		self.send("DELETE", &self.item_url(id), None).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detail_is_preferred() {
		assert_eq!(
			error_detail(404, r#"{"detail":"Threat model diagram not found"}"#),
			"Threat model diagram not found"
		);
		assert_eq!(error_detail(502, ""), "request failed with status 502");
		assert_eq!(error_detail(500, "boom"), "boom");
	}
}
