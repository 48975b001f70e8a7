use leptos::prelude::*;
use leptos_router::hooks::use_params_map;
use serde_json::json;

use crate::components::threat_canvas::{LinkedRecord, ThreatModelCanvas};

/// Inventory offered to the canvas until the page is wired to the asset and
/// threat registers.
fn sample_assets() -> Vec<LinkedRecord> {
	[
		("asset-payment-api", "Payment API", "application"),
		("asset-card-vault", "Card Vault", "database"),
		("asset-web-portal", "Customer Web Portal", "application"),
		("asset-idp", "Identity Provider", "service"),
	]
	.into_iter()
	.map(|(id, name, category)| {
		LinkedRecord::asset(id, json!({ "id": id, "name": name, "category": category }))
	})
	.collect()
}

fn sample_threats() -> Vec<LinkedRecord> {
	[
		("threat-sqli", "SQL Injection", "high"),
		("threat-credential-stuffing", "Credential Stuffing", "medium"),
		("threat-data-exfiltration", "Cardholder Data Exfiltration", "critical"),
	]
	.into_iter()
	.map(|(id, title, severity)| {
		LinkedRecord::threat(id, json!({ "id": id, "title": title, "severity": severity }))
	})
	.collect()
}

/// Canvas page, optionally scoped to the threat named in the route.
#[component]
pub fn Home() -> impl IntoView {
	let params = use_params_map();
	let threat_id = params.with_untracked(|p| p.get("threat_id"));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="canvas-page">
				<div class="canvas-header">
					<h1>"Threat Model Diagram"</h1>
					<p class="subtitle">
						"Drag nodes to reposition. Select a node and press Connect, then click a target. Delete removes the selection."
					</p>
				</div>
				<ThreatModelCanvas
					threat_id=threat_id
					assets=sample_assets()
					threats=sample_threats()
				/>
			</div>
		</ErrorBoundary>
	}
}
