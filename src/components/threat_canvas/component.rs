use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, Event, HtmlAnchorElement, HtmlCanvasElement,
	HtmlElement, KeyboardEvent, MouseEvent,
};

use super::document::{DiagramDocument, DiagramFilter, DiagramSummary};
use super::error::{CanvasError, Result};
use super::export::{self, PortableExport, export_file_name};
use super::geometry::Point;
use super::http::js_err;
use super::interaction::{Mode, Selection};
use super::notice::Notice;
use super::persistence::PersistenceAdapter;
use super::render;
use super::state::{CanvasState, CanvasStatus};
use super::store::AnyStore;
use super::types::{LinkedRecord, NodeKind};
use crate::config::CanvasConfig;

pub const NOTICE_DURATION_MS: u32 = 4_000;
const DEFAULT_VIEWPORT: (f64, f64) = (800.0, 600.0);

#[derive(Clone, Debug, PartialEq)]
enum Dialog {
	Save,
	Load,
	EditNode(String),
}

/// Inventory records offered when placing or editing nodes.
#[derive(Clone, Debug, Default)]
struct Inventory {
	assets: Vec<LinkedRecord>,
	threats: Vec<LinkedRecord>,
}

/// Copyable handle to everything one canvas instance owns.
///
/// Mutable editor state lives in local storage and is never held across an
/// await; the signals mirror it for the DOM around the drawing surface.
#[derive(Clone, Copy)]
struct CanvasHandle {
	state: StoredValue<CanvasState, LocalStorage>,
	persistence: StoredValue<Rc<PersistenceAdapter<AnyStore>>, LocalStorage>,
	drag_listeners: StoredValue<Option<[EventListener; 2]>, LocalStorage>,
	notice_seq: StoredValue<u64>,
	status: RwSignal<CanvasStatus>,
	notices: RwSignal<Vec<(u64, Notice)>>,
	dialog: RwSignal<Option<Dialog>>,
	summaries: RwSignal<Option<Vec<DiagramSummary>>>,
}

impl CanvasHandle {
	fn new(threat_id: Option<String>, config: &CanvasConfig) -> Self {
		let state = CanvasState::new(threat_id, DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1);
		let status = state.status();
		Self {
			state: StoredValue::new_local(state),
			persistence: StoredValue::new_local(Rc::new(PersistenceAdapter::new(
				AnyStore::from_config(config),
			))),
			drag_listeners: StoredValue::new_local(None),
			notice_seq: StoredValue::new(0),
			status: RwSignal::new(status),
			notices: RwSignal::new(Vec::new()),
			dialog: RwSignal::new(None),
			summaries: RwSignal::new(None),
		}
	}

	fn notify(self, notice: Notice) {
		let Some(id) = self.notice_seq.try_update_value(|seq| {
			*seq += 1;
			*seq
		}) else {
			return;
		};
		self.notices.try_update(|list| list.push((id, notice)));
		let notices = self.notices;
		Timeout::new(NOTICE_DURATION_MS, move || {
			notices.try_update(|list| list.retain(|(n, _)| *n != id));
		})
		.forget();
	}

	fn notify_opt(self, notice: Option<Notice>) {
		if let Some(notice) = notice {
			self.notify(notice);
		}
	}

	/// Runs `f` against the canvas state, then publishes the new status.
	fn edit<R>(self, f: impl FnOnce(&mut CanvasState) -> R) -> Option<R> {
		let result = self.state.try_update_value(f);
		self.refresh();
		self.sync_drag_listeners();
		result
	}

	fn refresh(self) {
		let Some(status) = self.state.try_with_value(CanvasState::status) else {
			return;
		};
		if self.status.with_untracked(|current| *current != status) {
			self.status.set(status);
		}
	}

	/// Window-level release listeners exist exactly while a drag is active.
	fn sync_drag_listeners(self) {
		let dragging = self
			.state
			.try_with_value(|s| s.editor.mode() == Mode::Dragging)
			.unwrap_or(false);
		let installed = self
			.drag_listeners
			.try_with_value(Option::is_some)
			.unwrap_or(false);

		if dragging && !installed {
			let Some(window) = web_sys::window() else {
				return;
			};
			let Some(document) = window.document() else {
				return;
			};
			let up = EventListener::new(&window, "mouseup", move |_| self.release());
			let leave = EventListener::new(&document, "mouseleave", move |_| self.release());
			self.drag_listeners.set_value(Some([up, leave]));
			debug!("drag release listeners installed");
		} else if !dragging && installed {
			self.drag_listeners.set_value(None);
			debug!("drag release listeners removed");
		}
	}

	fn release(self) {
		self.state
			.try_update_value(|s| s.editor.pointer_released());
		self.refresh();
		// A listener cannot be dropped while it is running.
		Timeout::new(0, move || self.sync_drag_listeners()).forget();
	}

	fn pointer_down(self, at: Point) {
		let notice = self
			.edit(|s| {
				let hit = s.editor.hit_test(at);
				s.editor.pointer_down(hit, at)
			})
			.flatten();
		self.notify_opt(notice);
	}

	fn pointer_move(self, at: Point) {
		self.edit(|s| s.editor.pointer_move(at));
	}

	fn pointer_up(self, at: Point) {
		let notice = self.edit(|s| s.editor.pointer_up(at)).flatten();
		self.notify_opt(notice);
	}

	fn key_down(self, ev: &KeyboardEvent) {
		if self.dialog.with_untracked(Option::is_some) || typing(ev) {
			return;
		}
		match ev.key().as_str() {
			"Escape" => self.cancel_connection(),
			"Delete" | "Backspace" => {
				ev.prevent_default();
				self.delete_selection();
			}
			_ => {}
		}
	}

	fn add_asset(self, inventory: StoredValue<Inventory>) {
		let assets = inventory.with_value(|inv| inv.assets.clone());
		self.edit(|s| {
			let record = s.next_inventory_asset(&assets);
			s.editor.add_asset(record)
		});
	}

	fn add_threat(self) {
		self.edit(|s| s.editor.add_threat());
	}

	fn add_trust_boundary(self) {
		self.edit(|s| s.editor.add_trust_boundary());
	}

	fn start_connection(self) {
		let notice = self.edit(|s| s.editor.start_connection()).flatten();
		self.notify_opt(notice);
	}

	fn cancel_connection(self) {
		let notice = self.edit(|s| s.editor.cancel_connection()).flatten();
		self.notify_opt(notice);
	}

	fn delete_selection(self) {
		let notice = self.edit(|s| s.editor.delete_selection()).flatten();
		self.notify_opt(notice);
	}

	fn toggle_link_kind(self) {
		let result = self
			.edit(|s| match s.editor.selection().clone() {
				Selection::Link(id) => Some(s.editor.toggle_link_kind(&id)),
				_ => None,
			})
			.flatten();
		match result {
			Some(Ok(kind)) => self.notify(Notice::success(format!(
				"Connection type changed to {}",
				kind.label()
			))),
			Some(Err(err)) => self.notify(Notice::from(err)),
			None => self.notify(Notice::error("Please select a connection first")),
		}
	}

	fn edit_selected_node(self) {
		match self.status.with_untracked(|s| s.selected_node.clone()) {
			Some(node) => self.dialog.set(Some(Dialog::EditNode(node.id))),
			None => self.notify(Notice::error("Please select a node first")),
		}
	}

	fn update_node(self, id: &str, label: &str, record: Option<LinkedRecord>) -> bool {
		let result = self.edit(|s| -> Result<()> {
			s.editor.rename_node(id, label)?;
			if let Some(record) = record {
				s.editor.link_record(id, record)?;
			}
			Ok(())
		});
		match result {
			Some(Ok(())) => {
				self.notify(Notice::success("Node updated"));
				true
			}
			Some(Err(err)) => {
				self.notify(Notice::from(err));
				false
			}
			None => false,
		}
	}

	fn new_diagram(self) {
		self.edit(CanvasState::new_diagram);
		self.notify(Notice::info("Started a new diagram"));
	}

	/// Saves under `name`; returns false when validation stopped it before
	/// any request went out.
	fn save(self, name: String, description: String) -> bool {
		let Some((mut diagram, ticket)) = self
			.state
			.try_with_value(|s| (s.diagram(), s.begin_save()))
		else {
			return false;
		};
		diagram.name = name;
		diagram.description = description;
		if let Err(err) = DiagramDocument::from_diagram(&diagram) {
			self.notify(Notice::from(err));
			return false;
		}

		let adapter = self.persistence.get_value();
		spawn_local(async move {
			match adapter.save(&mut diagram).await {
				Ok(_) => {
					let adopted = self
						.state
						.try_update_value(|s| s.finish_save(ticket, &diagram))
						.unwrap_or(false);
					self.refresh();
					self.notify(if adopted {
						Notice::success("Diagram saved successfully")
					} else {
						Notice::warning("Diagram saved, but the canvas was replaced in the meantime")
					});
				}
				Err(err) => self.notify(Notice::from(err)),
			}
		});
		true
	}

	fn open_picker(self) {
		let Some(filter) = self
			.state
			.try_with_value(|s| DiagramFilter::for_threat(s.document.threat_id.clone()))
		else {
			return;
		};
		self.summaries.set(None);
		self.dialog.set(Some(Dialog::Load));

		let adapter = self.persistence.get_value();
		spawn_local(async move {
			match adapter.list(&filter).await {
				Ok(list) => {
					self.summaries.try_set(Some(list));
				}
				Err(err) => {
					self.summaries.try_set(Some(Vec::new()));
					self.notify(Notice::from(err));
				}
			}
		});
	}

	fn load(self, id: String) {
		let Some(ticket) = self.state.try_update_value(CanvasState::begin_load) else {
			return;
		};
		let adapter = self.persistence.get_value();
		spawn_local(async move {
			match adapter.load(&id).await {
				Ok(diagram) => {
					let applied = self
						.edit(|s| s.finish_load(ticket, diagram))
						.unwrap_or(false);
					self.notify(if applied {
						Notice::success("Diagram loaded successfully")
					} else {
						Notice::warning("Ignored an outdated load; the canvas changed while it was in flight")
					});
				}
				Err(err) => self.notify(Notice::from(err)),
			}
		});
	}

	fn delete_diagram(self, id: String) {
		let adapter = self.persistence.get_value();
		spawn_local(async move {
			match adapter.delete(&id).await {
				Ok(()) => {
					self.edit(|s| s.forget_deleted(&id));
					self.summaries.try_update(|list| {
						if let Some(list) = list {
							list.retain(|d| d.diagram_id != id);
						}
					});
					self.notify(Notice::success("Diagram deleted"));
				}
				Err(err) => self.notify(Notice::from(err)),
			}
		});
	}

	fn export_json(self) {
		let Some(diagram) = self.state.try_with_value(CanvasState::diagram) else {
			return;
		};
		let now = Utc::now();
		let result = PortableExport::new(&diagram, now)
			.to_json()
			.and_then(|json| {
				download(
					&export_file_name(now.date_naive(), "json"),
					&json,
					"application/json",
				)
			});
		self.report_export(result, "JSON");
	}

	fn export_svg(self) {
		let Some(svg) = self
			.state
			.try_with_value(|s| export::export_vector(&s.diagram(), s.canvas_size()))
		else {
			return;
		};
		let name = export_file_name(Utc::now().date_naive(), "svg");
		self.report_export(download(&name, &svg, "image/svg+xml"), "SVG");
	}

	fn report_export(self, result: Result<()>, format: &str) {
		match result {
			Ok(()) => {
				info!("exported diagram as {format}");
				self.notify(Notice::success(format!("Diagram exported as {format}")));
			}
			Err(err) => {
				warn!("{format} export failed: {err}");
				self.notify(Notice::from(err));
			}
		}
	}
}

fn typing(ev: &Event) -> bool {
	ev.target()
		.and_then(|target| target.dyn_into::<HtmlElement>().ok())
		.is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

fn context_2d(element: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	element.get_context("2d").ok()??.dyn_into().ok()
}

fn pointer_at(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<Point> {
	let canvas = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some(Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Sizes the drawing area to the scroll container around the canvas.
fn fit_viewport(handle: CanvasHandle, element: &HtmlCanvasElement) {
	let (w, h) = element
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or(DEFAULT_VIEWPORT);
	handle.state.try_update_value(|s| s.resize(w, h));
}

fn download(file_name: &str, contents: &str, mime: &str) -> Result<()> {
	let parts = js_sys::Array::of1(&JsValue::from_str(contents));
	let options = BlobPropertyBag::new();
	options.set_type(mime);
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(js_err)?;
	let url = web_sys::Url::create_object_url_with_blob(&blob).map_err(js_err)?;

	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| CanvasError::persistence("no document to download into"))?;
	let anchor: HtmlAnchorElement = document
		.create_element("a")
		.map_err(js_err)?
		.dyn_into()
		.map_err(|_| CanvasError::persistence("could not create a download link"))?;
	anchor.set_href(&url);
	anchor.set_download(file_name);
	anchor.click();
	web_sys::Url::revoke_object_url(&url).map_err(js_err)?;
	Ok(())
}

/// Threat-model diagram editor: toolbar, drawing surface, dialogs and toasts.
///
/// `assets` and `threats` are the inventory records nodes may be linked to;
/// `threat_id` scopes saved diagrams and the load picker to one threat.
#[component]
pub fn ThreatModelCanvas(
	#[prop(default = None)] threat_id: Option<String>,
	#[prop(optional)] assets: Vec<LinkedRecord>,
	#[prop(optional)] threats: Vec<LinkedRecord>,
	#[prop(default = None)] config: Option<CanvasConfig>,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let handle = CanvasHandle::new(threat_id, &config);
	handle.edit(|s| s.seed_from_inventory(&assets));
	let inventory = StoredValue::new(Inventory { assets, threats });
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let window_listeners = StoredValue::new_local(Vec::<EventListener>::new());
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	Effect::new(move |_| {
		let Some(element) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = context_2d(&element) else {
			warn!("canvas 2d context unavailable");
			return;
		};
		fit_viewport(handle, &element);

		let resize_element = element.clone();
		let mut listeners = vec![EventListener::new(&window, "resize", move |_| {
			fit_viewport(handle, &resize_element);
		})];
		if let Some(document) = window.document() {
			listeners.push(EventListener::new(&document, "keydown", move |ev| {
				if let Some(ev) = ev.dyn_ref::<KeyboardEvent>() {
					handle.key_down(ev);
				}
			}));
		}
		window_listeners.set_value(listeners);

		let animate_inner = animate.clone();
		*animate.borrow_mut() = Some(Closure::new(move || {
			let alive = handle
				.state
				.try_update_value(|s| {
					if !s.needs_redraw() {
						return;
					}
					let size = s.canvas_size();
					let (w, h) = (size.width.ceil() as u32, size.height.ceil() as u32);
					if element.width() != w {
						element.set_width(w);
					}
					if element.height() != h {
						element.set_height(h);
					}
					render::render(s, &ctx);
					s.mark_drawn();
				})
				.is_some();
			if !alive {
				debug!("canvas disposed, stopping render loop");
				return;
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(cb) = animate.borrow().as_ref() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		ev.prevent_default();
		if let Some(at) = pointer_at(canvas_ref, &ev) {
			handle.pointer_down(at);
		}
	};
	let on_mousemove = move |ev: MouseEvent| {
		if let Some(at) = pointer_at(canvas_ref, &ev) {
			handle.pointer_move(at);
		}
	};
	let on_mouseup = move |ev: MouseEvent| {
		if let Some(at) = pointer_at(canvas_ref, &ev) {
			handle.pointer_up(at);
		}
	};

	let status = handle.status;
	let connecting = move || status.with(|s| s.mode == Mode::Connecting);
	let cursor = move || match status.with(|s| s.mode) {
		Mode::Connecting => "crosshair",
		Mode::Dragging => "grabbing",
		Mode::Idle => "default",
	};

	view! {
		<div class="threat-canvas">
			<div class="threat-canvas-toolbar">
				<button on:click=move |_| handle.add_asset(inventory)>"Add Asset"</button>
				<button on:click=move |_| handle.add_threat()>"Add Threat"</button>
				<button on:click=move |_| handle.add_trust_boundary()>"Add Trust Boundary"</button>
				<span class="separator" />
				<Show
					when=connecting
					fallback=move || {
						view! {
							<button
								disabled=move || status.with(|s| s.selected_node.is_none())
								on:click=move |_| handle.start_connection()
							>
								"Connect"
							</button>
						}
					}
				>
					<button on:click=move |_| handle.cancel_connection()>"Cancel Connection"</button>
				</Show>
				<button
					disabled=move || status.with(|s| s.selected_node.is_none())
					on:click=move |_| handle.edit_selected_node()
				>
					"Edit Node"
				</button>
				<button
					disabled=move || status.with(|s| s.selected_link.is_none())
					on:click=move |_| handle.toggle_link_kind()
				>
					"Toggle Link Type"
				</button>
				<button
					class="danger"
					disabled=move || {
						status.with(|s| s.selected_node.is_none() && s.selected_link.is_none())
					}
					on:click=move |_| handle.delete_selection()
				>
					"Delete"
				</button>
				<span class="separator" />
				<button on:click=move |_| handle.new_diagram()>"New"</button>
				<button on:click=move |_| handle.dialog.set(Some(Dialog::Save))>"Save"</button>
				<button on:click=move |_| handle.open_picker()>"Load"</button>
				<button on:click=move |_| handle.export_json()>"Export JSON"</button>
				<button on:click=move |_| handle.export_svg()>"Export SVG"</button>
			</div>

			<Show when=connecting>
				<div class="connection-banner">
					{move || {
						status
							.with(|s| {
								format!(
									"Connecting from \"{}\": click a target node, or the background to cancel",
									s.connection_source.clone().unwrap_or_default(),
								)
							})
					}}
				</div>
			</Show>

			<div
				class="threat-canvas-viewport"
				style="position: relative; overflow: auto; width: 100%; height: 70vh;"
			>
				<canvas
					node_ref=canvas_ref
					class="threat-canvas-surface"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					style=move || format!("display: block; cursor: {};", cursor())
				/>
			</div>

			<div class="threat-canvas-status">
				{move || {
					status
						.with(|s| {
							let name = if s.document.name.is_empty() {
								"Untitled diagram"
							} else {
								s.document.name.as_str()
							};
							let saved = if s.document.id.is_some() { "" } else { " (unsaved)" };
							format!("{name}{saved}: {} nodes, {} links", s.nodes, s.links)
						})
				}}
			</div>

			<div class="threat-canvas-notices">
				<For
					each=move || handle.notices.get()
					key=|(id, _)| *id
					children=move |(_, notice): (u64, Notice)| {
						view! {
							<div class=notice.level.css_class()>
								{notice.message}
							</div>
						}
					}
				/>
			</div>

			{move || {
				handle
					.dialog
					.get()
					.map(|dialog| match dialog {
						Dialog::Save => view! { <SaveDialog handle=handle /> }.into_any(),
						Dialog::Load => view! { <LoadDialog handle=handle /> }.into_any(),
						Dialog::EditNode(id) => {
							view! { <NodeDialog handle=handle id=id inventory=inventory /> }
								.into_any()
						}
					})
			}}
		</div>
	}
}

#[component]
fn SaveDialog(handle: CanvasHandle) -> impl IntoView {
	let document = handle.status.with_untracked(|s| s.document.clone());
	let name = RwSignal::new(document.name);
	let description = RwSignal::new(document.description);
	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		if handle.save(name.get_untracked(), description.get_untracked()) {
			handle.dialog.set(None);
		}
	};

	view! {
		<div class="dialog-backdrop">
			<form class="dialog" on:submit=on_submit>
				<h2>"Save Diagram"</h2>
				<label>
					"Name"
					<input
						type="text"
						prop:value=move || name.get()
						on:input=move |ev| name.set(event_target_value(&ev))
					/>
				</label>
				<label>
					"Description"
					<textarea
						prop:value=move || description.get()
						on:input=move |ev| description.set(event_target_value(&ev))
					></textarea>
				</label>
				<div class="dialog-actions">
					<button type="button" on:click=move |_| handle.dialog.set(None)>
						"Cancel"
					</button>
					<button type="submit">"Save"</button>
				</div>
			</form>
		</div>
	}
}

#[component]
fn LoadDialog(handle: CanvasHandle) -> impl IntoView {
	view! {
		<div class="dialog-backdrop">
			<div class="dialog">
				<h2>"Load Diagram"</h2>
				{move || match handle.summaries.get() {
					None => view! { <p>"Loading diagrams..."</p> }.into_any(),
					Some(list) if list.is_empty() => view! { <p>"No saved diagrams"</p> }.into_any(),
					Some(list) => {
						view! {
							<ul class="diagram-list">
								{list
									.into_iter()
									.map(|summary| summary_row(handle, summary))
									.collect_view()}
							</ul>
						}
							.into_any()
					}
				}}
				<div class="dialog-actions">
					<button type="button" on:click=move |_| handle.dialog.set(None)>
						"Close"
					</button>
				</div>
			</div>
		</div>
	}
}

fn summary_row(handle: CanvasHandle, summary: DiagramSummary) -> impl IntoView {
	let DiagramSummary {
		diagram_id,
		name,
		description,
		creator_name,
		updated_at,
		..
	} = summary;
	let updated = updated_at
		.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
		.unwrap_or_default();
	let byline = match creator_name {
		Some(creator) => format!("{updated} by {creator}"),
		None => updated,
	};
	let (open_id, delete_id) = (diagram_id.clone(), diagram_id);

	view! {
		<li>
			<div class="diagram-meta">
				<strong>{name}</strong>
				<span>{description.unwrap_or_default()}</span>
				<small>{byline}</small>
			</div>
			<button on:click=move |_| {
				handle.dialog.set(None);
				handle.load(open_id.clone());
			}>"Open"</button>
			<button class="danger" on:click=move |_| handle.delete_diagram(delete_id.clone())>
				"Delete"
			</button>
		</li>
	}
}

#[component]
fn NodeDialog(handle: CanvasHandle, id: String, inventory: StoredValue<Inventory>) -> impl IntoView {
	let Some((label, kind)) = handle
		.state
		.try_with_value(|s| s.editor.graph().node(&id).map(|n| (n.label.clone(), n.kind)))
		.flatten()
	else {
		return view! { <p class="dialog-missing">"That node no longer exists."</p> }.into_any();
	};

	let options = inventory.with_value(|inv| match kind {
		NodeKind::Asset => inv.assets.clone(),
		NodeKind::Threat => inv.threats.clone(),
		NodeKind::TrustBoundary => Vec::new(),
	});
	let records = StoredValue::new(options.clone());
	let draft = RwSignal::new(label);
	let choice = RwSignal::new(String::new());

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let chosen = choice.with_untracked(|choice| {
			records.with_value(|records| records.iter().find(|r| &r.id == choice).cloned())
		});
		if handle.update_node(&id, &draft.get_untracked(), chosen) {
			handle.dialog.set(None);
		}
	};

	let picker = (!options.is_empty()).then(|| {
		view! {
			<label>
				{format!("Link to {} record", kind.as_str())}
				<select on:change=move |ev| choice.set(event_target_value(&ev))>
					<option value="">"Not linked"</option>
					{options
						.into_iter()
						.map(|record| {
							let title = record.title().unwrap_or(&record.id).to_string();
							view! { <option value=record.id>{title}</option> }
						})
						.collect_view()}
				</select>
			</label>
		}
	});

	view! {
		<div class="dialog-backdrop">
			<form class="dialog" on:submit=on_submit>
				<h2>"Edit Node"</h2>
				<label>
					"Label"
					<input
						type="text"
						prop:value=move || draft.get()
						on:input=move |ev| draft.set(event_target_value(&ev))
					/>
				</label>
				{picker}
				<div class="dialog-actions">
					<button type="button" on:click=move |_| handle.dialog.set(None)>
						"Cancel"
					</button>
					<button type="submit">"Update"</button>
				</div>
			</form>
		</div>
	}
		.into_any()
}
