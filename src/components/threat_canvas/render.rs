use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::{Point, Rect};
use super::interaction::Selection;
use super::model::LINK_LABEL_SIZE;
use super::state::CanvasState;
use super::types::{Link, Node};

pub const GRID_SIZE: f64 = 20.0;
const ARROW_SIZE: f64 = 10.0;
const SELECTION_COLOR: &str = "#2563eb";
const LABEL_PADDING: f64 = 8.0;

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let size = state.canvas_size();
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(0.0, 0.0, size.width, size.height);
	draw_grid(ctx, size.width, size.height);

	let editor = &state.editor;
	let graph = editor.graph();
	let (selected_node, selected_link) = match editor.selection() {
		Selection::Node(id) => (Some(id.as_str()), None),
		Selection::Link(id) => (None, Some(id.as_str())),
		Selection::None => (None, None),
	};

	for link in graph.links() {
		let Some((from, to)) = graph.link_segment(link) else {
			continue;
		};
		draw_link(ctx, link, from, to, selected_link == Some(link.id.as_str()));
	}

	let source = editor.connection_source();
	for node in graph.nodes() {
		draw_node(
			ctx,
			node,
			selected_node == Some(node.id.as_str()),
			source == Some(node.id.as_str()),
		);
	}
}

fn draw_grid(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_stroke_style_str("#f1f5f9");
	ctx.set_line_width(1.0);
	ctx.begin_path();
	let mut x = 0.0;
	while x <= width {
		ctx.move_to(x + 0.5, 0.0);
		ctx.line_to(x + 0.5, height);
		x += GRID_SIZE;
	}
	let mut y = 0.0;
	while y <= height {
		ctx.move_to(0.0, y + 0.5);
		ctx.line_to(width, y + 0.5);
		y += GRID_SIZE;
	}
	ctx.stroke();
}

fn draw_link(ctx: &CanvasRenderingContext2d, link: &Link, from: Point, to: Point, selected: bool) {
	let color = if selected { SELECTION_COLOR } else { link.kind.color() };
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let dist = (dx * dx + dy * dy).sqrt();

	ctx.set_stroke_style_str(color);
	ctx.set_line_width(if selected { 3.0 } else { 2.0 });
	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.line_to(to.x, to.y);
	ctx.stroke();

	// Zero-length when the boxes overlap or the clip fell back to a centre.
	if dist > 0.001 {
		let (ux, uy) = (dx / dist, dy / dist);
		let (back_x, back_y) = (to.x - ux * ARROW_SIZE, to.y - uy * ARROW_SIZE);
		let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
		ctx.set_fill_style_str(color);
		ctx.begin_path();
		ctx.move_to(to.x, to.y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}

	let label = Rect::centered(from.midpoint(to), LINK_LABEL_SIZE);
	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(label.left(), label.top(), label.size.width, label.size.height);
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(1.0);
	ctx.stroke_rect(label.left(), label.top(), label.size.width, label.size.height);
	ctx.set_fill_style_str(color);
	ctx.set_font("10px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let center = label.center();
	let _ = ctx.fill_text(link.kind.label(), center.x, center.y);
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &Node, selected: bool, source: bool) {
	let rect = node.rect();
	let (x, y, w, h) = (rect.left(), rect.top(), rect.size.width, rect.size.height);
	let color = node.kind.color();

	ctx.set_fill_style_str(node.kind.tint());
	ctx.fill_rect(x, y, w, h);
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(2.0);
	if source {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(6.0),
			&JsValue::from_f64(4.0),
		));
	}
	ctx.stroke_rect(x, y, w, h);
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	if selected {
		ctx.set_stroke_style_str(SELECTION_COLOR);
		ctx.set_line_width(2.0);
		ctx.stroke_rect(x - 4.0, y - 4.0, w + 8.0, h + 8.0);
	}

	ctx.set_fill_style_str(color);
	ctx.set_font("bold 9px sans-serif");
	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	let _ = ctx.fill_text(&node.kind.as_str().to_uppercase(), x + 6.0, y + 6.0);

	ctx.set_fill_style_str("#111827");
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let center = rect.center();
	let label = fit_label(&node.label, w - 2.0 * LABEL_PADDING, |text| {
		ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
	});
	let _ = ctx.fill_text(&label, center.x, center.y);
}

/// Shortens `label` with a trailing ellipsis until `measure` says it fits
/// in `max_width`.
pub fn fit_label(label: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> String {
	if measure(label) <= max_width {
		return label.to_string();
	}
	let mut chars: Vec<char> = label.chars().collect();
	while !chars.is_empty() {
		chars.pop();
		let candidate: String = chars.iter().collect::<String>() + "…";
		if measure(&candidate) <= max_width {
			return candidate;
		}
	}
	"…".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn monospace(text: &str) -> f64 {
		text.chars().count() as f64 * 7.0
	}

	#[test]
	fn short_labels_are_untouched() {
		assert_eq!(fit_label("Payment API", 104.0, monospace), "Payment API");
	}

	#[test]
	fn long_labels_get_an_ellipsis() {
		let fitted = fit_label("Customer Identity Provider", 70.0, monospace);
		assert_eq!(fitted, "Customer …");
		assert!(monospace(&fitted) <= 70.0);
		assert_eq!(fit_label("abc", 0.0, monospace), "…");
	}
}
