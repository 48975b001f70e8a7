//! Store-independent exports: a portable JSON document and an SVG image.

use std::fmt::{self, Write};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::document::{LinkRecord, NodeRecord};
use super::error::Result;
use super::geometry::{Size, clipped_segment};
use super::types::{Diagram, LinkKind};

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortableExport {
	pub nodes: Vec<NodeRecord>,
	pub links: Vec<LinkRecord>,
	#[serde(rename = "exportedAt")]
	pub exported_at: DateTime<Utc>,
	pub version: String,
}

impl PortableExport {
	pub fn new(diagram: &Diagram, exported_at: DateTime<Utc>) -> Self {
		Self {
			nodes: diagram.nodes.iter().map(NodeRecord::from).collect(),
			links: diagram.links.iter().map(LinkRecord::from).collect(),
			exported_at,
			version: EXPORT_FORMAT_VERSION.to_string(),
		}
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

/// `threat-model-2024-05-01.json` style download name.
pub fn export_file_name(date: NaiveDate, extension: &str) -> String {
	format!("threat-model-{}.{extension}", date.format("%Y-%m-%d"))
}

fn escape_xml(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			_ => out.push(c),
		}
	}
	out
}

fn marker_id(kind: LinkKind) -> &'static str {
	match kind {
		LinkKind::DataFlow => "arrow-data-flow",
		LinkKind::Dependency => "arrow-dependency",
	}
}

/// Renders the diagram as a standalone SVG document of `size`.
///
/// Each node becomes a `rect` plus a centered `text`; each link a `line`
/// clipped to both node borders. Links with an endpoint that does not
/// resolve are left out.
pub fn export_vector(diagram: &Diagram, size: Size) -> String {
	let mut svg = String::new();
	// Writing into a String cannot fail.
	let _ = write_svg(&mut svg, diagram, size);
	svg
}

fn write_svg(out: &mut impl Write, diagram: &Diagram, size: Size) -> fmt::Result {
	writeln!(
		out,
		r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
		w = size.width,
		h = size.height
	)?;

	writeln!(out, "<defs>")?;
	for kind in [LinkKind::DataFlow, LinkKind::Dependency] {
		writeln!(
			out,
			r#"<marker id="{}" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto"><polygon points="0 0, 10 3, 0 6" fill="{}"/></marker>"#,
			marker_id(kind),
			kind.color()
		)?;
	}
	writeln!(out, "</defs>")?;

	for node in &diagram.nodes {
		let center = node.center();
		writeln!(
			out,
			r##"<rect x="{}" y="{}" width="{}" height="{}" fill="{color}" fill-opacity="0.2" stroke="{color}" stroke-width="1"/>"##,
			node.position.x,
			node.position.y,
			node.size.width,
			node.size.height,
			color = node.kind.color()
		)?;
		writeln!(
			out,
			r##"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" fill="#000" font-size="12" font-family="sans-serif">{}</text>"##,
			center.x,
			center.y,
			escape_xml(&node.label)
		)?;
	}

	for (link, source, target) in diagram.resolved_links() {
		let (from, to) = clipped_segment(&source.rect(), &target.rect());
		writeln!(
			out,
			r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2" marker-end="url(#{})"/>"#,
			from.x,
			from.y,
			to.x,
			to.y,
			link.kind.color(),
			marker_id(link.kind)
		)?;
	}

	writeln!(out, "</svg>")
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::super::geometry::Point;
	use super::super::types::{Link, Node, NodeKind};
	use super::*;

	fn sample() -> Diagram {
		let node = |id: &str, kind: NodeKind, x: f64, label: &str| Node {
			id: id.into(),
			kind,
			position: Point::new(x, 100.0),
			size: kind.default_size(),
			label: label.into(),
			linked_record: None,
			extra: None,
		};
		let link = |id: &str, source: &str, target: &str| Link {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind: LinkKind::DataFlow,
		};
		Diagram {
			nodes: vec![
				node("a", NodeKind::Asset, 100.0, "Payment API"),
				node("t", NodeKind::Threat, 300.0, "<script> & co"),
			],
			links: vec![link("l1", "a", "t"), link("l2", "a", "gone")],
			..Diagram::default()
		}
	}

	#[test]
	fn portable_export_shape() {
		let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
		let json = PortableExport::new(&sample(), at).to_json().unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["version"], "1.0");
		assert_eq!(value["exportedAt"], "2024-05-01T12:00:00Z");
		assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
		assert_eq!(value["links"][0]["type"], "data-flow");
	}

	#[test]
	fn vector_export_skips_dangling_links() {
		let svg = export_vector(&sample(), Size::new(800.0, 600.0));
		assert!(svg.starts_with("<svg"));
		assert!(svg.contains(r#"width="800" height="600""#));
		assert_eq!(svg.matches("<rect").count(), 2);
		assert_eq!(svg.matches("<text").count(), 2);
		assert_eq!(svg.matches("<line").count(), 1);
		// a spans x 100..220, t spans 300..420, both centred on y 140
		assert!(svg.contains(r#"x1="220" y1="140" x2="300" y2="140""#));
	}

	#[test]
	fn vector_export_escapes_labels() {
		let svg = export_vector(&sample(), Size::new(10.0, 10.0));
		assert!(svg.contains("&lt;script&gt; &amp; co"));
		assert!(!svg.contains("<script>"));
	}

	#[test]
	fn vector_export_is_well_formed() {
		let svg = export_vector(&Diagram::default(), Size::new(10.0, 10.0));
		assert!(svg.ends_with("</svg>\n"));
		assert_eq!(svg.matches("<marker").count(), 2);
		assert!(svg.contains("<defs>\n"));
	}

	#[test]
	fn file_names_use_the_date() {
		let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
		assert_eq!(export_file_name(date, "svg"), "threat-model-2024-05-01.svg");
	}
}
