//! Box clipping for link endpoints.
//!
//! Links are drawn between node centers but must terminate at the visible
//! border of each box. [`edge_intersection`] finds where the ray from a box's
//! centroid toward another point leaves the box.

use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

/// A point in canvas space (top-left origin, y grows downward).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}

	pub fn midpoint(self, other: Point) -> Point {
		Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
	}
}

/// Width and height of a node's bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Both dimensions are finite and strictly positive.
	pub fn is_valid(self) -> bool {
		self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
	}
}

/// Axis-aligned box given by its top-left corner and size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub origin: Point,
	pub size: Size,
}

impl Rect {
	pub const fn new(origin: Point, size: Size) -> Self {
		Self { origin, size }
	}

	pub fn centered(center: Point, size: Size) -> Self {
		Self::new(
			Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
			size,
		)
	}

	pub fn left(&self) -> f64 {
		self.origin.x
	}

	pub fn top(&self) -> f64 {
		self.origin.y
	}

	pub fn right(&self) -> f64 {
		self.origin.x + self.size.width
	}

	pub fn bottom(&self) -> f64 {
		self.origin.y + self.size.height
	}

	pub fn center(&self) -> Point {
		Point::new(
			self.origin.x + self.size.width / 2.0,
			self.origin.y + self.size.height / 2.0,
		)
	}

	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
	}

	/// Overlap test with both boxes grown by `margin` on their far sides.
	pub fn overlaps(&self, other: &Rect, margin: f64) -> bool {
		self.left() < other.right() + margin
			&& self.right() + margin > other.left()
			&& self.top() < other.bottom() + margin
			&& self.bottom() + margin > other.top()
	}
}

/// Point where the ray from `center` toward `target` leaves `rect`.
///
/// `center` is expected to be the centroid of `rect`. Each of the four edges
/// is intersected with the line through `center` and `target`; hits outside
/// the finite edge segment or behind `center` are discarded and the farthest
/// remaining hit wins. When nothing qualifies (the target coincides with the
/// center, or the direction is otherwise degenerate) the center itself is
/// returned, yielding a zero-length stub instead of an error.
pub fn edge_intersection(center: Point, target: Point, rect: &Rect) -> Point {
	let (dx, dy) = (target.x - center.x, target.y - center.y);
	let mut hits: Vec<Point> = Vec::with_capacity(4);

	// Horizontal edges: solve for x at fixed y.
	if dy.abs() > EPSILON {
		for y in [rect.top(), rect.bottom()] {
			let x = center.x + (y - center.y) * dx / dy;
			if x >= rect.left() - EPSILON && x <= rect.right() + EPSILON {
				hits.push(Point::new(x, y));
			}
		}
	}

	// Vertical edges: solve for y at fixed x.
	if dx.abs() > EPSILON {
		for x in [rect.left(), rect.right()] {
			let y = center.y + (x - center.x) * dy / dx;
			if y >= rect.top() - EPSILON && y <= rect.bottom() + EPSILON {
				hits.push(Point::new(x, y));
			}
		}
	}

	hits.into_iter()
		.filter(|p| (p.x - center.x) * dx + (p.y - center.y) * dy > 0.0)
		.max_by(|a, b| center.distance(*a).total_cmp(&center.distance(*b)))
		.unwrap_or(center)
}

/// Endpoints of a link between two boxes, each clipped to its own border.
pub fn clipped_segment(source: &Rect, target: &Rect) -> (Point, Point) {
	let (sc, tc) = (source.center(), target.center());
	(
		edge_intersection(sc, tc, source),
		edge_intersection(tc, sc, target),
	)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	if len_sq < EPSILON {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn square() -> Rect {
		Rect::new(Point::new(-10.0, -10.0), Size::new(20.0, 20.0))
	}

	fn assert_close(actual: Point, expected: Point) {
		assert!(
			actual.distance(expected) < 1e-6,
			"expected {expected:?}, got {actual:?}"
		);
	}

	#[test]
	fn exits_through_right_edge() {
		let p = edge_intersection(Point::new(0.0, 0.0), Point::new(100.0, 0.0), &square());
		assert_close(p, Point::new(10.0, 0.0));
	}

	#[test]
	fn exits_through_bottom_edge() {
		let p = edge_intersection(Point::new(0.0, 0.0), Point::new(0.0, 100.0), &square());
		assert_close(p, Point::new(0.0, 10.0));
	}

	#[test]
	fn exits_through_left_and_top_edges() {
		let c = Point::new(0.0, 0.0);
		assert_close(
			edge_intersection(c, Point::new(-50.0, 0.0), &square()),
			Point::new(-10.0, 0.0),
		);
		assert_close(
			edge_intersection(c, Point::new(0.0, -50.0), &square()),
			Point::new(0.0, -10.0),
		);
	}

	#[test]
	fn diagonal_hits_the_corner() {
		let p = edge_intersection(Point::new(0.0, 0.0), Point::new(30.0, 30.0), &square());
		assert_close(p, Point::new(10.0, 10.0));
	}

	#[test]
	fn wide_box_clips_on_the_short_side() {
		let rect = Rect::new(Point::new(100.0, 100.0), Size::new(120.0, 80.0));
		let p = edge_intersection(rect.center(), Point::new(160.0, 400.0), &rect);
		assert_close(p, Point::new(160.0, 180.0));
	}

	#[test]
	fn target_at_center_falls_back_to_center() {
		let c = Point::new(0.0, 0.0);
		assert_eq!(edge_intersection(c, c, &square()), c);
	}

	#[test]
	fn clipped_segment_ends_on_both_borders() {
		let a = Rect::new(Point::new(0.0, 0.0), Size::new(20.0, 20.0));
		let b = Rect::new(Point::new(100.0, 0.0), Size::new(20.0, 20.0));
		let (from, to) = clipped_segment(&a, &b);
		assert_close(from, Point::new(20.0, 10.0));
		assert_close(to, Point::new(100.0, 10.0));
	}

	#[test]
	fn overlap_honours_margin() {
		let a = Rect::new(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
		let b = Rect::new(Point::new(110.0, 0.0), Size::new(100.0, 100.0));
		assert!(!a.overlaps(&b, 0.0));
		assert!(a.overlaps(&b, 20.0));
	}

	#[test]
	fn segment_distance() {
		let (a, b) = (Point::new(0.0, 0.0), Point::new(10.0, 0.0));
		assert!((distance_to_segment(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-9);
		assert!((distance_to_segment(Point::new(-4.0, 0.0), a, b) - 4.0).abs() < 1e-9);
	}
}
