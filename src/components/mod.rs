pub mod threat_canvas;
