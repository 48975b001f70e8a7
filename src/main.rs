use leptos::prelude::*;
use threat_model_canvas::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App);
}
