use futures::executor::block_on;
use threat_model_canvas::components::threat_canvas::document::DiagramFilter;
use threat_model_canvas::components::threat_canvas::export::export_vector;
use threat_model_canvas::components::threat_canvas::geometry::Point;
use threat_model_canvas::components::threat_canvas::interaction::{Hit, Mode, Selection};
use threat_model_canvas::components::threat_canvas::notice::NoticeLevel;
use threat_model_canvas::components::threat_canvas::{
	CanvasState, Editor, LinkKind, MemoryStore, NodeKind, PersistenceAdapter,
};

fn click(editor: &mut Editor, at: Point) -> Option<NoticeLevel> {
	let hit = editor.hit_test(at);
	editor.pointer_down(hit, at);
	editor.pointer_up(at).map(|notice| notice.level)
}

#[test]
fn pci_flow_is_saved_listed_and_loaded() {
	let mut state = CanvasState::new(None, 800.0, 600.0);
	let asset = state.editor.add_asset(None);
	state.editor.rename_node(&asset, "Payment API").unwrap();
	let threat = state.editor.add_threat();
	state.editor.rename_node(&threat, "SQL Injection").unwrap();

	let graph = state.editor.graph();
	assert_eq!(graph.node(&asset).unwrap().position, Point::new(100.0, 100.0));
	assert_eq!(graph.node(&threat).unwrap().position, Point::new(250.0, 100.0));

	assert!(state.editor.start_connection().is_some());
	let target = state.editor.graph().node(&threat).unwrap().center();
	assert_eq!(state.editor.hit_test(target), Hit::Node(threat.clone()));
	assert_eq!(click(&mut state.editor, target), Some(NoticeLevel::Success));
	assert_eq!(state.editor.mode(), Mode::Idle);
	assert_eq!(state.editor.graph().links().len(), 1);

	let adapter = PersistenceAdapter::new(MemoryStore::default());
	let ticket = state.begin_save();
	let mut diagram = state.diagram();
	diagram.name = "PCI Flow".into();
	let id = block_on(adapter.save(&mut diagram)).unwrap();
	assert!(state.finish_save(ticket, &diagram));
	assert_eq!(state.document.id.as_deref(), Some(id.as_str()));

	let summaries = block_on(adapter.list(&DiagramFilter::default())).unwrap();
	assert!(summaries.iter().any(|s| s.name == "PCI Flow" && s.diagram_id == id));

	state.new_diagram();
	assert!(state.editor.graph().is_empty());

	let ticket = state.begin_load();
	let loaded = block_on(adapter.load(&id)).unwrap();
	assert_eq!(loaded.nodes.len(), 2);
	assert_eq!(loaded.links.len(), 1);
	assert_eq!(loaded.links[0].kind, LinkKind::DataFlow);
	assert!(state.finish_load(ticket, loaded));

	let graph = state.editor.graph();
	assert_eq!(graph.nodes().len(), 2);
	assert_eq!(graph.node(&asset).unwrap().label, "Payment API");
	assert_eq!(graph.node(&threat).unwrap().kind, NodeKind::Threat);
	assert!(graph.links()[0].joins(&asset, &threat));
	assert_eq!(state.document.name, "PCI Flow");

	let svg = export_vector(&state.diagram(), state.canvas_size());
	assert_eq!(svg.matches("<rect").count(), 2);
	assert_eq!(svg.matches("<line").count(), 1);
}

#[test]
fn deleting_the_pending_source_ends_connection_mode() {
	let mut editor = Editor::new();
	let source = editor.add_asset(None);
	let other = editor.add_threat();
	assert_eq!(editor.selection(), &Selection::Node(source.clone()));

	editor.start_connection();
	assert_eq!(editor.mode(), Mode::Connecting);
	editor.remove_node(&source).unwrap();
	assert_eq!(editor.mode(), Mode::Idle);

	let at = editor.graph().node(&other).unwrap().center();
	assert_eq!(click(&mut editor, at), None);
	assert!(editor.graph().links().is_empty());
	assert_eq!(editor.selection(), &Selection::Node(other));
}
