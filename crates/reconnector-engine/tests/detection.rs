//! End-to-end detection scenarios over hand-built documents.

use std::time::{Duration, Instant};

use reconnector_engine::{
    ChangeScheduler, Command, Detector, Dom, MutationRecord, NodeId, Notify, PointerEventKind,
    Rect, DEFAULT_SELECTORS,
};

#[derive(Default)]
struct Flashes(usize);

impl Notify for Flashes {
    fn show(&mut self) {
        self.0 += 1;
    }
}

fn native_clicks(dom: &Dom) -> Vec<NodeId> {
    dom.commands()
        .iter()
        .filter_map(|c| match c {
            Command::NativeClick { node } => Some(*node),
            _ => None,
        })
        .collect()
}

#[test]
fn test_modal_button_becomes_visible() {
    let mut dom = Dom::new();
    let body = dom.create_body();
    let button = dom
        .append(body, "button")
        .attr("data-testid", "modal__accept-button")
        .text("Reconnect")
        .style("display", "none")
        .matches(DEFAULT_SELECTORS[0])
        .id();

    let detector = Detector::default();
    let mut flashes = Flashes::default();

    assert!(!detector.attempt_activation(&mut dom, &mut flashes));
    assert_eq!(flashes.0, 0);

    // The stream drops and the modal is shown.
    dom.set_style(button, "display", "");
    dom.set_rect(button, Rect::new(600.0, 400.0, 120.0, 36.0));

    assert!(detector.attempt_activation(&mut dom, &mut flashes));
    assert_eq!(native_clicks(&dom), [button]);
    assert_eq!(flashes.0, 1);

    let dispatched: Vec<_> = dom
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Dispatch { event, .. } => Some(event.kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        dispatched,
        [
            PointerEventKind::MouseOver,
            PointerEventKind::MouseDown,
            PointerEventKind::MouseUp,
            PointerEventKind::Click,
        ]
    );
}

#[test]
fn test_inserted_japanese_button_div() {
    let mut dom = Dom::new();
    let body = dom.create_body();
    dom.append(body, "div").class("player").size(640.0, 360.0);

    let mut scheduler = ChangeScheduler::default();
    let detector = Detector::default();
    let mut flashes = Flashes::default();

    let inserted = dom.append(body, "div").class("btn").text("再接続").size(80.0, 30.0).id();
    let batch = [MutationRecord::child_list(1)];

    assert!(scheduler.on_mutations(&batch, Instant::now()));
    assert!(detector.attempt_activation(&mut dom, &mut flashes));
    assert_eq!(native_clicks(&dom), [inserted]);
    assert_eq!(flashes.0, 1);
}

#[test]
fn test_button_inside_nested_shadow_roots() {
    let mut dom = Dom::new();
    let body = dom.create_body();
    let app = dom.append_element(body, "ring-app");
    let app_root = dom.attach_shadow(app).unwrap();
    let player = dom.append_element(app_root, "live-player");
    let player_root = dom.attach_shadow(player).unwrap();
    let overlay = dom.append(player_root, "div").class("overlay").id();
    let button = dom
        .append(overlay, "div")
        .attr("role", "button")
        .text("Połącz ponownie")
        .size(100.0, 40.0)
        .id();

    let found = Detector::default().find_control(&dom).unwrap();
    assert_eq!(found.node, button);
    assert_eq!(found.strategy, "deep scan");
}

#[test]
fn test_one_activation_per_invocation() {
    let mut dom = Dom::new();
    let body = dom.create_body();
    for _ in 0..3 {
        dom.append(body, "button").text("Reconnect").size(80.0, 30.0);
    }

    let detector = Detector::default();
    let mut flashes = Flashes::default();
    assert!(detector.attempt_activation(&mut dom, &mut flashes));
    assert_eq!(native_clicks(&dom).len(), 1);
    assert_eq!(flashes.0, 1);

    dom.take_commands();
    assert!(detector.attempt_activation(&mut dom, &mut flashes));
    assert_eq!(native_clicks(&dom).len(), 1);
    assert_eq!(flashes.0, 2);
}

#[test]
fn test_debounced_batches_invoke_once() {
    let mut scheduler = ChangeScheduler::new(Duration::from_secs(2), Duration::from_millis(250));
    let t0 = Instant::now();
    let batch = [MutationRecord::attribute("class")];

    let invocations = [t0, t0 + Duration::from_millis(50)]
        .into_iter()
        .filter(|&at| scheduler.on_mutations(&batch, at))
        .count();
    assert_eq!(invocations, 1);
}

#[test]
fn test_hidden_candidates_are_skipped() {
    let mut dom = Dom::new();
    let body = dom.create_body();
    dom.append(body, "button")
        .text("Reconnect")
        .attr("hidden", "")
        .size(80.0, 30.0);
    dom.append(body, "button").text("Reconnect");
    let shown = dom
        .append(body, "a")
        .class("link-button")
        .text("Reconnect again")
        .size(80.0, 30.0)
        .id();

    assert_eq!(Detector::default().find_control(&dom).unwrap().node, shown);
}
