use remora::{
    GestureState, InteractionEffect, LatLng, PointerEvent, PositionUpdate, Projection, Result,
    ScreenPoint, Simulation, TickOutcome, point,
};

/// Equirectangular test projection whose scale stands in for the map zoom level.
struct Zoomable {
    origin: LatLng,
    scale: f64,
}

impl Zoomable {
    fn new(scale: f64) -> Self {
        Self {
            origin: LatLng::new(48.0, -3.0),
            scale,
        }
    }

    fn anchor_at(&self, x: f64, y: f64) -> LatLng {
        LatLng::new(self.origin.lat - y / self.scale, self.origin.lng + x / self.scale)
    }
}

impl Projection for Zoomable {
    fn project(&self, coord: LatLng) -> Result<ScreenPoint> {
        Ok(point(
            (coord.lng - self.origin.lng) * self.scale,
            (self.origin.lat - coord.lat) * self.scale,
        ))
    }

    fn unproject(&self, pixel: ScreenPoint) -> Result<LatLng> {
        Ok(self.anchor_at(pixel.x, pixel.y))
    }
}

fn position(sim: &Simulation, id: &str) -> ScreenPoint {
    sim.node_by_id(id)
        .and_then(|n| n.simulated_position())
        .expect("initialized")
}

fn two_station_sim(proj: &Zoomable) -> Simulation {
    let mut sim = Simulation::default();
    sim.register("a", proj.anchor_at(0.0, 0.0)).expect("a");
    sim.register("b", proj.anchor_at(200.0, 0.0)).expect("b");
    sim.set_target_radius("a", 10.0).expect("a radius");
    sim.set_target_radius("b", 10.0).expect("b radius");
    sim
}

fn drag(sim: &mut Simulation, id: &str, from: ScreenPoint, to: ScreenPoint, t0: u64) {
    let target = sim.registry().handle(id);
    sim.handle_pointer(
        PointerEvent::Down {
            pixel: from,
            target,
        },
        t0,
    );
    sim.handle_pointer(PointerEvent::Move { pixel: to }, t0 + 5);
    sim.handle_pointer(PointerEvent::Up { pixel: to }, t0 + 10);
}

#[test]
fn no_emissions_while_suspended() {
    let proj = Zoomable::new(1000.0);
    let mut sim = two_station_sim(&proj);
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());

    sim.begin_transition();
    let zoomed = Zoomable::new(2000.0);
    let mut updates: Vec<PositionUpdate> = Vec::new();
    for _ in 0..10 {
        let report = sim.tick(&zoomed, &mut updates);
        assert_eq!(report.outcome, TickOutcome::Suspended);
    }
    assert!(updates.is_empty());
    assert_eq!(position(&sim, "b"), proj.project(proj.anchor_at(200.0, 0.0)).expect("p"));
}

#[test]
fn transition_end_reseeds_at_the_new_scale_without_blending() {
    let proj = Zoomable::new(1000.0);
    let mut sim = two_station_sim(&proj);
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());

    sim.begin_transition();
    sim.end_transition();
    for (_, node) in sim.nodes() {
        assert_eq!(node.simulated_position(), None);
    }

    let zoomed = Zoomable::new(2000.0);
    let mut updates: Vec<PositionUpdate> = Vec::new();
    sim.tick(&zoomed, &mut updates);

    for id in ["a", "b"] {
        let node = sim.node_by_id(id).expect("node");
        let fresh = zoomed.project(node.anchor()).expect("projects");
        assert_eq!(node.simulated_position(), Some(fresh));
    }
    // b moved from ~200px to ~400px; a stayed at the origin.
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id.as_str(), "b");
}

#[test]
fn dragged_marker_returns_to_its_anchor_with_shrinking_steps() {
    let proj = Zoomable::new(1000.0);
    let mut sim = two_station_sim(&proj);
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());

    drag(&mut sim, "a", point(0.0, 0.0), point(0.0, 100.0), 0);
    assert_eq!(position(&sim, "a"), point(0.0, 100.0));

    let mut previous = f64::INFINITY;
    let mut settled_after = None;
    for tick in 0..12 {
        let report = sim.tick(&proj, &mut Vec::<PositionUpdate>::new());
        if report.max_displacement < 0.1 {
            settled_after = Some(tick);
            break;
        }
        assert!(
            report.max_displacement < previous,
            "tick {tick}: {} !< {previous}",
            report.max_displacement
        );
        previous = report.max_displacement;
    }
    assert!(settled_after.is_some_and(|t| t <= 6), "{settled_after:?}");

    for _ in 0..20 {
        sim.tick(&proj, &mut Vec::<PositionUpdate>::new());
    }
    assert!((position(&sim, "a") - point(0.0, 0.0)).length() < 0.1);
}

#[test]
fn pinned_marker_pushes_neighbours_without_being_pushed() {
    let proj = Zoomable::new(1000.0);
    let mut sim = two_station_sim(&proj);
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());

    let a = sim.registry().handle("a");
    sim.handle_pointer(
        PointerEvent::Down {
            pixel: point(0.0, 0.0),
            target: a,
        },
        0,
    );
    sim.handle_pointer(
        PointerEvent::Move {
            pixel: point(195.0, 0.0),
        },
        5,
    );
    assert!(sim.gesture().is_dragging());

    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());

    assert_eq!(position(&sim, "a"), point(195.0, 0.0));
    let gap = (position(&sim, "b") - position(&sim, "a")).length();
    assert!(gap >= 21.5 - 1e-9, "gap {gap}");
}

#[test]
fn uninvolved_markers_keep_relaxing_while_one_is_held() {
    let proj = Zoomable::new(1000.0);
    let mut sim = Simulation::default();
    sim.register("held", proj.anchor_at(0.0, 0.0)).expect("held");
    sim.register("x", proj.anchor_at(500.0, 0.0)).expect("x");
    sim.register("y", proj.anchor_at(505.0, 0.0)).expect("y");
    for id in ["held", "x", "y"] {
        sim.set_target_radius(id, 10.0).expect("radius");
    }

    let held = sim.registry().handle("held");
    sim.handle_pointer(
        PointerEvent::Down {
            pixel: point(0.0, 0.0),
            target: held,
        },
        0,
    );
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());

    let gap = (position(&sim, "y") - position(&sim, "x")).length();
    assert!(gap >= 21.5 - 1e-9, "gap {gap}");
}

#[test]
fn gesture_lifecycle_keeps_at_most_one_pin() {
    let proj = Zoomable::new(1000.0);
    let mut sim = two_station_sim(&proj);
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());
    let a = sim.registry().handle("a");
    let b = sim.registry().handle("b");

    let script = [
        PointerEvent::Down {
            pixel: point(0.0, 0.0),
            target: a,
        },
        PointerEvent::Move {
            pixel: point(10.0, 0.0),
        },
        PointerEvent::Down {
            pixel: point(200.0, 0.0),
            target: b,
        },
        PointerEvent::Move {
            pixel: point(220.0, 0.0),
        },
        PointerEvent::Up {
            pixel: point(220.0, 0.0),
        },
        PointerEvent::Click { target: b },
    ];
    for (t, event) in script.into_iter().enumerate() {
        sim.handle_pointer(event, t as u64);
        let pinned = sim.nodes().filter(|(h, _)| sim.registry().is_pinned(*h)).count();
        assert!(pinned <= 1);
        assert_eq!(sim.registry().pinned(), sim.gesture().active_node());
    }
    assert_eq!(sim.registry().pinned(), None);
}

#[test]
fn small_wiggle_is_a_click_and_large_move_is_a_drag() {
    let proj = Zoomable::new(1000.0);
    let mut sim = two_station_sim(&proj);
    sim.tick(&proj, &mut Vec::<PositionUpdate>::new());
    let a = sim.registry().handle("a");

    // <= 3px from the press point: click.
    sim.handle_pointer(
        PointerEvent::Down {
            pixel: point(0.0, 0.0),
            target: a,
        },
        0,
    );
    sim.handle_pointer(
        PointerEvent::Move {
            pixel: point(2.0, 2.0),
        },
        1,
    );
    sim.handle_pointer(
        PointerEvent::Up {
            pixel: point(2.0, 2.0),
        },
        2,
    );
    let effects = sim.handle_pointer(PointerEvent::Click { target: a }, 3);
    assert_eq!(effects, vec![InteractionEffect::SelectNode("a".into())]);

    // > 3px: drag, and the trailing click is swallowed.
    drag(&mut sim, "a", point(0.0, 0.0), point(4.0, 0.0), 1_000);
    let effects = sim.handle_pointer(PointerEvent::Click { target: a }, 1_011);
    assert!(effects.is_empty());
    let effects = sim.handle_pointer(PointerEvent::Click { target: None }, 1_012);
    assert!(effects.is_empty());
    assert!(matches!(sim.gesture(), GestureState::Released { .. }));

    // Once the window has passed, background clicks go through again.
    let effects = sim.handle_pointer(PointerEvent::Click { target: None }, 1_200);
    assert_eq!(effects, vec![InteractionEffect::SelectBackground]);
}

#[test]
fn drag_toggles_map_panning() {
    let mut sim = two_station_sim(&Zoomable::new(1000.0));
    let a = sim.registry().handle("a");

    let effects = sim.handle_pointer(
        PointerEvent::Down {
            pixel: point(0.0, 0.0),
            target: a,
        },
        0,
    );
    assert_eq!(effects, vec![InteractionEffect::SetMapPanning(false)]);
    let effects = sim.handle_pointer(
        PointerEvent::Up {
            pixel: point(0.0, 0.0),
        },
        1,
    );
    assert_eq!(effects, vec![InteractionEffect::SetMapPanning(true)]);

    let effects = sim.cancel_pointer();
    assert!(effects.is_empty());
}
