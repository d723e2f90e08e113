//! Per-frame relaxation: re-project anchors, then alternate anchor-pull and pairwise circle
//! separation for a fixed number of iterations, then emit moved markers.
//!
//! This is an approximate relaxation rather than an exact constraint solve. Its quality is
//! governed by [`SolverConfig::iterations`]: every pass lets corrections travel one more hop
//! through a chain of touching circles.

use crate::config::SolverConfig;
use crate::geom::{ScreenPoint, is_finite};
use crate::projection::Projection;
use crate::registry::NodeRegistry;
use crate::sink::RenderSink;
use serde::Serialize;

/// Scratch state for one node during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: ScreenPoint,
    pub target: ScreenPoint,
    pub radius: f64,
    pub pinned: bool,
}

impl Body {
    fn collides(&self) -> bool {
        self.radius > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Seeding, relaxation and emission ran.
    Ran,
    /// Viewport transition in progress; nothing was touched.
    Suspended,
    /// The projection could not map every anchor; nothing was touched.
    ProjectionUnavailable,
    /// No nodes registered.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Position updates sent to the sink.
    pub emitted: usize,
    /// Largest simulated-position change of any node during this tick (px).
    pub max_displacement: f64,
}

impl TickReport {
    pub(crate) fn skipped(outcome: TickOutcome) -> Self {
        Self {
            outcome,
            emitted: 0,
            max_displacement: 0.0,
        }
    }
}

/// Runs one relaxation tick against `registry`.
///
/// Either every anchor projects to a finite pixel and the whole tick runs, or nothing in the
/// registry is modified.
pub fn tick(
    registry: &mut NodeRegistry,
    config: &SolverConfig,
    projection: &dyn Projection,
    sink: &mut dyn RenderSink,
) -> TickReport {
    if registry.is_empty() {
        return TickReport::skipped(TickOutcome::Empty);
    }

    let Some(mut bodies) = seed_bodies(registry, projection) else {
        return TickReport::skipped(TickOutcome::ProjectionUnavailable);
    };
    let seeded: Vec<ScreenPoint> = bodies.iter().map(|b| b.pos).collect();

    relax(&mut bodies, config);

    let mut emitted = 0usize;
    let mut max_displacement = 0.0f64;
    for ((node, body), start) in registry.nodes_mut().zip(&bodies).zip(seeded) {
        // A malformed position is re-seeded from its anchor instead of poisoning later ticks.
        let pos = if is_finite(body.pos) {
            body.pos
        } else {
            tracing::warn!(node = %node.id(), "non-finite simulated position; re-seeding");
            body.target
        };
        max_displacement = max_displacement.max((pos - start).length());
        node.simulated = Some(pos);
        node.target = Some(body.target);

        let moved = match node.rendered {
            None => true,
            Some(prev) => {
                (pos.x - prev.x).abs() > config.emit_threshold
                    || (pos.y - prev.y).abs() > config.emit_threshold
            }
        };
        if moved {
            sink.position_changed(node.id(), pos);
            node.rendered = Some(pos);
            emitted += 1;
        }
    }

    tracing::trace!(
        nodes = bodies.len(),
        emitted,
        max_displacement,
        "solver tick"
    );
    TickReport {
        outcome: TickOutcome::Ran,
        emitted,
        max_displacement,
    }
}

/// Step 1: project every anchor. Uninitialized (or non-finite) positions start on their target
/// so markers never slide in from a stale location.
fn seed_bodies(registry: &NodeRegistry, projection: &dyn Projection) -> Option<Vec<Body>> {
    let mut bodies = Vec::with_capacity(registry.len());
    for (handle, node) in registry.iter() {
        let target = match projection.project(node.anchor()) {
            Ok(p) if is_finite(p) => p,
            Ok(_) | Err(_) => return None,
        };
        let pos = node
            .simulated_position()
            .filter(|p| is_finite(*p))
            .unwrap_or(target);
        bodies.push(Body {
            pos,
            target,
            radius: node.target_radius(),
            pinned: registry.is_pinned(handle),
        });
    }
    Some(bodies)
}

/// Anchor pull followed by pairwise separation, repeated `config.iterations` times.
pub fn relax(bodies: &mut [Body], config: &SolverConfig) {
    for _ in 0..config.iterations {
        pull_toward_anchors(bodies, config.return_factor);
        separate(bodies, config);
    }
}

/// First-order exponential approach; no velocity survives between iterations.
pub fn pull_toward_anchors(bodies: &mut [Body], return_factor: f64) {
    for body in bodies.iter_mut().filter(|b| !b.pinned) {
        body.pos += (body.target - body.pos) * return_factor;
    }
}

/// Pushes overlapping circle pairs apart along their center axis, visiting pairs `(i, j)` with
/// `i < j` in registration order.
pub fn separate(bodies: &mut [Body], config: &SolverConfig) {
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.collides() {
            continue;
        }
        for b in tail.iter_mut().filter(|b| b.collides()) {
            resolve_pair(a, b, config);
        }
    }
}

fn resolve_pair(a: &mut Body, b: &mut Body, config: &SolverConfig) {
    let min_dist = a.radius + b.radius + config.padding;
    let mut delta = b.pos - a.pos;
    if delta.square_length() >= min_dist * min_dist {
        return;
    }

    let mut dist = delta.length();
    if dist == 0.0 {
        delta = config.coincident_nudge;
        dist = delta.length();
    }

    let penetration = min_dist - dist;
    let half = delta / dist * (penetration * 0.5);

    // The pinned body is immovable: its partner absorbs the whole penetration.
    if a.pinned {
        b.pos += half * 2.0;
    } else if b.pinned {
        a.pos -= half * 2.0;
    } else {
        a.pos -= half;
        b.pos += half;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;

    fn body(x: f64, y: f64, radius: f64) -> Body {
        Body {
            pos: point(x, y),
            target: point(x, y),
            radius,
            pinned: false,
        }
    }

    #[test]
    fn anchor_pull_is_a_fixed_fraction() {
        let mut bodies = [Body {
            pos: point(0.0, 0.0),
            target: point(10.0, -20.0),
            radius: 5.0,
            pinned: false,
        }];
        pull_toward_anchors(&mut bodies, 0.2);
        assert_eq!(bodies[0].pos, point(2.0, -4.0));
    }

    #[test]
    fn pinned_body_is_not_pulled() {
        let mut bodies = [Body {
            pos: point(0.0, 0.0),
            target: point(10.0, 0.0),
            radius: 5.0,
            pinned: true,
        }];
        pull_toward_anchors(&mut bodies, 0.2);
        assert_eq!(bodies[0].pos, point(0.0, 0.0));
    }

    #[test]
    fn overlap_is_split_evenly() {
        let cfg = SolverConfig::default();
        let mut bodies = [body(0.0, 0.0, 10.0), body(10.0, 0.0, 10.0)];
        separate(&mut bodies, &cfg);
        // min distance 21.5, penetration 11.5, each moves 5.75.
        assert!((bodies[0].pos.x - -5.75).abs() < 1e-12);
        assert!((bodies[1].pos.x - 15.75).abs() < 1e-12);
        assert_eq!(bodies[0].pos.y, 0.0);
    }

    #[test]
    fn pinned_partner_absorbs_full_penetration() {
        let cfg = SolverConfig::default();
        let mut bodies = [body(0.0, 0.0, 10.0), body(10.0, 0.0, 10.0)];
        bodies[0].pinned = true;
        separate(&mut bodies, &cfg);
        assert_eq!(bodies[0].pos, point(0.0, 0.0));
        assert!((bodies[1].pos.x - 21.5).abs() < 1e-12);

        let mut bodies = [body(0.0, 0.0, 10.0), body(10.0, 0.0, 10.0)];
        bodies[1].pinned = true;
        separate(&mut bodies, &cfg);
        assert_eq!(bodies[1].pos, point(10.0, 0.0));
        assert!((bodies[0].pos.x - -11.5).abs() < 1e-12);
    }

    #[test]
    fn coincident_centers_use_the_nudge_axis() {
        let cfg = SolverConfig::default();
        let mut bodies = [body(5.0, 5.0, 4.0), body(5.0, 5.0, 4.0)];
        separate(&mut bodies, &cfg);
        let d = bodies[1].pos - bodies[0].pos;
        assert!(d.x > 0.0);
        assert_eq!(d.y, 0.0);
        // Penetration is measured against the nominal 0.01 px gap, not the true zero gap.
        assert!((d.x - 9.49).abs() < 1e-9, "got {}", d.x);
    }

    #[test]
    fn zero_radius_never_separates() {
        let cfg = SolverConfig::default();
        let mut bodies = [body(0.0, 0.0, 0.0), body(0.0, 0.0, 8.0), body(1.0, 0.0, 0.0)];
        separate(&mut bodies, &cfg);
        assert_eq!(bodies[0].pos, point(0.0, 0.0));
        assert_eq!(bodies[1].pos, point(0.0, 0.0));
        assert_eq!(bodies[2].pos, point(1.0, 0.0));
    }

    #[test]
    fn relax_resolves_a_single_pair_completely() {
        let cfg = SolverConfig::default();
        let mut bodies = [body(0.0, 0.0, 20.0), body(3.0, 4.0, 20.0)];
        relax(&mut bodies, &cfg);
        let dist = (bodies[1].pos - bodies[0].pos).length();
        assert!(dist >= 41.5 - 1e-9, "dist {dist}");
    }
}
