//! Pointer disambiguation: click vs. drag on markers, and click suppression after a drag.
//!
//! ```text
//!            down(node)            move > threshold
//!   Idle ───────────────► Armed ───────────────────► Dragging
//!    ▲  ▲                   │ up (click follows)        │ up
//!    │  └───────────────────┘                           ▼
//!    └──────────── deadline / down(node) ──────────  Released
//! ```
//!
//! All transitions go through [`InteractionController::handle`]. Side effects on the host map
//! are returned as [`InteractionEffect`]s rather than performed here.

use crate::config::InteractionConfig;
use crate::geom::{ScreenPoint, is_finite};
use crate::registry::{NodeHandle, NodeId, NodeRegistry};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer pressed; `target` is the marker under the pointer, if any.
    Down {
        pixel: ScreenPoint,
        target: Option<NodeHandle>,
    },
    Move {
        pixel: ScreenPoint,
    },
    Up {
        pixel: ScreenPoint,
    },
    /// The click the host dispatches after a down/up pair.
    Click {
        target: Option<NodeHandle>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Pointer is down on a pinned node but has not yet moved past the drag threshold.
    Armed {
        node: NodeHandle,
        origin: ScreenPoint,
    },
    /// Pointer moves overwrite the pinned node's position.
    Dragging {
        node: NodeHandle,
        origin: ScreenPoint,
    },
    /// A drag just ended; clicks are swallowed until the deadline (host clock, ms).
    Released { suppress_until_ms: u64 },
}

impl GestureState {
    /// The node held by the current pointer session, if any.
    pub fn active_node(&self) -> Option<NodeHandle> {
        match *self {
            GestureState::Armed { node, .. } | GestureState::Dragging { node, .. } => Some(node),
            GestureState::Idle | GestureState::Released { .. } => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, GestureState::Dragging { .. })
    }
}

/// Host-side consequences of a pointer event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", content = "args", rename_all = "snake_case")]
pub enum InteractionEffect {
    /// Enable/disable the map's own pan-drag so it does not fight a marker drag.
    SetMapPanning(bool),
    /// Move the marker now, independent of the tick cadence.
    MoveMarker { id: NodeId, pixel: ScreenPoint },
    /// A plain click landed on a marker.
    SelectNode(NodeId),
    /// A plain click landed on the map background.
    SelectBackground,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: GestureState,
    config: InteractionConfig,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            state: GestureState::Idle,
            config,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Applies one pointer event at host time `now_ms` and returns the effects to perform.
    pub fn handle(
        &mut self,
        registry: &mut NodeRegistry,
        event: PointerEvent,
        now_ms: u64,
    ) -> Vec<InteractionEffect> {
        self.expire(now_ms);

        let mut effects = Vec::new();
        let next = match (self.state, event) {
            (state, PointerEvent::Down { pixel, target: Some(node) }) => {
                self.arm(registry, state, node, pixel, &mut effects)
            }
            // A press on the background belongs to the map's own pan handling.
            (state, PointerEvent::Down { target: None, .. }) => state,

            (GestureState::Armed { node, origin }, PointerEvent::Move { pixel }) => {
                if !is_finite(pixel) || (pixel - origin).length() <= self.config.drag_threshold {
                    GestureState::Armed { node, origin }
                } else {
                    tracing::debug!(node = node.index(), "drag started");
                    drag_to(registry, node, pixel, &mut effects);
                    GestureState::Dragging { node, origin }
                }
            }
            (GestureState::Dragging { node, origin }, PointerEvent::Move { pixel }) => {
                if is_finite(pixel) {
                    drag_to(registry, node, pixel, &mut effects);
                }
                GestureState::Dragging { node, origin }
            }
            (state, PointerEvent::Move { .. }) => state,

            (GestureState::Armed { .. }, PointerEvent::Up { .. }) => {
                registry.unpin();
                effects.push(InteractionEffect::SetMapPanning(true));
                GestureState::Idle
            }
            (GestureState::Dragging { node, .. }, PointerEvent::Up { .. }) => {
                registry.unpin();
                effects.push(InteractionEffect::SetMapPanning(true));
                tracing::debug!(node = node.index(), "drag released");
                GestureState::Released {
                    suppress_until_ms: now_ms.saturating_add(self.config.click_suppression_ms),
                }
            }
            (state, PointerEvent::Up { .. }) => state,

            (GestureState::Idle, PointerEvent::Click { target }) => {
                let selected = target
                    .and_then(|node| registry.get(node))
                    .map(|node| node.id().clone());
                effects.push(match selected {
                    Some(id) => InteractionEffect::SelectNode(id),
                    None => InteractionEffect::SelectBackground,
                });
                GestureState::Idle
            }
            // Mid-gesture or inside the post-drag window: the click is the tail of a drag.
            (state, PointerEvent::Click { .. }) => state,
        };

        if next != self.state {
            tracing::trace!(from = ?self.state, to = ?next, "gesture transition");
        }
        self.state = next;
        effects
    }

    /// Ends an expired post-drag window. Also called implicitly by [`Self::handle`].
    pub fn expire(&mut self, now_ms: u64) {
        if let GestureState::Released { suppress_until_ms } = self.state {
            if now_ms >= suppress_until_ms {
                self.state = GestureState::Idle;
            }
        }
    }

    /// Abandons any pointer session, e.g. when the host loses pointer capture.
    pub fn cancel(&mut self, registry: &mut NodeRegistry) -> Vec<InteractionEffect> {
        let mut effects = Vec::new();
        if self.state.active_node().is_some() {
            registry.unpin();
            effects.push(InteractionEffect::SetMapPanning(true));
        }
        self.state = GestureState::Idle;
        effects
    }

    fn arm(
        &self,
        registry: &mut NodeRegistry,
        state: GestureState,
        node: NodeHandle,
        pixel: ScreenPoint,
        effects: &mut Vec<InteractionEffect>,
    ) -> GestureState {
        match registry.pin(node) {
            Ok(released) => {
                if let Some(prev) = released {
                    tracing::debug!(
                        released = prev.index(),
                        pinned = node.index(),
                        "new press replaced an unfinished pointer session"
                    );
                }
                // Panning is already off while a previous session is still open.
                if state.active_node().is_none() {
                    effects.push(InteractionEffect::SetMapPanning(false));
                }
                GestureState::Armed {
                    node,
                    origin: pixel,
                }
            }
            Err(err) => {
                tracing::warn!(%err, "pointer down on an unknown node ignored");
                state
            }
        }
    }
}

fn drag_to(
    registry: &mut NodeRegistry,
    handle: NodeHandle,
    pixel: ScreenPoint,
    effects: &mut Vec<InteractionEffect>,
) {
    let Some(node) = registry.get_mut(handle) else {
        return;
    };
    node.simulated = Some(pixel);
    node.rendered = Some(pixel);
    effects.push(InteractionEffect::MoveMarker {
        id: node.id().clone(),
        pixel,
    });
}
