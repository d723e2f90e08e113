use crate::config::RemoraConfig;
use crate::error::{Error, Result};
use crate::geom::LatLng;
use crate::interaction::{GestureState, InteractionController, InteractionEffect, PointerEvent};
use crate::projection::Projection;
use crate::registry::{Node, NodeHandle, NodeId, NodeRegistry};
use crate::sink::RenderSink;
use crate::solver::{self, TickOutcome, TickReport};

/// One independent declutter simulation: the node registry, the relaxation solver state, the
/// viewport-transition flag and the pointer controller.
///
/// The host calls [`Simulation::tick`] once per display frame for the life of the map; the
/// simulation never schedules itself.
#[derive(Debug, Clone)]
pub struct Simulation {
    registry: NodeRegistry,
    config: RemoraConfig,
    suspended: bool,
    controller: InteractionController,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_config(RemoraConfig::default())
    }
}

impl Simulation {
    pub fn new(config: RemoraConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: RemoraConfig) -> Self {
        Self {
            registry: NodeRegistry::new(),
            controller: InteractionController::new(config.interaction.clone()),
            config,
            suspended: false,
        }
    }

    pub fn config(&self) -> &RemoraConfig {
        &self.config
    }

    pub fn register(&mut self, id: impl Into<NodeId>, anchor: LatLng) -> Result<NodeHandle> {
        self.registry.register(id, anchor)
    }

    /// Updates a node's declutter radius from the data layer.
    ///
    /// A negative or non-finite radius is clamped to 0 and logged; only an unknown id is an
    /// error.
    pub fn set_target_radius(&mut self, id: &str, radius: f64) -> Result<()> {
        match self.registry.set_target_radius(id, radius) {
            Err(Error::InvalidRadius { id, radius }) => {
                tracing::warn!(node = %id, radius, "invalid target radius clamped to 0");
                self.registry.set_target_radius(id.as_str(), 0.0)
            }
            other => other,
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.registry.get(handle)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.registry.get_by_id(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> + '_ {
        self.registry.iter()
    }

    /// Zoom started: ticks become no-ops until [`Self::end_transition`].
    pub fn begin_transition(&mut self) {
        if !self.suspended {
            tracing::debug!("viewport transition started; solver suspended");
        }
        self.suspended = true;
    }

    /// Zoom ended: the old pixel positions are meaningless at the new scale, so every node is
    /// re-seeded from its fresh projection on the next tick.
    pub fn end_transition(&mut self) {
        self.suspended = false;
        self.registry.reset_simulated_positions();
        tracing::debug!(
            nodes = self.registry.len(),
            "viewport transition ended; positions reset"
        );
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Runs one frame of the solver. Never fails: suspension, an unavailable projection and an
    /// empty registry all yield a no-op report, and the host simply calls again next frame.
    pub fn tick(&mut self, projection: &dyn Projection, sink: &mut dyn RenderSink) -> TickReport {
        if self.suspended {
            return TickReport::skipped(TickOutcome::Suspended);
        }
        solver::tick(&mut self.registry, &self.config.solver, projection, sink)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now_ms: u64) -> Vec<InteractionEffect> {
        self.controller.handle(&mut self.registry, event, now_ms)
    }

    pub fn cancel_pointer(&mut self) -> Vec<InteractionEffect> {
        self.controller.cancel(&mut self.registry)
    }

    pub fn gesture(&self) -> GestureState {
        self.controller.state()
    }
}
