use crate::error::{Error, Result};
use crate::geom::{ScreenVector, vector};
use serde::{Deserialize, Serialize};

/// Relaxation constants for one solver tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Anchor-pull + separation passes per tick. Fixed regardless of node count; under heavy
    /// crowding a single tick may leave residual overlap that later ticks keep reducing.
    pub iterations: usize,
    /// Fraction of the remaining anchor offset closed per iteration, in `(0, 1)`.
    pub return_factor: f64,
    /// Extra gap (px) kept between two circles on top of their radii.
    pub padding: f64,
    /// Minimum per-axis movement (px) before a position update is emitted.
    pub emit_threshold: f64,
    /// Separation axis used when two centers coincide exactly.
    pub coincident_nudge: ScreenVector,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 8,
            return_factor: 0.2,
            padding: 1.5,
            emit_threshold: 0.1,
            coincident_nudge: vector(0.01, 0.0),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(invalid("solver.iterations", "must be at least 1"));
        }
        if !(self.return_factor > 0.0 && self.return_factor < 1.0) {
            return Err(invalid(
                "solver.return_factor",
                format!("{} is outside (0, 1)", self.return_factor),
            ));
        }
        non_negative("solver.padding", self.padding)?;
        non_negative("solver.emit_threshold", self.emit_threshold)?;
        let nudge = self.coincident_nudge.length();
        if !(nudge.is_finite() && nudge > 0.0) {
            return Err(invalid(
                "solver.coincident_nudge",
                "must be a finite, non-zero vector",
            ));
        }
        Ok(())
    }
}

/// Pointer disambiguation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Displacement (px) from pointer-down beyond which the gesture becomes a drag.
    pub drag_threshold: f64,
    /// How long (ms) clicks are swallowed after a drag is released.
    pub click_suppression_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            click_suppression_ms: 100,
        }
    }
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<()> {
        non_negative("interaction.drag_threshold", self.drag_threshold)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoraConfig {
    pub solver: SolverConfig,
    pub interaction: InteractionConfig,
}

impl RemoraConfig {
    pub fn validate(&self) -> Result<()> {
        self.solver.validate()?;
        self.interaction.validate()
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be finite and >= 0")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
