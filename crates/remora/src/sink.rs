use crate::geom::ScreenPoint;
use crate::registry::NodeId;

/// Receives marker moves from the solver. Called at most once per node per tick, and only
/// when the node moved past the emit threshold.
pub trait RenderSink {
    fn position_changed(&mut self, id: &NodeId, pixel: ScreenPoint);
}

impl<F> RenderSink for F
where
    F: FnMut(&NodeId, ScreenPoint),
{
    fn position_changed(&mut self, id: &NodeId, pixel: ScreenPoint) {
        self(id, pixel)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub id: NodeId,
    pub pixel: ScreenPoint,
}

impl RenderSink for Vec<PositionUpdate> {
    fn position_changed(&mut self, id: &NodeId, pixel: ScreenPoint) {
        self.push(PositionUpdate {
            id: id.clone(),
            pixel,
        });
    }
}
