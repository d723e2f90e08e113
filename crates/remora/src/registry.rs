use crate::error::{Error, Result};
use crate::geom::{LatLng, ScreenPoint};
use indexmap::IndexMap;
use indexmap::map::Entry;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable, opaque marker identifier (typically the station code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Position of a node in registration order. Only valid for the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One declutter-able marker.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    anchor: LatLng,
    target_radius: f64,
    /// Relaxed position; `None` until the first tick or after a viewport discontinuity.
    pub(crate) simulated: Option<ScreenPoint>,
    /// Where the marker was last drawn.
    pub(crate) rendered: Option<ScreenPoint>,
    /// Anchor projection from the most recent tick that ran.
    pub(crate) target: Option<ScreenPoint>,
}

impl Node {
    fn new(id: NodeId, anchor: LatLng) -> Self {
        Self {
            id,
            anchor,
            target_radius: 0.0,
            simulated: None,
            rendered: None,
            target: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn anchor(&self) -> LatLng {
        self.anchor
    }

    pub fn target_radius(&self) -> f64 {
        self.target_radius
    }

    pub fn simulated_position(&self) -> Option<ScreenPoint> {
        self.simulated
    }

    pub fn rendered_position(&self) -> Option<ScreenPoint> {
        self.rendered
    }

    pub fn target_pixel(&self) -> Option<ScreenPoint> {
        self.target
    }
}

/// Insertion-ordered node store. Registration order is the iteration order of every solver
/// pass, which keeps pairwise tie-breaking reproducible.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: IndexMap<NodeId, Node, FxBuildHasher>,
    pinned: Option<NodeHandle>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<NodeId>, anchor: LatLng) -> Result<NodeHandle> {
        let id = id.into();
        if !anchor.is_valid() {
            return Err(Error::InvalidAnchor { id });
        }
        match self.nodes.entry(id) {
            Entry::Occupied(entry) => Err(Error::DuplicateNode {
                id: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let handle = NodeHandle(entry.index());
                let id = entry.key().clone();
                entry.insert(Node::new(id.clone(), anchor));
                tracing::debug!(node = %id, index = handle.0, "registered node");
                Ok(handle)
            }
        }
    }

    /// Rejects negative and non-finite radii without touching the stored value.
    pub fn set_target_radius(&mut self, id: &str, radius: f64) -> Result<()> {
        let Some(node) = self.nodes.get_mut(id) else {
            return Err(Error::UnknownNode { id: id.to_string() });
        };
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(Error::InvalidRadius {
                id: node.id.clone(),
                radius,
            });
        }
        node.target_radius = radius;
        Ok(())
    }

    pub fn handle(&self, id: &str) -> Option<NodeHandle> {
        self.nodes.get_index_of(id).map(NodeHandle)
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get_index(handle.0).map(|(_, node)| node)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn for_each_node(&self, mut visitor: impl FnMut(NodeHandle, &Node)) {
        for (idx, node) in self.nodes.values().enumerate() {
            visitor(NodeHandle(idx), node);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> + '_ {
        self.nodes
            .values()
            .enumerate()
            .map(|(idx, node)| (NodeHandle(idx), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pins `handle`, releasing whichever node was pinned before. Returns the released node.
    pub fn pin(&mut self, handle: NodeHandle) -> Result<Option<NodeHandle>> {
        if handle.0 >= self.nodes.len() {
            return Err(Error::UnknownNode {
                id: format!("#{}", handle.0),
            });
        }
        let previous = self.pinned.replace(handle);
        Ok(previous.filter(|&prev| prev != handle))
    }

    pub fn unpin(&mut self) -> Option<NodeHandle> {
        self.pinned.take()
    }

    pub fn pinned(&self) -> Option<NodeHandle> {
        self.pinned
    }

    pub fn is_pinned(&self, handle: NodeHandle) -> bool {
        self.pinned == Some(handle)
    }

    pub(crate) fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_index_mut(handle.0).map(|(_, node)| node)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> + '_ {
        self.nodes.values_mut()
    }

    /// Marks every simulated position uninitialized so the next tick re-seeds from the
    /// fresh projection.
    pub(crate) fn reset_simulated_positions(&mut self) {
        for node in self.nodes.values_mut() {
            node.simulated = None;
        }
    }
}
