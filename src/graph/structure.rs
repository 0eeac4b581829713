//! Graph structure and execution.
//!
//! The [`NodeGraph`] holds every node (insertion-ordered, addressed by
//! stable string ids) and the directed connections between them, and
//! drives execution passes.
//!
//! # Execution model
//!
//! One [`NodeGraph::run`] pass does three things in strict order:
//!
//! 1. `process()` every node, in insertion order;
//! 2. for every connection, copy the source's output into the
//!    destination's input;
//! 3. invoke the presentation hook (if installed) once per node.
//!
//! Because propagation happens *after* all processing, a connection's
//! effect is visible only from the next pass: a node downstream of an
//! edge sees the upstream value one run behind. This one-pass-lag is
//! deliberate and pinned by tests; per-node conditions (missing input)
//! are logged and recovered, never fatal.

use crate::core::error::{GraphError, GraphResult, NodeError};
use crate::core::node::TransformNode;
use std::fmt;

/// A directed edge feeding one node's output into another's input.
///
/// Connections always target the destination's single canonical input
/// slot; nodes with a second input (blend) expose it through a
/// dedicated setter instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Id of the node whose output is forwarded.
    pub from: String,
    /// Id of the node receiving the output as input.
    pub to: String,
}

/// Presentation callback invoked once per node at the end of a pass.
///
/// The hook may read and write node parameters; parameter setters
/// re-run the node's transform eagerly, keeping output consistent.
pub type RenderHook = Box<dyn FnMut(&mut dyn TransformNode)>;

/// The processing graph: an insertion-ordered node arena plus a
/// connection list.
///
/// Nodes are addressed by their id strings. Duplicate ids are not
/// filtered; id-based lookups resolve to the first match in insertion
/// order. Nodes cannot be removed individually: the graph is torn down
/// as a whole with [`NodeGraph::clear`].
#[derive(Default)]
pub struct NodeGraph {
    nodes: Vec<Box<dyn TransformNode>>,
    connections: Vec<Connection>,
    render_hook: Option<RenderHook>,
}

impl fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGraph")
            .field(
                "nodes",
                &self.nodes.iter().map(|n| n.id().to_string()).collect::<Vec<_>>(),
            )
            .field("connections", &self.connections)
            .field("render_hook", &self.render_hook.is_some())
            .finish()
    }
}

impl NodeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            render_hook: None,
        }
    }

    /// Append a node to the execution sequence. No validation is
    /// performed; insertion order is execution order.
    pub fn add(&mut self, node: Box<dyn TransformNode>) {
        self.nodes.push(node);
    }

    /// Record a connection from `from`'s output to `to`'s input.
    ///
    /// Both ids must already belong to graph members; otherwise the
    /// connection is reported and dropped, and the graph is unchanged.
    pub fn connect(&mut self, from: &str, to: &str) -> GraphResult<()> {
        for id in [from, to] {
            if !self.has_node(id) {
                log::error!("invalid node connection: '{}' is not in the graph", id);
                return Err(GraphError::InvalidConnection(id.to_string()));
            }
        }
        self.connections.push(Connection {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    /// Run one pass: process every node, then propagate connections,
    /// then invoke the presentation hook per node.
    ///
    /// Re-running with unchanged parameters reproduces byte-identical
    /// outputs.
    pub fn run(&mut self) {
        log::info!("running graph with {} nodes", self.nodes.len());

        for node in &mut self.nodes {
            match node.process() {
                Ok(()) => {}
                Err(NodeError::MissingInput { .. }) => {
                    // Normal on the first pass before edges have carried
                    // anything; the node keeps an empty output.
                    log::warn!("node '{}' processed with no input", node.id());
                }
                Err(err) => log::warn!("node '{}' failed to process: {}", node.id(), err),
            }
        }

        for i in 0..self.connections.len() {
            let Connection { from, to } = self.connections[i].clone();
            // Endpoints were validated at connect time and nodes are
            // never removed, so both lookups succeed.
            let Some(output) = self.find(&from).map(|n| n.output().clone()) else {
                continue;
            };
            if let Some(dest) = self.find_mut(&to) {
                dest.set_input(output);
            }
        }

        if let Some(hook) = self.render_hook.as_mut() {
            for node in &mut self.nodes {
                hook(node.as_mut());
            }
        }
    }

    /// Remove every node and connection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    /// Install the presentation hook invoked per node at the end of
    /// each pass.
    pub fn set_render_hook(&mut self, hook: RenderHook) {
        self.render_hook = Some(hook);
    }

    /// Remove the presentation hook.
    pub fn clear_render_hook(&mut self) {
        self.render_hook = None;
    }

    /// Whether any member has the given id.
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id() == id)
    }

    /// First member with the given id.
    pub fn find(&self, id: &str) -> Option<&dyn TransformNode> {
        self.nodes.iter().find(|n| n.id() == id).map(|n| n.as_ref())
    }

    /// Mutable access to the first member with the given id.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut (dyn TransformNode + 'static)> {
        self.nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .map(|n| n.as_mut())
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &dyn TransformNode> {
        self.nodes.iter().map(|n| n.as_ref())
    }

    /// All recorded connections.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of member nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of recorded connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether the graph has no members.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
