//! Next-step decision returned by a node.

/// What the graph does after a node returns.
///
/// `Continue` defers to the graph: the node's static edge, or its router
/// evaluated on the state the node just returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next {
    /// Follow the node's static edge or conditional router.
    Continue,
    /// Jump directly to the node with this id.
    Node(String),
    /// Stop the run; the returned state is final.
    End,
    /// Suspend the run at this node. The checkpoint records this node as the
    /// resume point, so the same node runs again on resume.
    Interrupt,
}
