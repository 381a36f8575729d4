/// An opaque handle to a peer compute node, as returned by `Router::find`.
/// The core never interprets this value; it only ever hands it back to the
/// `ComputeClient`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub String);
