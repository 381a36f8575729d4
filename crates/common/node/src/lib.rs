pub mod compute_client;
pub mod errors;
pub mod node_handle;
pub mod router;

pub use compute_client::{ComputeClient, ComputeRequest};
pub use errors::ComputeError;
pub use node_handle::NodeHandle;
pub use router::{Router, RouterRequest};
