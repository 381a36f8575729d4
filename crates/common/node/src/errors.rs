use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("compute node did not respond before the deadline")]
    Timeout,

    #[error("compute node is unreachable")]
    Unreachable,

    #[error("compute node rejected the request: {0}")]
    Rejected(String),
}
