//! AWS-facing half of the controller: ECS task dispatch, EC2 network
//! placement discovery, Secrets Manager retrieval, and the S3 template
//! store.

pub mod dispatch;
pub mod network;
pub mod secrets;
pub mod store;

pub use dispatch::{
    DispatchConfig, DispatchError, TaskDispatcher, TaskIdentity, TaskLauncher,
};
pub use network::Placement;
