//! Tower layers composed into the [`HyperTransport`](crate::HyperTransport) stack.

mod user_agent;

pub use user_agent::{UserAgentLayer, UserAgentService};
