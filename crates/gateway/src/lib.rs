#![forbid(unsafe_code)]

pub mod contract;
pub mod http;

pub use contract::{GatewayError, InMemoryGateway, InteractionEvent, SyncGateway};
pub use http::{HttpGatewayConfig, HttpSyncGateway};
