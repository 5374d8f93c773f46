/// Network side of the board client: a `BoardApi` over the REST surface and a
/// subscriber for the WebSocket invalidation channel.
pub mod http;
pub mod subscribe;

pub use http::HttpBoardApi;
pub use subscribe::{follow, BoardSubscription};
