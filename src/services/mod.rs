pub mod dispatcher;
pub mod failure;
pub mod health;
pub mod routing;
pub mod upstream;

pub use dispatcher::Dispatcher;
pub use routing::{Route, RouteFamily, RouteSpec};
pub use upstream::{UpstreamClient, TmdbTransport};
