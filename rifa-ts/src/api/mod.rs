//! HTTP surface for the ticket sales service

pub mod health;
pub mod payments;
pub mod root;
pub mod tickets;
pub mod upload;

pub use health::health_routes;
pub use payments::payments_routes;
pub use root::root_routes;
pub use tickets::tickets_routes;
pub use upload::upload_routes;
