pub mod api;
pub mod poller;
pub mod registry;
pub mod validation;
