//! Concrete [`browser_actions::ActionExecutor`] clients.

pub mod http;

pub use http::HttpExecutor;
