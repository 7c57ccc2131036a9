pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod http;
pub mod menu;
pub mod permission;
pub mod router;
pub mod routes;
pub mod session;
pub mod storage;
pub mod stores;

pub use console::{Console, Navigation, NavigationError};
pub use error::{ConsoleError, ConsoleResult};
