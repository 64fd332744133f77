//! Application wiring for the order desk.
//!
//! Configuration, the shared application state, the debounce primitive,
//! in-memory collaborators and the controllers that drive the board and the
//! order form against the backend.

pub mod app_state;
pub mod board_controller;
pub mod config;
pub mod debounce;
pub mod gateways;
pub mod order_workflow;

pub use app_state::{AppState, SharedTokenStore};
pub use board_controller::BoardController;
pub use config::{Config, ConfigError};
pub use debounce::Debouncer;
pub use order_workflow::OrderWorkflow;
