pub mod app_controller;
pub mod session_controller;

pub use app_controller::{AppController, ConnectorBuilder, Intent, Outcome, gemini_connector_builder};
pub use session_controller::{SendOutcome, SessionController};
