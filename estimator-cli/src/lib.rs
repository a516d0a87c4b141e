pub mod app;
pub mod config;
pub mod logging;
pub mod session;
pub mod utils;

pub use session::{CalculatorSession, FlowStep, SaveRequest, SessionError};
