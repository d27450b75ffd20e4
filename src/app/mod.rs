// Application layer - Session and its wiring

pub mod container;
pub mod session;

pub use container::{AppContainer, DefaultAppContainer};
pub use session::{LoadOptions, Session, SessionSettings};
