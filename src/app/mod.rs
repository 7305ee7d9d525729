//! App layer - central state management and command processing
//!
//! The App actor receives UI events, network responses and reveal progress,
//! updates state, and emits network commands and render state.

pub mod actor;
pub mod commands;
pub mod console;
pub mod disclosure;
pub mod state;

pub use actor::AppActor;
pub use commands::TurnStart;
pub use console::ExecutionConsole;
pub use disclosure::{Disclosure, DisclosureStore};
pub use state::AppState;
