//! Live preview server: rebuilds on change and serves the latest build.

mod handler;
mod rebuild;
mod reload;

pub use handler::{AppState, router};
pub use rebuild::Rebuilder;
