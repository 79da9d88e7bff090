mod builder;
mod document;
mod layout;
mod markdown;
mod paths;
mod section;
mod watch;

pub use builder::{BuildError, BuildSummary, Builder};
pub use watch::{Watcher, ticker};
