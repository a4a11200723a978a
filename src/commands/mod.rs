//! Command handlers behind the CLI.

mod inspect;

pub use inspect::{InspectArgs, inspect};
