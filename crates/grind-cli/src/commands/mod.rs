//! CLI subcommand implementations.

pub mod export;
pub mod report;
pub mod run;
pub mod status;
pub mod sync;
pub mod util;
