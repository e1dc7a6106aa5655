//! CLI subcommands

pub mod evaluate;
pub mod serve;
pub mod simulate;
pub mod train;
