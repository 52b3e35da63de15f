//! Filter a table of options by hard constraints, score the survivors by
//! weighted tradeoffs, and explain the result with two trees.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
