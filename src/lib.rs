//! Builds a daily HTML report of the time a Hubstaff team tracked per project.
//! Settings come from command line flags, environment variables and an INI file, the resolved
//! login is written back so following runs need no flags.

pub mod cli;
pub mod config;
pub mod hubstaff;
pub mod report;
pub mod utils;
