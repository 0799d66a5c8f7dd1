//! Command handler modules for the `risk` CLI.

pub mod db;
pub mod run;
pub mod worker;
