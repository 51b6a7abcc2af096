//! Download every episode of a podcast feed into a local directory.
//!
//! Files are staged under `<output>/tmp/` and renamed into place once fully
//! written. Episodes already present are skipped, so an interrupted run can
//! simply be started again.

pub mod api;
pub mod application;
pub mod cli;
pub mod domain;
pub mod feed;
pub mod logging;
pub mod utils;
