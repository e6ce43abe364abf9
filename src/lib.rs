//! # Devhub
//!
//! Operator tooling for the devhub API cache. The cache itself lives in the
//! `devhub-cache` crate; this crate wires it to configuration, logging and a
//! command-line interface.

pub mod cli;
pub mod logging;
