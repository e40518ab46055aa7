//! # I/O Module
//!
//! Reading system descriptions from disk.
//!
//! - [`system_file`] - The TOML system description and its conversion into a
//!   ready-to-compute [`system_file::SystemSetup`]

pub mod system_file;
