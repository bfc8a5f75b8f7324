//! CLI command implementations

pub mod init;
pub mod operators;
pub mod run;
pub mod validate;
