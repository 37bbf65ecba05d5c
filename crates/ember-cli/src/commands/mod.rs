//! CLI command implementations

pub mod convert;
pub mod frames;
pub mod info;
pub mod simulate;
