//! Concrete listing submitter implementations

pub mod console;
