#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod commands;
pub mod config;
pub mod parser;
pub mod protocol;
pub mod radio;
pub mod util;

// The polling task needs the embassy time driver
#[cfg(feature = "embedded")]
pub mod tasks;
