//! Embassy tasks module
//!
//! Async drivers for the radio core on the embedded target.

pub mod radio;

pub use radio::radio_task;
