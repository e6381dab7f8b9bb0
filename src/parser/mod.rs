pub mod grid_profile;
pub mod tables;

pub use grid_profile::{decode, GridProfile, GridProfileEntry, ProfileVersion};
pub use tables::{ItemDefinition, ProfileType, Section};
