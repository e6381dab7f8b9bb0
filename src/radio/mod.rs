pub mod cmt;
pub mod country;
pub mod engine;
pub mod irq;
pub mod traits;

pub use cmt::{ChipError, CmtChip, CmtRadio, FrequencyError};
pub use country::{CountryFrequencyDefinition, CountryFrequencyList, CountryMode, FrequencyBand};
pub use engine::{EngineState, RadioEngine};
pub use irq::IrqFlags;
pub use traits::{Transport, TransportError};
