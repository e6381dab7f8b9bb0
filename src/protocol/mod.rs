pub mod address;
pub mod crc;
pub mod fragment;
pub mod framing;

pub use address::{DeviceSerial, RadioId};
pub use fragment::{Fragment, Packet, PacketBuilder};
pub use framing::{FragmentBuffer, Reassembly};
