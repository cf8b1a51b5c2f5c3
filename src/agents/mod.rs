mod common;
mod mem;
mod rng;
mod sram;

pub use common::*;
pub use mem::MemoryDevice;
pub use rng::RngAgent;
pub use sram::{MemTxn, SramAgent};
