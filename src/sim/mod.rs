mod cpu;
mod models;

pub use cpu::{Cpu, CpuOp};
pub use models::{RngModel, SramModel};

use crate::agents::{RngOp, RngStatus};

// pin bundles exchanged between the models once per drive phase

#[derive(Clone, Copy, Debug, Default)]
pub struct MemPins {
    pub req_valid: bool,
    pub addr: u32,
    pub write_en: bool,
    pub strobe: u8,
    pub wdata: u32,
    pub rsp_ack: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MemView {
    pub gnt: bool,
    pub rsp_valid: bool,
    pub rsp_err: bool,
    pub rdata: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RngPins {
    pub req_valid: bool,
    pub op: RngOp,
    pub seed_data: u32,
    pub rsp_ack: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RngView {
    pub req_ready: bool,
    pub rsp_valid: bool,
    pub rsp_status: RngStatus,
    pub rsp_data: u32,
}
