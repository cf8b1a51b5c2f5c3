#[derive(Clone, Copy)]
pub struct AgentConfig {        //              reasonable defaults
    pub gnt_chance: f64,        // per cycle    0.7
    pub rsp_chance: f64,        // per cycle    0.7
    pub max_req_stall: u32,     // cycles       5
    pub max_rsp_stall: u32,     // cycles       5
    pub healthy_chance: f64,    // rng agent    0.9
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            gnt_chance: 0.7,
            rsp_chance: 0.7,
            max_req_stall: 5,
            max_rsp_stall: 5,
            healthy_chance: 0.9,
        }
    }
}

// SIGNAL BUNDLES
//
// One struct per interface, owned by the harness and passed by reference
// into compute_next/drive. The initiator writes the request side, the
// agent drives the rest.

#[derive(Clone, Copy, Debug, Default)]
pub struct SramBus {
    // request channel, initiator -> agent
    pub req_valid: bool,
    pub addr: u32,
    pub write_en: bool,
    pub strobe: u8,
    pub wdata: u32,
    // grant, agent -> initiator
    pub gnt: bool,
    // response channel, agent -> initiator
    pub rsp_valid: bool,
    pub rsp_err: bool,
    pub rdata: u32,
    // response accepted, initiator -> agent
    pub rsp_ack: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RngBus {
    // request channel, initiator -> agent
    pub req_valid: bool,
    pub op: RngOp,
    pub seed_data: u32,
    // request accepted, agent -> initiator
    pub req_ready: bool,
    // response channel, agent -> initiator
    pub rsp_valid: bool,
    pub rsp_status: RngStatus,
    pub rsp_data: u32,
    // response accepted, initiator -> agent
    pub rsp_ack: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RngOp {
    Seed,
    #[default]
    Sample,
    SelfTest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RngStatus {
    #[default]
    Uninit,
    Unhealthy,
    Healthy,
}
