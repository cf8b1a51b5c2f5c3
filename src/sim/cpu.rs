use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::{info, warn};
use asynchronix::model::{Model, Output};

use super::{MemPins, MemView, RngPins, RngView};
use crate::agents::RngOp;

#[derive(Clone)]
pub enum CpuOp {
    MemWrite { addr: u32, data: u32, strb: u8 },
    MemRead { addr: u32 },
    RngSeed(u32),
    RngSample,
    RngSelfTest,
}

enum CpuState {
    Idle,
    MemIssue,
    MemWait,
    RngIssue,
    RngWait,
    Done,
}

/// Scripted initiator standing in for the device under test: issues one
/// operation at a time, re-presents it until granted, then waits for and
/// acknowledges the response.
pub struct Cpu {
    state: CpuState,
    ops: VecDeque<CpuOp>,
    mem_pins: MemPins,
    rng_pins: RngPins,
    mem_view: MemView,
    rng_view: RngView,
    pub o_mem_pins: Output<MemPins>,
    pub o_rng_pins: Output<RngPins>,
    done: Arc<AtomicBool>,
}

impl Cpu {
    pub fn new(ops: Vec<CpuOp>, done: Arc<AtomicBool>) -> Self {
        Cpu {
            state: CpuState::Idle,
            ops: VecDeque::from(ops),
            mem_pins: MemPins::default(),
            rng_pins: RngPins::default(),
            mem_view: MemView::default(),
            rng_view: RngView::default(),
            o_mem_pins: Output::new(),
            o_rng_pins: Output::new(),
            done,
        }
    }

    fn issue_next(&mut self) {
        match self.ops.pop_front() {
            Some(CpuOp::MemWrite { addr, data, strb }) => {
                info!("issue write addr={:08x} data={:08x} strb={:04b}", addr, data, strb);
                self.mem_pins = MemPins {
                    req_valid: true,
                    addr,
                    write_en: true,
                    strobe: strb,
                    wdata: data,
                    rsp_ack: false,
                };
                self.state = CpuState::MemIssue;
            }
            Some(CpuOp::MemRead { addr }) => {
                info!("issue read addr={:08x}", addr);
                self.mem_pins = MemPins {
                    req_valid: true,
                    addr,
                    write_en: false,
                    strobe: 0,
                    wdata: 0,
                    rsp_ack: false,
                };
                self.state = CpuState::MemIssue;
            }
            Some(CpuOp::RngSeed(seed)) => {
                info!("issue rng seed data={:08x}", seed);
                self.issue_rng(RngOp::Seed, seed);
            }
            Some(CpuOp::RngSample) => {
                info!("issue rng sample");
                self.issue_rng(RngOp::Sample, 0);
            }
            Some(CpuOp::RngSelfTest) => {
                info!("issue rng self-test");
                self.issue_rng(RngOp::SelfTest, 0);
            }
            None => {
                self.done.store(true, Ordering::Relaxed);
                self.state = CpuState::Done;
            }
        }
    }

    fn issue_rng(&mut self, op: RngOp, seed_data: u32) {
        self.rng_pins = RngPins {
            req_valid: true,
            op,
            seed_data,
            rsp_ack: false,
        };
        self.state = CpuState::RngIssue;
    }

    // inputs

    pub fn on_mem_view(&mut self, view: MemView) {
        self.mem_view = view;
    }
    pub fn on_rng_view(&mut self, view: RngView) {
        self.rng_view = view;
    }
    pub fn on_tick(&mut self, _: ()) {
        match self.state {
            CpuState::Idle => self.issue_next(),
            CpuState::MemIssue => {
                if self.mem_pins.req_valid && self.mem_view.gnt {
                    // request sampled together with the grant on this edge
                    self.mem_pins.req_valid = false;
                    self.state = CpuState::MemWait;
                }
            }
            CpuState::MemWait => {
                if self.mem_pins.rsp_ack {
                    // the agent saw the acknowledge on this edge
                    self.mem_pins.rsp_ack = false;
                    self.state = CpuState::Idle;
                } else if self.mem_view.rsp_valid {
                    if self.mem_view.rsp_err {
                        warn!("mem response error");
                    } else {
                        info!("mem response data={:08x}", self.mem_view.rdata);
                    }
                    self.mem_pins.rsp_ack = true;
                }
            }
            CpuState::RngIssue => {
                if self.rng_pins.req_valid && self.rng_view.req_ready {
                    self.rng_pins.req_valid = false;
                    self.state = CpuState::RngWait;
                }
            }
            CpuState::RngWait => {
                if self.rng_pins.rsp_ack {
                    self.rng_pins.rsp_ack = false;
                    self.state = CpuState::Idle;
                } else if self.rng_view.rsp_valid {
                    info!(
                        "rng response status={:?} data={:08x}",
                        self.rng_view.rsp_status, self.rng_view.rsp_data
                    );
                    self.rng_pins.rsp_ack = true;
                }
            }
            CpuState::Done => (),
        }
    }
    pub async fn on_post_tick(&mut self) {
        self.o_mem_pins.send(self.mem_pins).await;
        self.o_rng_pins.send(self.rng_pins).await;
    }
}

impl Model for Cpu {}
