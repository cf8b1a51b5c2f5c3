use std::collections::VecDeque;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::common::{AgentConfig, RngBus, RngOp, RngStatus};

// a completed operation waiting on the response channel

struct RngRsp {
    data: u32,
    status: RngStatus,
}

/// Entropy-source agent. Same handshake, queue and stall discipline as the
/// memory agent, but requests carry an opcode and execute at acceptance
/// time against an internal reseedable generator with a health register.
pub struct RngAgent {
    cfg: AgentConfig,
    rng: StdRng,     // back-pressure and health monitor draws
    sampler: StdRng, // entropy samples, reseeded by Seed requests
    status: RngStatus,
    rsp_q: VecDeque<RngRsp>,
    req_stall: u32,
    rsp_stall: u32,
    next_ready: bool,
    next_rsp_valid: bool,
    next_status: RngStatus,
    next_data: u32,
}

impl RngAgent {
    pub fn new(cfg: AgentConfig, seed: u64) -> Self {
        RngAgent {
            cfg,
            rng: StdRng::seed_from_u64(seed),
            sampler: StdRng::seed_from_u64(0),
            status: RngStatus::Uninit,
            rsp_q: VecDeque::new(),
            req_stall: 0,
            rsp_stall: 0,
            next_ready: false,
            next_rsp_valid: false,
            next_status: RngStatus::Uninit,
            next_data: 0,
        }
    }

    pub fn status(&self) -> RngStatus {
        self.status
    }

    pub fn pending_len(&self) -> usize {
        self.rsp_q.len()
    }

    pub fn compute_next(&mut self, bus: &RngBus) {
        // response channel first, as in the memory agent
        match (bus.rsp_valid, bus.rsp_ack) {
            (true, false) => (), // held until accepted
            _ => self.step_response(),
        }

        // request channel: operations execute at acceptance, the finished
        // response waits its turn in the queue
        if bus.req_valid && bus.req_ready {
            self.req_stall = 0;
            let rsp = self.execute(bus.op, bus.seed_data);
            self.rsp_q.push_back(rsp);
        } else if bus.req_valid {
            self.req_stall += 1;
        } else {
            debug_assert!(self.req_stall == 0, "request dropped while stalled");
        }

        self.next_ready =
            self.rng.gen_bool(self.cfg.gnt_chance) || self.req_stall >= self.cfg.max_req_stall;
    }

    pub fn drive(&mut self, bus: &mut RngBus) {
        bus.req_ready = self.next_ready;
        bus.rsp_valid = self.next_rsp_valid;
        bus.rsp_status = self.next_status;
        bus.rsp_data = self.next_data;
    }

    pub fn reset(&mut self, bus: &mut RngBus) {
        self.status = RngStatus::Uninit;
        self.rsp_q.clear();
        self.req_stall = 0;
        self.rsp_stall = 0;
        self.next_ready = false;
        self.next_rsp_valid = false;
        self.next_status = RngStatus::Uninit;
        self.next_data = 0;
        self.drive(bus);
    }

    fn step_response(&mut self) {
        let serve = !self.rsp_q.is_empty()
            && (self.rng.gen_bool(self.cfg.rsp_chance) || self.rsp_stall >= self.cfg.max_rsp_stall);
        if serve {
            let rsp = self.rsp_q.pop_front().unwrap();
            self.next_rsp_valid = true;
            self.next_status = rsp.status;
            self.next_data = rsp.data;
            self.rsp_stall = 0;
        } else {
            if !self.rsp_q.is_empty() {
                self.rsp_stall += 1;
            }
            self.next_rsp_valid = false;
            // the status line is live when no response is in flight
            self.next_status = self.status;
            self.next_data = 0;
        }
    }

    fn execute(&mut self, op: RngOp, seed_data: u32) -> RngRsp {
        let data = match op {
            RngOp::Seed => {
                self.sampler = StdRng::seed_from_u64(seed_data as u64);
                // seeded but not yet qualified by a sample or self-test
                self.status = RngStatus::Unhealthy;
                0
            }
            RngOp::Sample => {
                if self.status == RngStatus::Uninit {
                    0
                } else {
                    self.status = self.draw_health();
                    self.sampler.gen()
                }
            }
            RngOp::SelfTest => {
                if self.status != RngStatus::Uninit {
                    self.status = self.draw_health();
                }
                0
            }
        };
        trace!("executed {:?}: status={:?} data={:08x}", op, self.status, data);
        RngRsp {
            data,
            status: self.status,
        }
    }

    fn draw_health(&mut self) -> RngStatus {
        if self.rng.gen_bool(self.cfg.healthy_chance) {
            RngStatus::Healthy
        } else {
            RngStatus::Unhealthy
        }
    }
}
