use asynchronix::model::{Model, Output};

use super::{MemPins, MemView, RngPins, RngView};
use crate::agents::{RngAgent, RngBus, SramAgent, SramBus};

// Thin clock-domain wrappers: on_tick runs the agent's compute phase,
// on_post_tick its drive phase and publishes the driven signals. Incoming
// pins are only stored, so they become visible at the next edge.

pub struct SramModel {
    agent: SramAgent,
    bus: SramBus,
    pub o_view: Output<MemView>,
}

impl SramModel {
    pub fn new(agent: SramAgent) -> Self {
        SramModel {
            agent,
            bus: SramBus::default(),
            o_view: Output::new(),
        }
    }
    pub fn on_pins(&mut self, pins: MemPins) {
        self.bus.req_valid = pins.req_valid;
        self.bus.addr = pins.addr;
        self.bus.write_en = pins.write_en;
        self.bus.strobe = pins.strobe;
        self.bus.wdata = pins.wdata;
        self.bus.rsp_ack = pins.rsp_ack;
    }
    pub fn on_tick(&mut self, _: ()) {
        self.agent.compute_next(&self.bus);
    }
    pub async fn on_post_tick(&mut self) {
        self.agent.drive(&mut self.bus);
        self.o_view
            .send(MemView {
                gnt: self.bus.gnt,
                rsp_valid: self.bus.rsp_valid,
                rsp_err: self.bus.rsp_err,
                rdata: self.bus.rdata,
            })
            .await;
    }
}

impl Model for SramModel {}

pub struct RngModel {
    agent: RngAgent,
    bus: RngBus,
    pub o_view: Output<RngView>,
}

impl RngModel {
    pub fn new(agent: RngAgent) -> Self {
        RngModel {
            agent,
            bus: RngBus::default(),
            o_view: Output::new(),
        }
    }
    pub fn on_pins(&mut self, pins: RngPins) {
        self.bus.req_valid = pins.req_valid;
        self.bus.op = pins.op;
        self.bus.seed_data = pins.seed_data;
        self.bus.rsp_ack = pins.rsp_ack;
    }
    pub fn on_tick(&mut self, _: ()) {
        self.agent.compute_next(&self.bus);
    }
    pub async fn on_post_tick(&mut self) {
        self.agent.drive(&mut self.bus);
        self.o_view
            .send(RngView {
                req_ready: self.bus.req_ready,
                rsp_valid: self.bus.rsp_valid,
                rsp_status: self.bus.rsp_status,
                rsp_data: self.bus.rsp_data,
            })
            .await;
    }
}

impl Model for RngModel {}
