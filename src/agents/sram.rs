use std::collections::VecDeque;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::common::{AgentConfig, SramBus};
use super::mem::MemoryDevice;

// one bus request, queued between acceptance and response

pub struct MemTxn {
    pub addr: u32,
    pub write: bool,
    pub strb: Vec<bool>,
    pub data: Vec<u8>,
    pub success: bool,
}

impl MemTxn {
    pub fn read(addr: u32) -> Self {
        MemTxn {
            addr,
            write: false,
            strb: vec![false; 4],
            data: vec![0; 4],
            success: false,
        }
    }
    pub fn write(addr: u32, wdata: u32, strobe: u8) -> Self {
        MemTxn {
            addr,
            write: true,
            strb: (0..4).map(|i| strobe >> i & 1 != 0).collect(),
            data: wdata.to_le_bytes().to_vec(),
            success: false,
        }
    }
    fn from_pins(bus: &SramBus) -> Self {
        if bus.write_en {
            Self::write(bus.addr, bus.wdata, bus.strobe)
        } else {
            Self::read(bus.addr)
        }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn data_word(&self) -> u32 {
        let mut word = 0u32;
        for (i, b) in self.data.iter().enumerate() {
            word |= (*b as u32) << (8 * i);
        }
        word
    }
}

/// Memory bus agent. Accepts requests with randomized back-pressure, queues
/// them FIFO and answers them against the backing device, again with
/// randomized but bounded stalling on the response channel.
pub struct SramAgent {
    pub mem: MemoryDevice,
    cfg: AgentConfig,
    rng: StdRng,
    pending: VecDeque<MemTxn>,
    req_stall: u32,
    rsp_stall: u32,
    next_gnt: bool,
    next_rsp_valid: bool,
    next_rsp_err: bool,
    next_rdata: u32,
}

impl SramAgent {
    pub fn new(mem: MemoryDevice, cfg: AgentConfig, seed: u64) -> Self {
        SramAgent {
            mem,
            cfg,
            rng: StdRng::seed_from_u64(seed),
            pending: VecDeque::new(),
            req_stall: 0,
            rsp_stall: 0,
            next_gnt: false,
            next_rsp_valid: false,
            next_rsp_err: false,
            next_rdata: 0,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Compute the next-cycle signal values from the pins sampled at this
    /// edge. Nothing becomes externally visible until `drive`.
    pub fn compute_next(&mut self, bus: &SramBus) {
        // response channel first: a transaction formed on this edge must
        // not be serviceable before the following one
        match (bus.rsp_valid, bus.rsp_ack) {
            (true, false) => (), // response waiting to be accepted, hold it
            _ => self.step_response(),
        }

        // request channel
        if bus.req_valid && bus.gnt {
            self.req_stall = 0;
            let txn = MemTxn::from_pins(bus);
            trace!(
                "accepted {} addr={:08x}",
                if txn.write { "write" } else { "read" },
                txn.addr
            );
            self.pending.push_back(txn);
        } else if bus.req_valid {
            self.req_stall += 1;
        } else {
            // a stalled request must be re-presented until granted
            debug_assert!(self.req_stall == 0, "request dropped while stalled");
        }

        self.next_gnt =
            self.rng.gen_bool(self.cfg.gnt_chance) || self.req_stall >= self.cfg.max_req_stall;
    }

    /// Latch the values computed at the last edge onto the visible signals.
    pub fn drive(&mut self, bus: &mut SramBus) {
        bus.gnt = self.next_gnt;
        bus.rsp_valid = self.next_rsp_valid;
        bus.rsp_err = self.next_rsp_err;
        bus.rdata = self.next_rdata;
    }

    /// Drop all queued work and zero the counters and driven signals.
    pub fn reset(&mut self, bus: &mut SramBus) {
        self.pending.clear();
        self.req_stall = 0;
        self.rsp_stall = 0;
        self.next_gnt = false;
        self.next_rsp_valid = false;
        self.next_rsp_err = false;
        self.next_rdata = 0;
        self.drive(bus);
    }

    fn step_response(&mut self) {
        let serve = !self.pending.is_empty()
            && (self.rng.gen_bool(self.cfg.rsp_chance) || self.rsp_stall >= self.cfg.max_rsp_stall);
        if serve {
            let mut txn = self.pending.pop_front().unwrap();
            self.execute(&mut txn);
            self.next_rsp_valid = true;
            self.next_rsp_err = !txn.success;
            self.next_rdata = if txn.write { 0 } else { txn.data_word() };
            self.rsp_stall = 0;
            trace!("response err={} data={:08x}", self.next_rsp_err, self.next_rdata);
        } else {
            if !self.pending.is_empty() {
                self.rsp_stall += 1;
            }
            self.next_rsp_valid = false;
            self.next_rsp_err = false;
            self.next_rdata = 0;
        }
    }

    // reads are all-or-nothing, writes succeed per byte: in-range bytes of
    // a partially out-of-range write still land, the response flags failure
    fn execute(&mut self, txn: &mut MemTxn) {
        if txn.write {
            txn.success = true;
            for i in 0..txn.len() {
                if txn.strb[i] {
                    txn.success &= self.mem.write_byte(txn.addr as u64 + i as u64, txn.data[i]);
                }
            }
        } else {
            match self.mem.read_word(txn.addr as u64) {
                Some(word) => {
                    txn.data = word.to_le_bytes().to_vec();
                    txn.success = true;
                }
                None => txn.success = false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always() -> AgentConfig {
        AgentConfig {
            gnt_chance: 1.0,
            rsp_chance: 1.0,
            ..Default::default()
        }
    }

    fn preload_word(mem: &mut MemoryDevice, addr: u64, word: u32) {
        for (i, b) in word.to_le_bytes().iter().enumerate() {
            assert!(mem.write_byte(addr + i as u64, *b));
        }
    }

    fn clock(agent: &mut SramAgent, bus: &mut SramBus) {
        agent.compute_next(bus);
        agent.drive(bus);
    }

    // present one request, clock until its response arrives
    fn transact(
        agent: &mut SramAgent,
        bus: &mut SramBus,
        write: bool,
        addr: u32,
        strobe: u8,
        wdata: u32,
    ) -> (bool, u32) {
        bus.req_valid = true;
        bus.addr = addr;
        bus.write_en = write;
        bus.strobe = strobe;
        bus.wdata = wdata;
        bus.rsp_ack = true;
        for _ in 0..64 {
            let accepted = bus.req_valid && bus.gnt;
            clock(agent, bus);
            if accepted {
                bus.req_valid = false;
            }
            if bus.rsp_valid {
                return (bus.rsp_err, bus.rdata);
            }
        }
        panic!("no response within the stall bounds");
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut agent = SramAgent::new(MemoryDevice::new(0x1000, 0x10), always(), 1);
        let mut bus = SramBus::default();
        let (err, _) = transact(&mut agent, &mut bus, true, 0x1000, 0b1111, 0xDEAD_BEEF);
        assert!(!err);
        let (err, data) = transact(&mut agent, &mut bus, false, 0x1000, 0, 0);
        assert!(!err);
        assert_eq!(data, 0xDEAD_BEEF);
    }

    #[test]
    fn strobe_masks_unselected_bytes() {
        let mut mem = MemoryDevice::new(0x1000, 0x100);
        preload_word(&mut mem, 0x1000, 0x1122_3344);
        let mut agent = SramAgent::new(mem, always(), 2);
        let mut bus = SramBus::default();
        let (err, _) = transact(&mut agent, &mut bus, true, 0x1000, 0b0101, 0xAABB_CCDD);
        assert!(!err);
        // bytes 0 and 2 written, bytes 1 and 3 untouched
        assert_eq!(agent.mem.read_byte(0x1000), 0xDD);
        assert_eq!(agent.mem.read_byte(0x1001), 0x33);
        assert_eq!(agent.mem.read_byte(0x1002), 0xBB);
        assert_eq!(agent.mem.read_byte(0x1003), 0x11);
        let (err, data) = transact(&mut agent, &mut bus, false, 0x1000, 0, 0);
        assert!(!err);
        assert_eq!(data, 0x11BB_33DD);
    }

    #[test]
    fn out_of_range_read_reports_error() {
        let mut agent = SramAgent::new(MemoryDevice::new(0x1000, 0x10), always(), 3);
        let mut bus = SramBus::default();
        // 4-byte read straddling the top of the device
        let (err, _) = transact(&mut agent, &mut bus, false, 0x100E, 0, 0);
        assert!(err);
    }

    #[test]
    fn out_of_range_write_flags_error_but_applies_in_range_bytes() {
        let mut agent = SramAgent::new(MemoryDevice::new(0x1000, 0x10), always(), 4);
        let mut bus = SramBus::default();
        let (err, _) = transact(&mut agent, &mut bus, true, 0x100E, 0b1111, 0xAABB_CCDD);
        assert!(err);
        assert_eq!(agent.mem.read_byte(0x100E), 0xDD);
        assert_eq!(agent.mem.read_byte(0x100F), 0xCC);
        assert_eq!(agent.mem.read_byte(0x1010), 0);
    }

    #[test]
    fn responses_in_acceptance_order() {
        let mut mem = MemoryDevice::new(0x1000, 0x100);
        let words = [0x0101_0101u32, 0x0202_0202, 0x0303_0303];
        let addrs = [0x1000u32, 0x1010, 0x1020];
        for (addr, word) in addrs.iter().zip(words.iter()) {
            preload_word(&mut mem, *addr as u64, *word);
        }
        let mut agent = SramAgent::new(mem, always(), 5);
        let mut bus = SramBus::default();
        bus.rsp_ack = true;
        bus.write_en = false;
        let mut next = 0;
        let mut got = Vec::new();
        for _ in 0..50 {
            if next < addrs.len() {
                bus.req_valid = true;
                bus.addr = addrs[next];
            } else {
                bus.req_valid = false;
            }
            let accepted = bus.req_valid && bus.gnt;
            clock(&mut agent, &mut bus);
            if accepted {
                next += 1;
            }
            if bus.rsp_valid {
                assert!(!bus.rsp_err);
                got.push(bus.rdata);
            }
        }
        assert_eq!(got, words);
    }

    #[test]
    fn stalled_request_granted_within_bound() {
        let cfg = AgentConfig {
            gnt_chance: 0.0,
            rsp_chance: 0.0,
            ..Default::default()
        };
        let mut agent = SramAgent::new(MemoryDevice::new(0x1000, 0x10), cfg, 6);
        let mut bus = SramBus::default();
        bus.req_valid = true;
        bus.addr = 0x1000;
        bus.rsp_ack = true;
        let mut cycles = 0u32;
        while !bus.gnt {
            clock(&mut agent, &mut bus);
            cycles += 1;
            assert!(cycles <= cfg.max_req_stall, "request starved past the bound");
        }
        // with the random term forced off the bound alone grants
        assert_eq!(cycles, cfg.max_req_stall);
    }

    #[test]
    fn first_response_due_after_bounded_stall() {
        let mut mem = MemoryDevice::new(0x1000, 0x100);
        let words = [0x0A0A_0A0Au32, 0x0B0B_0B0B, 0x0C0C_0C0C];
        let addrs = [0x1000u32, 0x1004, 0x1008];
        for (addr, word) in addrs.iter().zip(words.iter()) {
            preload_word(&mut mem, *addr as u64, *word);
        }
        let cfg = AgentConfig {
            gnt_chance: 1.0,
            rsp_chance: 0.0,
            ..Default::default()
        };
        let mut agent = SramAgent::new(mem, cfg, 7);
        let mut bus = SramBus::default();
        bus.rsp_ack = true;
        let mut next = 0;
        let mut accepted_at = [0u32; 3];
        let mut got = Vec::new();
        let mut first_rsp_at = None;
        for cycle in 0..60u32 {
            if next < addrs.len() {
                bus.req_valid = true;
                bus.addr = addrs[next];
            } else {
                bus.req_valid = false;
            }
            let accepted = bus.req_valid && bus.gnt;
            clock(&mut agent, &mut bus);
            if accepted {
                accepted_at[next] = cycle;
                next += 1;
            }
            if bus.rsp_valid {
                first_rsp_at.get_or_insert(cycle);
                got.push(bus.rdata);
            }
        }
        // never responds earlier than forced, never later than the bound
        assert_eq!(first_rsp_at.unwrap() - accepted_at[0], cfg.max_rsp_stall + 1);
        assert_eq!(got, words);
    }

    #[test]
    fn response_held_until_acknowledged() {
        let mut mem = MemoryDevice::new(0x1000, 0x100);
        preload_word(&mut mem, 0x1000, 0x5555_0000);
        preload_word(&mut mem, 0x1004, 0x5555_0001);
        let mut agent = SramAgent::new(mem, always(), 8);
        let mut bus = SramBus::default();
        bus.req_valid = true;
        bus.addr = 0x1000;
        clock(&mut agent, &mut bus); // stalled, grant computed
        assert!(bus.gnt);
        clock(&mut agent, &mut bus); // first read accepted
        bus.addr = 0x1004;
        clock(&mut agent, &mut bus); // second accepted, first response driven
        bus.req_valid = false;
        assert!(bus.rsp_valid);
        assert_eq!(bus.rdata, 0x5555_0000);
        assert_eq!(agent.pending_len(), 1);
        // unacknowledged: held steady, the queue does not advance
        for _ in 0..5 {
            clock(&mut agent, &mut bus);
            assert!(bus.rsp_valid);
            assert_eq!(bus.rdata, 0x5555_0000);
            assert_eq!(agent.pending_len(), 1);
        }
        bus.rsp_ack = true;
        clock(&mut agent, &mut bus);
        assert!(bus.rsp_valid);
        assert_eq!(bus.rdata, 0x5555_0001);
        assert_eq!(agent.pending_len(), 0);
        clock(&mut agent, &mut bus);
        assert!(!bus.rsp_valid);
    }

    #[test]
    fn reset_clears_queue_and_outputs() {
        let mut agent = SramAgent::new(MemoryDevice::new(0x1000, 0x10), always(), 9);
        let mut bus = SramBus::default();
        bus.req_valid = true;
        bus.addr = 0x1000;
        for _ in 0..3 {
            clock(&mut agent, &mut bus);
        }
        agent.reset(&mut bus);
        assert!(!bus.gnt && !bus.rsp_valid && !bus.rsp_err);
        assert_eq!(bus.rdata, 0);
        assert_eq!(agent.pending_len(), 0);
        agent.reset(&mut bus);
        assert_eq!(agent.pending_len(), 0);
        // nothing left to answer
        bus.req_valid = false;
        bus.rsp_ack = true;
        for _ in 0..10 {
            clock(&mut agent, &mut bus);
            assert!(!bus.rsp_valid);
        }
    }

    #[test]
    fn same_seed_same_backpressure() {
        let mut a = SramAgent::new(MemoryDevice::new(0x1000, 0x10), AgentConfig::default(), 42);
        let mut b = SramAgent::new(MemoryDevice::new(0x1000, 0x10), AgentConfig::default(), 42);
        let mut bus_a = SramBus::default();
        let mut bus_b = SramBus::default();
        for bus in [&mut bus_a, &mut bus_b] {
            bus.req_valid = true;
            bus.addr = 0x1000;
            bus.rsp_ack = true;
        }
        for _ in 0..100 {
            clock(&mut a, &mut bus_a);
            clock(&mut b, &mut bus_b);
            assert_eq!(bus_a.gnt, bus_b.gnt);
            assert_eq!(bus_a.rsp_valid, bus_b.rsp_valid);
            assert_eq!(bus_a.rdata, bus_b.rdata);
        }
    }
}
