use asynchronix::simulation::{Mailbox, SimInit};
use asynchronix::time::MonotonicTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod agents;
mod sim;

use agents::{AgentConfig, MemoryDevice, RngAgent, SramAgent};
use env_logger::Env;
use sim::{Cpu, CpuOp, RngModel, SramModel};

const SEED: u64 = 0x00C0_FFEE;
const MEM_BASE: u32 = 0x1000_0000;
const MEM_SIZE: u32 = 0x1_0000;
const MAX_CYCLES: u64 = 10_000;

fn main() {
    // logging
    let env = Env::default()
        .filter_or("LOG_LEVEL", "info")
        .write_style_or("LOG_STYLE", "always");
    env_logger::init_from_env(env);

    // demo traffic
    let ops = vec![
        CpuOp::MemWrite { addr: MEM_BASE, data: 0xDEAD_BEEF, strb: 0b1111 },
        CpuOp::MemRead { addr: MEM_BASE },
        CpuOp::MemWrite { addr: MEM_BASE + 4, data: 0xAABB_CCDD, strb: 0b0101 },
        CpuOp::MemRead { addr: MEM_BASE + 4 },
        CpuOp::MemRead { addr: MEM_BASE + MEM_SIZE - 2 }, // straddles the top of the device
        CpuOp::RngSample, // before seeding: uninitialised
        CpuOp::RngSeed(0x5EED_5EED),
        CpuOp::RngSample,
        CpuOp::RngSelfTest,
        CpuOp::RngSample,
    ];

    let done = Arc::new(AtomicBool::new(false));

    // create models
    let mut cpu = Cpu::new(ops, done.clone());
    let mem = MemoryDevice::new(MEM_BASE as u64, MEM_SIZE as u64);
    let mut sram = SramModel::new(SramAgent::new(mem, AgentConfig::default(), SEED));
    let mut rng = RngModel::new(RngAgent::new(AgentConfig::default(), SEED ^ 1));

    // create mailboxes
    let cpu_mbox = Mailbox::<Cpu>::new();
    let sram_mbox = Mailbox::<SramModel>::new();
    let rng_mbox = Mailbox::<RngModel>::new();

    // addresses
    let cpu_addr = cpu_mbox.address();
    let sram_addr = sram_mbox.address();
    let rng_addr = rng_mbox.address();

    // connect models
    cpu.o_mem_pins.connect(SramModel::on_pins, &sram_mbox);
    cpu.o_rng_pins.connect(RngModel::on_pins, &rng_mbox);
    sram.o_view.connect(Cpu::on_mem_view, &cpu_mbox);
    rng.o_view.connect(Cpu::on_rng_view, &cpu_mbox);

    // initialize simulation
    let mut sim = SimInit::new()
        .add_model(cpu, cpu_mbox)
        .add_model(sram, sram_mbox)
        .add_model(rng, rng_mbox)
        .init(MonotonicTime::EPOCH);

    // run simulation
    for _ in 0..MAX_CYCLES {
        if done.load(Ordering::Relaxed) {
            break;
        }

        // tick: every model computes its next state
        sim.send_event(Cpu::on_tick, (), &cpu_addr);
        sim.send_event(SramModel::on_tick, (), &sram_addr);
        sim.send_event(RngModel::on_tick, (), &rng_addr);
        sim.step_by(Duration::from_secs(1));

        // post-tick: every model drives its signals
        sim.send_event(Cpu::on_post_tick, (), &cpu_addr);
        sim.send_event(SramModel::on_post_tick, (), &sram_addr);
        sim.send_event(RngModel::on_post_tick, (), &rng_addr);
        sim.step();
    }

    println!("finished simulation in {} cycles", sim.time().as_secs());
}
