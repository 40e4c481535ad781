//! The edge process: PLC Drivers (C1) through the Sparkplug MQTT publisher
//! (C2's encoder half plus C3/C4/C5), per §6's "process entrypoint: accepts
//! a config path; exit codes — 0 clean shutdown, 2 config error, 3 fatal
//! runtime error".

use std::{process::ExitCode, sync::Arc};

use config::Config;
use engine::{thread_per_core, Command, Engine as _};
use mimalloc_rust::GlobalMiMalloc;
use oee_domain::{BackpressureHandle, BdSeqHandle, PipelineMessage, RebirthRequestHandle};
use oee_mqtt::PublisherFactory;
use oee_processors::OeeProcessorFactory;
use oee_receivers::PlcReceiverFactory;
use task::labels::ProcessLabels;

#[global_allocator]
static GLOBAL_MIMALLOC: GlobalMiMalloc = GlobalMiMalloc;

fn main() -> ExitCode {
    if let Err(error) = oee_observability::init() {
        eprintln!("failed to initialize logging: {error}");
    }

    let Some(config_path) = std::env::args().nth(1) else {
        eprintln!("usage: oee-edge <config-file>");
        return ExitCode::from(2);
    };

    let rebirth = RebirthRequestHandle::new();
    let bd_seq = BdSeqHandle::new();
    let backpressure = BackpressureHandle::new();

    // `thread_per_core::Engine::run` reloads the config independently inside
    // each spawned core thread, and panics that thread on a load failure
    // rather than surfacing a `Result` (see `engine::thread_per_core`). Load
    // it once up front so a bad config file is reported with exit code 2
    // instead of taking down the process via a cross-thread panic.
    if let Err(error) = load_config(&config_path, &rebirth, &bd_seq, &backpressure) {
        tracing::error!(%error, "edge configuration rejected");
        return ExitCode::from(2);
    }

    let mut engine = thread_per_core::Engine::new(
        PlcReceiverFactory::new(backpressure.clone()),
        OeeProcessorFactory::new(rebirth.clone(), bd_seq.clone()),
        PublisherFactory::new(backpressure, rebirth, bd_seq),
    );

    spawn_shutdown_on_ctrl_c(engine.command_handler());

    match engine.run(ProcessLabels::new("oee-edge"), config_path) {
        Ok(()) => ExitCode::from(0),
        Err(error) => {
            tracing::error!(%error, "edge engine exited with a fatal error");
            ExitCode::from(3)
        }
    }
}

fn load_config(
    config_path: &str,
    rebirth: &RebirthRequestHandle,
    bd_seq: &BdSeqHandle,
    backpressure: &BackpressureHandle,
) -> Result<Config<PipelineMessage>, config::Error> {
    Config::load_with_factories(
        config_path.to_string(),
        Arc::new(PlcReceiverFactory::new(backpressure.clone())),
        Arc::new(OeeProcessorFactory::new(rebirth.clone(), bd_seq.clone())),
        Arc::new(PublisherFactory::new(backpressure.clone(), rebirth.clone(), bd_seq.clone())),
    )
}

/// Watches for the graceful-shutdown signal (§5's drain sequence) and, on
/// receipt, asks the engine to stop every pipeline. `thread_per_core::Engine`
/// blocks its command loop on a dedicated single-threaded runtime, so the
/// wait for Ctrl-C runs on its own native thread instead.
fn spawn_shutdown_on_ctrl_c(command_handler: engine::CommandHandler) {
    let _ = std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build shutdown-watcher runtime");
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received shutdown signal, draining pipelines");
                if let Err(error) = command_handler.send(Command::StopAll) {
                    tracing::error!(%error, "failed to request engine shutdown");
                }
            }
        });
    });
}
