//! The central process: the MQTT subscriber (C3) through the Sparkplug
//! decoder, normalizer, OEE calculator, fault state machine (C6-C9), and
//! sink writer (C10), per §6's "process entrypoint: accepts a config path;
//! exit codes — 0 clean shutdown, 2 config error, 3 fatal runtime error".

use std::process::ExitCode;

use engine::{multi_threaded, Command, Engine as _, Error};
use mimalloc_rust::GlobalMiMalloc;
use oee_exporters::SinkWriterFactory;
use oee_mqtt::SubscriberFactory;
use oee_processors::OeeProcessorFactory;
use task::labels::ProcessLabels;

#[global_allocator]
static GLOBAL_MIMALLOC: GlobalMiMalloc = GlobalMiMalloc;

fn main() -> ExitCode {
    if let Err(error) = oee_observability::init() {
        eprintln!("failed to initialize logging: {error}");
    }

    let Some(config_path) = std::env::args().nth(1) else {
        eprintln!("usage: oee-central <config-file>");
        return ExitCode::from(2);
    };

    // Central has no encoder entries in its pipelines, so the rebirth/bd_seq
    // handles this factory carries are never read; the multi-threaded
    // engine loads the config once and propagates a bad one as a clean
    // `Err`, so no pre-validation pass is needed here (unlike `oee-edge`).
    let mut engine = multi_threaded::Engine::new(
        SubscriberFactory::default(),
        OeeProcessorFactory::default(),
        SinkWriterFactory::default(),
    );

    spawn_shutdown_on_ctrl_c(engine.command_handler());

    match engine.run(ProcessLabels::new("oee-central"), config_path) {
        Ok(()) => ExitCode::from(0),
        Err(Error::Config(error)) => {
            tracing::error!(%error, "central configuration rejected");
            ExitCode::from(2)
        }
        Err(error) => {
            tracing::error!(%error, "central engine exited with a fatal error");
            ExitCode::from(3)
        }
    }
}

/// Watches for the graceful-shutdown signal (§5's drain sequence) and, on
/// receipt, asks the engine to stop every pipeline.
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
