mod input;
mod render;
mod runtime;
mod ui;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;

use lichen_core::config::CoreConfig;
use lichen_core::input::load_input_file;
use lichen_core::output::load_output_file;
use lichen_core::runtime::{CoreRuntime, WORKER_THREAD_NAME};
use lichen_core::store::AttributionStore;
use lichen_core::tracing_setup::init_tracing;

use crate::runtime::run_app;
use crate::ui::App;

/// Audit and edit license attributions for a scanned codebase.
#[derive(Parser)]
#[command(name = "lichen-tui", version)]
struct Args {
    /// Input attribution file (scanned resources + detected signals)
    input: PathBuf,

    /// Output file for manual attributions and resolved signals
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    // Set up panic hook to restore terminal on panic. The aggregation
    // worker absorbs its own panics and keeps running, so its thread is
    // exempt; only panics that unwind the UI tear the terminal down.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if std::thread::current().name() == Some(WORKER_THREAD_NAME) {
            return;
        }
        let _ = ui::restore_terminal();
        eprintln!("\n{}", panic_info);
        original_hook(panic_info);
    }));

    let config = CoreConfig::new(&args.input, args.output);
    let input = load_input_file(&config.input_path)?;
    let output = load_output_file(&config.output_path)?;

    let mut store = AttributionStore::new();
    store.load(input, output);
    let store = Rc::new(RefCell::new(store));

    let mut core_runtime = CoreRuntime::new();
    let core_handle = core_runtime.handle();
    let reply_rx = core_runtime
        .take_reply_rx()
        .ok_or_else(|| anyhow::anyhow!("core runtime already has an active reply receiver"))?;

    let mut app = App::new(
        config,
        store,
        Some(core_handle),
        Some(reply_rx),
        core_runtime.stats(),
    );
    app.seed_worker_cache();

    let mut terminal = ui::init_terminal()?;
    let result = run_app(&mut terminal, &mut app).await;

    core_runtime.shutdown();
    ui::restore_terminal()?;

    if let Err(err) = result {
        eprintln!("Error: {err}");
    }

    Ok(())
}
