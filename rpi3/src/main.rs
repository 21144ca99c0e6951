mod cmd;
mod error;
mod hardware;
mod init;

use std::env;
use std::error::Error;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use trach::conf::Conf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let conf = match env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Conf::load(path)?
        }
        None => Conf::default(),
    };

    let bench = init::hardware_init(&conf)?;
    info!("Init done");

    let bench: init::BenchMutex = Arc::new(Mutex::new(bench));
    let cancel = CancellationToken::new();
    let (shutdown_send, mut shutdown_recv) = mpsc::unbounded_channel();
    let _cmd_thread = cmd::manual_cmds(bench.clone(), cancel.clone(), shutdown_send);

    tokio::select! {
        res = signal::ctrl_c() => match res {
            Ok(()) => info!("Interrupted"),
            // we also shut down in case of error
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        },
        _ = shutdown_recv.recv() => info!("Quit"),
    }

    // Cleanup
    cancel.cancel();
    let cleanup = tokio::task::spawn_blocking(move || {
        let mut lock = bench.lock();
        lock.shutdown()
    })
    .await?;
    match cleanup {
        Ok(()) => println!("Cleanup successful"),
        Err(e) => error!("Cleanup incomplete: {}", e),
    }
    Ok(())
}
