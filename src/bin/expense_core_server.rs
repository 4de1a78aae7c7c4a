use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use expense_core::config::{self, Config, StorageKind};
use expense_core::errors::Result;
use expense_core::http::{self, ApiService};
use expense_core::service::TrackerService;
use expense_core::storage::{ExpenseStore, JsonStore, SqliteStore};
use expense_core::time::SystemClock;
use expense_core::watchdog::Watchdog;

fn main() {
    expense_core::init();
    if let Err(err) = run() {
        error!(error = %err, "server failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let base = config::app_data_dir();
    config::ensure_dir(&base)?;
    let cfg = Config::load_or_default(&base)?;

    // Storage connectivity failure is fatal here, before any route exists.
    let store: Arc<dyn ExpenseStore> = match cfg.backend {
        StorageKind::Sqlite => Arc::new(SqliteStore::open(&config::sqlite_path_in(&base))?),
        StorageKind::Json => Arc::new(JsonStore::open(config::json_path_in(&base))?),
    };
    store.seed_default_categories()?;
    info!(backend = ?cfg.backend, base = %base.display(), "storage ready");

    let watchdog = Arc::new(Watchdog::new(cfg.watchdog_grace(), cfg.watchdog_idle()));
    if cfg.watchdog_enabled {
        let monitor = Arc::clone(&watchdog);
        thread::spawn(move || monitor.run());
    }

    let service = Arc::new(TrackerService::new(store, Arc::new(SystemClock)));
    let api = ApiService::new(service, watchdog);
    info!(addr = %cfg.listen_addr, workers = cfg.http_workers, "starting server");
    http::serve(api, &cfg.listen_addr, cfg.http_workers)?;
    Ok(())
}
