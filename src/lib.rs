#![doc(test(attr(deny(warnings))))]

//! Expense Core records spending entries, monthly salary figures and a
//! category taxonomy, and derives running-balance statistics per month
//! behind a small embedded HTTP service.

pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod http;
pub mod month;
pub mod service;
pub mod stats;
pub mod storage;
pub mod time;
pub mod watchdog;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        init_tracing();
        tracing::info!("Expense Core tracing initialized.");
    });
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::from_default_env().add_directive("expense_core=info".parse().unwrap());

    fmt().with_env_filter(filter).init();
}
