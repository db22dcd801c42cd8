use std::io::Write;

use env_logger::{Builder, Env};
use log::info;

/// Installs the process-wide logger. Level comes from `RUST_LOG`, default `info`.
pub fn setup_logger() {
    let result = Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:<5} [{}:{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        info!("Logger initialized");
    }
}
