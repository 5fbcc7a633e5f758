use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// `RUST_LOG`, when set, overrides `level`.
pub fn init(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{}: {}: {}: {}",
                buf.timestamp(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();
}
