use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Sets up `log` output: `Info` by default, `Debug` with `verbose`, and
/// `RUST_LOG` wins over both.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        // HTML parsing is noisy at debug level.
        .filter(Some("html5ever"), LevelFilter::Warn)
        .filter(Some("selectors"), LevelFilter::Warn);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();

    log::info!("Logger initialized.");
}
