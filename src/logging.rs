use std::io::Write;

use log::LevelFilter;

/// Map `-q`/`-v` flags onto a level for this crate's records.
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger. `RUST_LOG`, when set, takes precedence over the
/// verbosity flags.
pub fn setup_logger(verbose: u8, quiet: bool) {
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        builder.filter(None, LevelFilter::Warn);
        builder.filter(Some("attvis"), level_for(verbose, quiet));
    }

    builder.format(|buf, record| {
        let level_style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{} {level_style}{:<5}{level_style:#} {}",
            buf.timestamp_millis(),
            record.level(),
            record.args()
        )
    });

    // A second call (e.g. from tests) keeps the first logger.
    let _ = builder.try_init();
}
