use colored::{Color, ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

/// Colours for the end-of-run summary.
pub struct Colors;

impl Colors {
    pub const SUCCESS: Color = Color::Green;
    pub const FAILURE: Color = Color::Red;
    pub const SKIPPED: Color = Color::Yellow;

    pub fn colorize(color: Color, text: &str) -> String {
        text.color(color).to_string()
    }
}

fn crate_level(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (true, _) => LevelFilter::Debug,
        (false, true) => LevelFilter::Warn,
        (false, false) => LevelFilter::Info,
    }
}

fn level_label(level: Level) -> Option<ColoredString> {
    match level {
        Level::Error => Some("ERROR".red()),
        Level::Warn => Some("WARN".yellow()),
        Level::Debug | Level::Trace => Some(level.as_str().dimmed()),
        Level::Info => None,
    }
}

fn format_line(record: &Record<'_>) -> String {
    let name = env!("CARGO_PKG_NAME").cyan();
    match level_label(record.level()) {
        Some(label) if record.level() <= Level::Warn => format!(
            "[{} {} {}] {}",
            name,
            label,
            record.target().white(),
            record.args()
        ),
        Some(label) => format!("[{} {}] {}", name, label, record.args()),
        None => format!("[{}] {}", name, record.args()),
    }
}

/// Dependencies log at Warn; this crate at Info, Debug with `verbose`.
/// `quiet` keeps our own messages to warnings and errors (used while a progress bar is drawn).
pub fn setup_logging(verbose: bool, quiet: bool) {
    let module = env!("CARGO_PKG_NAME").replace('-', "_");
    Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(&module, crate_level(verbose, quiet))
        .format(|buf, record| writeln!(buf, "{}", format_line(record)))
        .init();
}
