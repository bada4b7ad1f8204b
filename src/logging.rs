use env_logger::Env;

// reqwest logs connection reads and writes at trace level under this target.
const WIRE_TARGET: &str = "reqwest::connect::verbose";

/// Install the global logger.
///
/// Advisory warnings are always shown; `verbose` adds debug output and the
/// raw connection traffic. `RUST_LOG` takes precedence over both.
pub fn init(verbose: bool) {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn default_filter(verbose: bool) -> String {
    if verbose {
        format!("debug,{WIRE_TARGET}=trace")
    } else {
        "warn".to_string()
    }
}
