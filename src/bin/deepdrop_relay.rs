use std::sync::Arc;
use std::{env, process};

use deepdrop::config::Config;
use deepdrop::log::LogSink;
use deepdrop::log::logger::{Logger, LoggerOptions};
use deepdrop::relay::run_relay_with_log;

fn main() -> std::io::Result<()> {
    // --- Parse CLI args ----------------------------------------------------
    //
    // Supported:
    //   deepdrop-relay
    //      -> [relay] bind_addr from the config, else 0.0.0.0:$PORT (3000)
    //
    //   deepdrop-relay 0.0.0.0:6000
    //      -> binds to 0.0.0.0:6000
    //
    //   deepdrop-relay 127.0.0.1 7000
    //      -> binds to 127.0.0.1:7000

    let args: Vec<String> = env::args().collect();
    let config = Arc::new(Config::load_from_env());

    let addr = match args.len() {
        1 => config.relay_bind_addr(),
        2 => args[1].clone(),
        3 => format!("{}:{}", args[1], args[2]),
        _ => {
            eprintln!("Usage:");
            eprintln!("  {}                # listen on 0.0.0.0:$PORT (default 3000)", args[0]);
            eprintln!("  {} [ADDR]         # e.g. 0.0.0.0:6000", args[0]);
            eprintln!("  {} [IP] [PORT]    # e.g. 127.0.0.1 6000", args[0]);
            process::exit(1);
        }
    };

    // --- Start process logger ----------------------------------------------
    let logger = Logger::start_relay(LoggerOptions::default(), config);
    let log_sink: Arc<dyn LogSink> = Arc::new(logger.handle());

    eprintln!(
        "[deepdrop-relay] starting on {} (log: {})",
        addr,
        logger.file_path().display()
    );

    // --- Run relay (blocks) ------------------------------------------------
    run_relay_with_log(&addr, log_sink)
}
