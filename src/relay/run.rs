use std::io;
use std::sync::Arc;

use crate::log::LogSink;
use crate::relay::relay_server::RelayServer;

/// Bind and run the relay on `addr`, logging to `log_sink`. Blocks forever.
pub fn run_relay_with_log(addr: &str, log_sink: Arc<dyn LogSink>) -> io::Result<()> {
    RelayServer::bind(addr, log_sink)?.run()
}

/// Same as [`run_relay_with_log`] without logging.
pub fn run_relay(addr: &str) -> io::Result<()> {
    RelayServer::bind_no_log(addr)?.run()
}
