pub mod relay_client_c;
pub mod relay_client_error;
pub mod relay_command;
pub mod relay_event;
pub use relay_client_c::RelayClient;
pub use relay_client_error::RelayClientError;
pub use relay_event::RelayEvent;
