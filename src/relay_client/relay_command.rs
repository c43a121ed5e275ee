use crate::relay::protocol::RelayMsg;

/// Commands issued by the application into the relay client's writer thread.
#[derive(Debug)]
pub enum RelayCommand {
    Send(RelayMsg),
    Disconnect,
}
