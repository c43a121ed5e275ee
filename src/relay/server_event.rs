use std::sync::mpsc::Sender;

use crate::relay::protocol::RelayMsg;
use crate::relay::types::ConnId;

/// Events sent *to* the central server loop.
pub enum ServerEvent {
    /// A connection was accepted; `to_client` feeds its writer thread.
    RegisterConnection {
        conn_id: ConnId,
        to_client: Sender<RelayMsg>,
    },

    /// A connection sent a relay message.
    MsgFromConnection { conn_id: ConnId, msg: RelayMsg },

    /// A connection closed or errored. May arrive twice (reader and writer).
    Disconnected { conn_id: ConnId },
}
