//! # Network collaborator contract.
//!
//! The dispatch core does not speak any wire protocol. Instead it defines
//! the seam an external networking component plugs into:
//!
//! - Outbound: payloads emitted with network scope go to the installed
//!   [`NetworkTap`], and nothing else happens locally.
//! - Inbound: the tap calls [`Plant::deliver_net`](crate::Plant::deliver_net)
//!   with the decoded value and a [`NetworkSource`]; that turns into a
//!   local emit of [`NetworkData<T>`] whose reactions receive the source
//!   as a transient companion.
//! - Discovery: binding an `on_network::<T>` reaction announces itself
//!   through a direct emit of [`NetworkListen`], which a tap reactor can
//!   subscribe to in order to learn which types it should decode.

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use crate::events::{Payload, TypeKey};

/// Inbound payload wrapper: reactions bound with `on_network::<T>` are
/// triggered by `NetworkData<T>`, never by plain `T`.
pub struct NetworkData<T> {
    value: Arc<T>,
}

impl<T> NetworkData<T> {
    pub(crate) fn new(value: Arc<T>) -> Self {
        Self { value }
    }

    /// Shared handle to the decoded value.
    pub fn value(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }
}

impl<T> Deref for NetworkData<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Where an inbound payload came from.
#[derive(Clone, Debug)]
pub struct NetworkSource {
    /// Peer name as announced by the transport.
    pub name: String,
    /// Peer address.
    pub address: SocketAddr,
}

impl NetworkSource {
    pub fn new(name: impl Into<String>, address: SocketAddr) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// Announcement of a freshly bound network listener.
///
/// Emitted with direct scope while the binding call is still on the
/// stack, so a tap reactor observes every listener exactly once and
/// before any delivery can race it.
#[derive(Clone, Debug)]
pub struct NetworkListen {
    /// Key of the `NetworkData<T>` trigger the listener reacts to.
    pub key: TypeKey,
    /// Id of the bound reaction.
    pub reaction: u64,
}

/// Transport selector carried by network-scope emits.
///
/// `Any` leaves the choice to the tap; `Udp` and `Tcp` pin it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wire {
    Any,
    Udp,
    Tcp,
}

impl Wire {
    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Wire::Any => "any",
            Wire::Udp => "udp",
            Wire::Tcp => "tcp",
        }
    }
}

/// Outbound half of the network collaborator.
pub trait NetworkTap: Send + Sync + 'static {
    /// Receives every payload emitted with network scope. Serialization
    /// and transport are the tap's concern.
    fn outbound(&self, wire: Wire, key: TypeKey, payload: Payload);
}
