//! Capabilities the tracker needs from the debugger host

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use vizual_core::{Locator, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Debug adapter events the tracker reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    Stopped,
    Continued,
    Terminated,
    Other(String),
}

#[derive(Deserialize)]
struct ProtocolMessage {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    event: Option<String>,
}

impl AdapterEvent {
    pub fn from_name(name: &str) -> Self {
        match name {
            "stopped" => AdapterEvent::Stopped,
            "continued" => AdapterEvent::Continued,
            "terminated" => AdapterEvent::Terminated,
            other => AdapterEvent::Other(other.to_string()),
        }
    }

    /// Classify a raw adapter message. Requests, responses and malformed messages yield
    /// `None`.
    pub fn classify(message: &Value) -> Option<Self> {
        let message = ProtocolMessage::deserialize(message).ok()?;
        if message.type_ != "event" {
            return None;
        }
        message.event.as_deref().map(Self::from_name)
    }
}

/// A running debug session.
#[async_trait]
pub trait DebugSession: Send + Sync {
    fn id(&self) -> SessionId;

    /// Adapter events sent by this session from now on.
    fn tap(&self) -> broadcast::Receiver<AdapterEvent>;

    /// Send a request to the debug adapter and return its response body.
    async fn custom_request(&self, command: &str, arguments: Value) -> Result<Value>;
}

/// Host-side events.
#[derive(Clone)]
pub enum HostEvent {
    BreakpointsChanged,
    ActiveEditorChanged,
    SessionStarted(Arc<dyn DebugSession>),
    SessionTerminated(SessionId),
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::BreakpointsChanged => f.write_str("BreakpointsChanged"),
            HostEvent::ActiveEditorChanged => f.write_str("ActiveEditorChanged"),
            HostEvent::SessionStarted(session) => {
                f.debug_tuple("SessionStarted").field(&session.id()).finish()
            }
            HostEvent::SessionTerminated(id) => f.debug_tuple("SessionTerminated").field(id).finish(),
        }
    }
}

/// The editor / debugger host.
pub trait DebugHost: Send + Sync {
    /// Locators of every file holding a source breakpoint.
    fn breakpoints(&self) -> Vec<Locator>;

    fn focused_locator(&self) -> Option<Locator>;

    fn active_session(&self) -> Option<Arc<dyn DebugSession>>;

    fn events(&self) -> broadcast::Receiver<HostEvent>;
}
