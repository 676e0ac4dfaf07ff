//! In-process debug host, driven programmatically

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, info};
use vizual_core::{Locator, Result, VizualError};

use crate::dap::StackFrame;
use crate::host::{AdapterEvent, DebugHost, DebugSession, HostEvent, SessionId};

const EVENT_CAPACITY: usize = 64;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A session whose call stack is set by the caller.
pub struct LocalSession {
    id: SessionId,
    events: broadcast::Sender<AdapterEvent>,
    /// One stack per thread, innermost frame first.
    stacks: Mutex<Vec<Vec<StackFrame>>>,
    failing: Mutex<bool>,
    requests: AtomicUsize,
}

impl LocalSession {
    pub fn new(id: SessionId) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        LocalSession {
            id,
            events,
            stacks: Mutex::new(Vec::new()),
            failing: Mutex::new(false),
            requests: AtomicUsize::new(0),
        }
    }

    /// Record the paused stacks without announcing them.
    pub fn set_stacks(&self, stacks: Vec<Vec<StackFrame>>) {
        *lock(&self.stacks) = stacks;
    }

    /// Pause with the given per-thread stacks and send `stopped`.
    pub fn pause(&self, stacks: Vec<Vec<StackFrame>>) {
        self.set_stacks(stacks);
        self.send(AdapterEvent::Stopped);
    }

    /// Clear the stacks and send `continued`.
    pub fn resume(&self) {
        lock(&self.stacks).clear();
        self.send(AdapterEvent::Continued);
    }

    pub fn send(&self, event: AdapterEvent) {
        debug!("{} emits {:?}", self.id, event);
        let _ = self.events.send(event);
    }

    /// Make introspection requests fail, as adapters without stack support do.
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.failing) = failing;
    }

    /// Number of adapter requests served.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DebugSession for LocalSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn tap(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }

    async fn custom_request(&self, command: &str, arguments: Value) -> Result<Value> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.failing) {
            return Err(VizualError::protocol(command, "request not supported"));
        }

        let stacks = lock(&self.stacks).clone();
        match command {
            "threads" => {
                let threads: Vec<Value> = (1..=stacks.len())
                    .map(|id| json!({ "id": id, "name": format!("thread-{id}") }))
                    .collect();
                Ok(json!({ "threads": threads }))
            }
            "stackTrace" => {
                let thread_id = arguments["threadId"].as_u64().unwrap_or(0) as usize;
                let levels = arguments["levels"].as_u64().unwrap_or(u64::MAX) as usize;
                let frames = thread_id
                    .checked_sub(1)
                    .and_then(|index| stacks.get(index))
                    .ok_or_else(|| VizualError::protocol(command, format!("unknown thread {thread_id}")))?;
                let shown: Vec<&StackFrame> = frames.iter().take(levels).collect();
                Ok(json!({ "stackFrames": shown, "totalFrames": frames.len() }))
            }
            other => Err(VizualError::protocol(other, "unknown command")),
        }
    }
}

/// [`DebugHost`] whose breakpoints, focus and sessions are set by the caller.
pub struct LocalHost {
    breakpoints: Mutex<Vec<Locator>>,
    focused: Mutex<Option<Locator>>,
    session: Mutex<Option<Arc<LocalSession>>>,
    next_session: AtomicU64,
    events: broadcast::Sender<HostEvent>,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHost {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        LocalHost {
            breakpoints: Mutex::new(Vec::new()),
            focused: Mutex::new(None),
            session: Mutex::new(None),
            next_session: AtomicU64::new(1),
            events,
        }
    }

    pub fn set_breakpoints(&self, locators: Vec<Locator>) {
        *lock(&self.breakpoints) = locators;
        self.emit(HostEvent::BreakpointsChanged);
    }

    pub fn focus(&self, locator: Option<Locator>) {
        *lock(&self.focused) = locator;
        self.emit(HostEvent::ActiveEditorChanged);
    }

    /// Start a new session; it becomes the active one.
    pub fn start_session(&self) -> Arc<LocalSession> {
        let id = SessionId(self.next_session.fetch_add(1, Ordering::SeqCst));
        let session = Arc::new(LocalSession::new(id));
        *lock(&self.session) = Some(session.clone());
        info!("Debug {} started", id);
        self.emit(HostEvent::SessionStarted(session.clone()));
        session
    }

    pub fn terminate_session(&self, id: SessionId) {
        {
            let mut active = lock(&self.session);
            if active.as_ref().is_some_and(|session| session.id() == id) {
                *active = None;
            }
        }
        info!("Debug {} terminated", id);
        self.emit(HostEvent::SessionTerminated(id));
    }

    pub fn local_session(&self) -> Option<Arc<LocalSession>> {
        lock(&self.session).clone()
    }

    fn emit(&self, event: HostEvent) {
        // No receivers just means no tracker is attached.
        let _ = self.events.send(event);
    }
}

impl DebugHost for LocalHost {
    fn breakpoints(&self) -> Vec<Locator> {
        lock(&self.breakpoints).clone()
    }

    fn focused_locator(&self) -> Option<Locator> {
        lock(&self.focused).clone()
    }

    fn active_session(&self) -> Option<Arc<dyn DebugSession>> {
        self.local_session()
            .map(|session| session as Arc<dyn DebugSession>)
    }

    fn events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}
