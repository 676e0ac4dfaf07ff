//! Debug state tracker: reconciles host and adapter events into node flags

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use vizual_core::{Locator, SharedStore};

use crate::host::{AdapterEvent, DebugHost, DebugSession, HostEvent, SessionId};
use crate::reconcile::{apply_breakpoints, apply_focus, apply_stack, capture, clear_debug};

#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Delay before re-reading the stack of a newly started session, which may already
    /// be paused by the time its event tap is installed.
    pub recheck_delay: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        TrackerOptions {
            recheck_delay: Duration::from_millis(100),
        }
    }
}

/// Aborts its task when dropped.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Default)]
struct SessionState {
    current: Option<SessionId>,
    tasks: Vec<TaskGuard>,
}

struct Inner {
    store: SharedStore,
    host: Arc<dyn DebugHost>,
    options: TrackerOptions,
    session: Mutex<SessionState>,
}

/// Keeps the overlay flags of the graph in sync with the debugger.
///
/// Dropping the tracker (or calling [`DebugStateTracker::dispose`]) stops every task it
/// spawned.
pub struct DebugStateTracker {
    inner: Arc<Inner>,
    tasks: Vec<TaskGuard>,
}

impl DebugStateTracker {
    /// Subscribe to `host`, adopt its active session if any, and apply the current
    /// breakpoints and focus.
    pub async fn attach(store: SharedStore, host: Arc<dyn DebugHost>, options: TrackerOptions) -> Self {
        let inner = Arc::new(Inner {
            store,
            host,
            options,
            session: Mutex::new(SessionState::default()),
        });

        let events = inner.host.events();
        let host_task = tokio::spawn(inner.clone().run_host(events));

        if let Some(session) = inner.host.active_session() {
            inner.attach_session(session);
        }
        inner.update_breakpoints().await;
        inner.update_focus().await;

        info!("Debug state tracker attached");
        DebugStateTracker {
            inner,
            tasks: vec![TaskGuard(host_task)],
        }
    }

    /// Session whose events are currently tracked.
    pub fn current_session(&self) -> Option<SessionId> {
        self.inner.lock_session().current
    }

    pub fn is_attached(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn dispose(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.tasks.clear();
        let session_tasks = {
            let mut state = self.inner.lock_session();
            state.current = None;
            std::mem::take(&mut state.tasks)
        };
        drop(session_tasks);
        debug!("Debug state tracker disposed");
    }
}

impl Drop for DebugStateTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, SessionState> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, id: SessionId) -> bool {
        self.lock_session().current == Some(id)
    }

    async fn run_host(self: Arc<Self>, mut events: Receiver<HostEvent>) {
        loop {
            match events.recv().await {
                Ok(HostEvent::BreakpointsChanged) => self.update_breakpoints().await,
                Ok(HostEvent::ActiveEditorChanged) => self.update_focus().await,
                Ok(HostEvent::SessionStarted(session)) => self.attach_session(session),
                Ok(HostEvent::SessionTerminated(id)) => self.session_terminated(id).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {} host events, resynchronizing", skipped);
                    self.update_breakpoints().await;
                    self.update_focus().await;
                }
                Err(RecvError::Closed) => {
                    debug!("Host event stream closed");
                    break;
                }
            }
        }
    }

    /// Replace the tracked session: new event tap plus one deferred stack re-check.
    fn attach_session(self: &Arc<Self>, session: Arc<dyn DebugSession>) {
        let id = session.id();
        let previous = {
            let mut state = self.lock_session();
            state.current = Some(id);
            std::mem::take(&mut state.tasks)
        };
        drop(previous);

        let tap = session.tap();
        let tap_task = tokio::spawn(self.clone().run_tap(session.clone(), tap));

        let inner = self.clone();
        let delay = self.options.recheck_delay;
        let recheck_task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.refresh(session.as_ref()).await;
        });

        let mut state = self.lock_session();
        if state.current == Some(id) {
            state.tasks = vec![TaskGuard(tap_task), TaskGuard(recheck_task)];
        } else {
            tap_task.abort();
            recheck_task.abort();
        }
        info!("Tracking debug {}", id);
    }

    async fn run_tap(self: Arc<Self>, session: Arc<dyn DebugSession>, mut tap: Receiver<AdapterEvent>) {
        let id = session.id();
        loop {
            match tap.recv().await {
                Ok(AdapterEvent::Stopped) => self.refresh(session.as_ref()).await,
                Ok(AdapterEvent::Continued | AdapterEvent::Terminated) => {
                    if self.is_current(id) {
                        self.clear().await;
                    }
                }
                Ok(AdapterEvent::Other(name)) => trace!("Ignoring adapter event '{}'", name),
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} adapter events from {}", skipped, id),
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Re-read the paused stack and overlay it. Failures leave the flags as they were.
    async fn refresh(&self, session: &dyn DebugSession) {
        let id = session.id();
        let snapshot = match capture(session).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Stack introspection for {} failed: {}", id, e);
                return;
            }
        };
        if !self.is_current(id) {
            debug!("Discarding stack of superseded {}", id);
            return;
        }

        let mut store = self.store.write().await;
        apply_stack(&mut store, &snapshot);
        debug!("Applied paused stack of {} ({} frames)", id, snapshot.targets().len());
    }

    async fn clear(&self) {
        let mut store = self.store.write().await;
        clear_debug(&mut store);
    }

    async fn session_terminated(&self, id: SessionId) {
        let finished = {
            let mut state = self.lock_session();
            if state.current == Some(id) {
                state.current = None;
                std::mem::take(&mut state.tasks)
            } else {
                Vec::new()
            }
        };
        drop(finished);
        info!("Debug {} ended", id);
        self.clear().await;
    }

    async fn update_breakpoints(&self) {
        let breakpoints: HashSet<Locator> = self.host.breakpoints().into_iter().collect();
        let mut store = self.store.write().await;
        apply_breakpoints(&mut store, &breakpoints);
    }

    async fn update_focus(&self) {
        let focused = self.host.focused_locator();
        let mut store = self.store.write().await;
        apply_focus(&mut store, focused.as_ref());
    }
}
