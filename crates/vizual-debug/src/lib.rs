//! Debugger state overlay: breakpoints, focused editor and paused call stack

pub mod dap;
pub mod host;
pub mod local;
pub mod reconcile;
pub mod tracker;

#[cfg(test)]
pub mod tests;

pub use dap::{Source, StackFrame, Thread, list_threads, stack_frames};
pub use host::{AdapterEvent, DebugHost, DebugSession, HostEvent, SessionId};
pub use local::{LocalHost, LocalSession};
pub use reconcile::{
    FrameTarget, MAX_STACK_FRAMES, StackSnapshot, apply_breakpoints, apply_focus, apply_stack,
    capture, clear_debug,
};
pub use tracker::{DebugStateTracker, TrackerOptions};
