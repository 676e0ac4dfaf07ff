//! Debug adapter protocol bodies used for call-stack introspection

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use vizual_core::{Locator, Result, VizualError};

use crate::host::DebugSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Explicit resource locator, preferred over `path` when present.
    #[serde(default, alias = "locator", skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// One frame of a `stackTrace` response. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl StackFrame {
    /// A frame paused at `line` of the file at `path`.
    pub fn at(path: impl Into<String>, line: u32) -> Self {
        StackFrame {
            id: 0,
            name: String::new(),
            source: Some(Source {
                path: Some(path.into()),
                ..Source::default()
            }),
            line,
            column: 1,
        }
    }

    /// Locator of the frame's source, if it has one.
    pub fn locator(&self) -> Option<Locator> {
        let source = self.source.as_ref()?;
        if let Some(uri) = &source.uri {
            return Some(Locator::parse(uri));
        }
        source
            .path
            .as_deref()
            .map(|path| Locator::from_path(Path::new(path)))
    }
}

#[derive(Deserialize)]
struct ThreadsBody {
    threads: Vec<Thread>,
}

#[derive(Deserialize)]
struct StackTraceBody {
    #[serde(rename = "stackFrames")]
    stack_frames: Vec<StackFrame>,
}

fn parse_body<T: for<'de> Deserialize<'de>>(command: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| VizualError::protocol(command, e))
}

/// `threads` request.
pub async fn list_threads(session: &dyn DebugSession) -> Result<Vec<Thread>> {
    let body = session.custom_request("threads", Value::Null).await?;
    let body: ThreadsBody = parse_body("threads", body)?;
    Ok(body.threads)
}

/// `stackTrace` request for the innermost `levels` frames of a thread.
pub async fn stack_frames(session: &dyn DebugSession, thread_id: i64, levels: u32) -> Result<Vec<StackFrame>> {
    let arguments = json!({
        "threadId": thread_id,
        "startFrame": 0,
        "levels": levels,
    });
    let body = session.custom_request("stackTrace", arguments).await?;
    let body: StackTraceBody = parse_body("stackTrace", body)?;
    Ok(body.stack_frames)
}
