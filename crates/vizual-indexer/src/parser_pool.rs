//! Tree-sitter parsing off the async runtime
//!
//! A `Parser` is not `Sync`, so each worker thread owns one and takes jobs from a shared
//! queue. Workers exit once every pool handle is dropped.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, trace, warn};
use tree_sitter::{Language, Parser, Tree};

/// Source languages that have an outline grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Go,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        let file_type = match ext {
            "rs" => FileType::Rust,
            "ts" | "mts" | "cts" => FileType::TypeScript,
            "tsx" => FileType::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => FileType::JavaScript,
            "py" | "pyi" => FileType::Python,
            "go" => FileType::Go,
            _ => return None,
        };
        Some(file_type)
    }

    pub fn language(self) -> Language {
        match self {
            FileType::Rust => tree_sitter_rust::LANGUAGE.into(),
            FileType::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            FileType::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            FileType::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            FileType::Python => tree_sitter_python::LANGUAGE.into(),
            FileType::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }
}

#[derive(Debug)]
pub struct ParseRequest {
    pub file_type: FileType,
    pub content: String,
}

/// The syntax tree together with the text it borrows positions from.
#[derive(Debug)]
pub struct ParseResult {
    pub file_type: FileType,
    pub tree: Tree,
    pub content: String,
}

struct Job {
    request: ParseRequest,
    reply: Sender<Result<ParseResult>>,
}

type JobQueue = Arc<Mutex<Receiver<Job>>>;

/// Cheap to clone; all clones feed the same workers.
#[derive(Clone)]
pub struct ParserPool {
    jobs: Sender<Job>,
}

impl std::fmt::Debug for ParserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserPool").finish_non_exhaustive()
    }
}

impl ParserPool {
    /// Start `workers` parser threads (at least one).
    pub fn new(workers: usize) -> Self {
        let (jobs, queue) = mpsc::channel::<Job>();
        let queue: JobQueue = Arc::new(Mutex::new(queue));
        for id in 0..workers.max(1) {
            let queue = Arc::clone(&queue);
            let spawned = thread::Builder::new()
                .name(format!("vizual-parser-{id}"))
                .spawn(move || Worker::new(id).run(&queue));
            if let Err(e) = spawned {
                warn!("Cannot start parser worker {}: {}", id, e);
            }
        }
        ParserPool { jobs }
    }

    /// Parse on a worker, blocking the calling thread until it answers.
    pub fn parse_blocking(&self, request: ParseRequest) -> Result<ParseResult> {
        let (reply, answer) = mpsc::channel();
        self.jobs
            .send(Job { request, reply })
            .map_err(|_| anyhow!("no parser worker is running"))?;
        answer.recv().context("parser worker stopped before answering")?
    }

    pub async fn parse(&self, request: ParseRequest) -> Result<ParseResult> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.parse_blocking(request))
            .await
            .context("parse task panicked")?
    }
}

struct Worker {
    id: usize,
    parser: Parser,
    /// Language currently loaded into `parser`.
    loaded: Option<FileType>,
}

impl Worker {
    fn new(id: usize) -> Self {
        Worker {
            id,
            parser: Parser::new(),
            loaded: None,
        }
    }

    fn run(mut self, queue: &JobQueue) {
        debug!("Parser worker {} started", self.id);
        loop {
            // Only one worker waits on the queue at a time; the lock is released
            // before parsing.
            let job = queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();
            let Ok(Job { request, reply }) = job else {
                break;
            };
            // The caller may have given up waiting.
            let _ = reply.send(self.parse(request));
        }
        debug!("Parser worker {} stopped", self.id);
    }

    fn parse(&mut self, request: ParseRequest) -> Result<ParseResult> {
        if self.loaded != Some(request.file_type) {
            trace!("Worker {} switching to {:?}", self.id, request.file_type);
            self.loaded = None;
            self.parser
                .set_language(&request.file_type.language())
                .with_context(|| format!("incompatible {:?} grammar", request.file_type))?;
            self.loaded = Some(request.file_type);
        }
        let tree = self
            .parser
            .parse(&request.content, None)
            .ok_or_else(|| anyhow!("tree-sitter returned no tree"))?;
        Ok(ParseResult {
            file_type: request.file_type,
            tree,
            content: request.content,
        })
    }
}

/// Pool sized to the machine: one worker per core, between 2 and 8.
pub fn create_parser_pool() -> ParserPool {
    let cores = thread::available_parallelism().map_or(2, |n| n.get());
    ParserPool::new(cores.clamp(2, 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(file_type: FileType, content: &str) -> ParseRequest {
        ParseRequest {
            file_type,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("rs"), Some(FileType::Rust));
        assert_eq!(FileType::from_extension("tsx"), Some(FileType::Tsx));
        assert_eq!(FileType::from_extension("mjs"), Some(FileType::JavaScript));
        assert_eq!(FileType::from_extension("md"), None);
    }

    #[test]
    fn test_worker_switches_languages() {
        let pool = ParserPool::new(1);
        let rust = pool.parse_blocking(request(FileType::Rust, "fn main() {}\n")).unwrap();
        let go = pool
            .parse_blocking(request(FileType::Go, "package main\n\nfunc main() {}\n"))
            .unwrap();
        let again = pool.parse_blocking(request(FileType::Rust, "struct S;\n")).unwrap();

        assert_eq!(rust.tree.root_node().kind(), "source_file");
        assert_eq!(go.file_type, FileType::Go);
        assert!(!go.tree.root_node().has_error());
        assert_eq!(again.content, "struct S;\n");
    }

    #[tokio::test]
    async fn test_parse_typescript() {
        let pool = create_parser_pool();
        let result = pool
            .parse(request(
                FileType::TypeScript,
                "class MyClass {\n    method() {\n        console.log(\"Hello\");\n    }\n}\n",
            ))
            .await
            .unwrap();
        assert_eq!(result.tree.root_node().kind(), "program");
    }
}
