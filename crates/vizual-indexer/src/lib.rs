//! Lazy population of the code graph: folders from a directory lister, files from a
//! symbol resolver

pub mod languages;
pub mod memory;
pub mod outline;
pub mod parser_pool;
pub mod scanner;
pub mod source;
pub mod symbols;


pub use languages::TreeSitterResolver;
pub use memory::{MemoryLister, MemoryResolver};
pub use outline::{OutlineSymbol, SymbolKind, SymbolResolver};
pub use parser_pool::{FileType, ParseRequest, ParseResult, ParserPool, create_parser_pool};
pub use scanner::DirectoryExpander;
pub use source::{DirEntry, DirectoryLister, FsLister};
pub use symbols::SymbolExpander;
