// jv_java_syntax - Declaration-level Java syntax for Java interop
//! Parses Java compilation units into an immutable declaration tree.
//!
//! Only the declaration surface is kept: packages, imports, classes, members,
//! types, modifiers and annotations. [`TreePath`] chains give every node its
//! lexical context without parent pointers inside the tree.

pub mod decl;
pub mod parser;
pub mod path;
pub mod types;

pub use decl::*;
pub use parser::{JavaParser, SyntaxError};
pub use path::{Ancestors, PathNode, TreePath};
pub use types::*;
