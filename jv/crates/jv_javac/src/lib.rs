// jv_javac - Java symbol bridge for the jv compiler
//! Resolves Java classes, packages and types for jv's type resolution.
//!
//! A [`JavacSession`] owns one compilation job: it parses the Java sources
//! once, reads classfiles from the classpath on demand, runs `javac`, and
//! re-enters the classes `javac` produced. Every class it hands out is a
//! [`JavaClass`], whether it came from a source tree or a classfile.

pub mod finder;
pub mod metadata;
pub mod model;
pub mod name;
mod resolve;
pub mod session;

pub use finder::{JavaClassFinder, SearchScope};
pub use metadata::{read_class_metadata, ClassMetadata, MetadataError, MetadataKind};
pub use model::{
    AnnotationArgument, ClassOrigin, ClassifierRef, JavaAnnotation, JavaClass, JavaClassifier,
    JavaClassifierType, JavaConstructor, JavaField, JavaMethod, JavaPackage, JavaType,
    JavaTypeParameter, JavaValueParameter, LiteralValue, ModelError, Visibility,
};
pub use name::{ClassId, FqName};
pub use session::{JavacSession, PackageFlags, SessionState};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JavacError {
    #[error("javac session is closed")]
    Closed,
    #[error(transparent)]
    Syntax(#[from] jv_java_syntax::SyntaxError),
    #[error(transparent)]
    Build(#[from] jv_build::BuildError),
    #[error(transparent)]
    ClassPath(#[from] jv_build::ClassPathError),
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
