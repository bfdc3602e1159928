// jv_build - Build system and javac integration
pub mod classpath;
mod config;
pub mod javac;
pub mod jdk;
pub mod metadata;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use classpath::{expand_classpath, ClassBytes, ClassPath, ClassPathError};
pub use config::{JavacConfig, MetadataConfig, PlatformConfig};
pub use javac::{CompileOutcome, JavacInvocation};
pub use jdk::{discover_jdk, jdk_from_javac, JdkInfo};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Build configuration error: {0}")]
    ConfigError(String),
    #[error("JDK not found: {0}")]
    JdkNotFound(String),
    #[error("Failed to parse JDK version: {0}")]
    JdkVersionParse(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Classpath error: {0}")]
    ClassPath(#[from] ClassPathError),
    #[error("Failed to spawn CLI '{command}': {source}")]
    CliSpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests;
