use crate::classpath::expand_classpath;
use crate::BuildError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of one Java interop compilation job.
///
/// ```toml
/// sources = ["src/main/java/pack/A.java"]
/// classpath = ["lib/dep.jar"]
/// output_dir = "build/classes"
/// platform = "auto"          # or "disabled", or { jmods = "/opt/jdk/jmods" }
/// compiler_options = ["-parameters"]
///
/// [metadata]
/// annotation = "Ljv/Metadata;"
/// version = [1, 0, 0]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JavacConfig {
    pub sources: Vec<PathBuf>,
    /// Raw entries; each may hold several paths joined by the platform separator.
    pub classpath: Vec<String>,
    pub output_dir: PathBuf,
    pub platform: PlatformConfig,
    /// Explicit `javac` executable; discovered from the JDK when unset.
    pub javac: Option<PathBuf>,
    pub compiler_options: Vec<String>,
    pub metadata: MetadataConfig,
}

impl Default for JavacConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            classpath: Vec::new(),
            output_dir: PathBuf::from("./out"),
            platform: PlatformConfig::Auto,
            javac: None,
            compiler_options: Vec::new(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl JavacConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, BuildError> {
        toml::from_str(source).map_err(|error| BuildError::ConfigError(error.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source).map_err(|error| match error {
            BuildError::ConfigError(message) => {
                BuildError::ConfigError(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.sources = sources.into_iter().collect();
        self
    }

    pub fn with_classpath<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.classpath = entries
            .into_iter()
            .map(|entry| entry.to_string_lossy().into_owned())
            .collect();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_platform(mut self, platform: PlatformConfig) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_javac(mut self, javac: impl Into<PathBuf>) -> Self {
        self.javac = Some(javac.into());
        self
    }

    pub fn with_compiler_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compiler_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataConfig) -> Self {
        self.metadata = metadata;
        self
    }

    /// Classpath entries split into individual paths.
    pub fn classpath_entries(&self) -> Vec<PathBuf> {
        expand_classpath(&self.classpath)
    }
}

/// Where platform classes (`java.lang.*`) come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPlatform")]
pub enum PlatformConfig {
    /// `jmods` of the discovered JDK, silently absent when no JDK is found.
    Auto,
    Disabled,
    Jmods(PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlatform {
    Keyword(String),
    Table { jmods: PathBuf },
}

impl TryFrom<RawPlatform> for PlatformConfig {
    type Error = String;

    fn try_from(raw: RawPlatform) -> Result<Self, Self::Error> {
        match raw {
            RawPlatform::Keyword(keyword) => match keyword.as_str() {
                "auto" => Ok(PlatformConfig::Auto),
                "disabled" => Ok(PlatformConfig::Disabled),
                other => Err(format!(
                    "unknown platform `{other}`; expected \"auto\", \"disabled\" or {{ jmods = \"...\" }}"
                )),
            },
            RawPlatform::Table { jmods } => Ok(PlatformConfig::Jmods(jmods)),
        }
    }
}

/// Managed metadata annotation carried by classes the jv compiler emits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Field descriptor of the annotation type.
    pub annotation: String,
    /// Newest metadata version this reader understands.
    pub version: Vec<u32>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            annotation: "Ljv/Metadata;".to_string(),
            version: vec![1, 0, 0],
        }
    }
}

impl MetadataConfig {
    /// Same major version and a minor version no newer than the supported one.
    pub fn is_compatible(&self, version: &[u32]) -> bool {
        match (version, self.version.as_slice()) {
            ([major, minor, ..], [supported_major, supported_minor, ..]) => {
                major == supported_major && minor <= supported_minor
            }
            _ => false,
        }
    }
}
