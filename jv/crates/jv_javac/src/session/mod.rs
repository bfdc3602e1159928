//! One [`JavacSession`] per compilation job.
//!
//! ```text
//! Created --parse--> Parsed --compile--> Compiled --synchronize--> Synchronized
//!    \________________________\_______________________\____close____> Closed
//! ```
//!
//! Queries work in every state but `Closed`; before `parse` only classfiles
//! are visible.

mod context;
mod index;
mod sync;

pub(crate) use context::SessionContext;
pub(crate) use index::CompiledSymbol;
pub use index::PackageFlags;

use crate::finder::SearchScope;
use crate::model::{JavaClass, JavaPackage};
use crate::name::{ClassId, FqName};
use crate::JavacError;
use indexmap::IndexSet;
use jv_build::{discover_jdk, jdk_from_javac, ClassPath, CompileOutcome, JavacConfig, JavacInvocation, PlatformConfig};
use jv_java_syntax::CompilationUnit;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Created,
    Parsed,
    Compiled,
    Synchronized,
    Closed,
}

pub struct JavacSession {
    ctx: Rc<SessionContext>,
}

impl JavacSession {
    /// Opens the classpath (platform classes first) without parsing anything.
    pub fn new(config: JavacConfig) -> Result<Self, JavacError> {
        let mut classpath = ClassPath::empty();
        match &config.platform {
            PlatformConfig::Disabled => {}
            PlatformConfig::Jmods(dir) => classpath.add_platform_modules(dir)?,
            PlatformConfig::Auto => add_discovered_platform(&mut classpath, &config)?,
        }
        for entry in config.classpath_entries() {
            classpath.append_root(&entry)?;
        }
        debug!(
            roots = classpath.roots().count(),
            sources = config.sources.len(),
            "created javac session"
        );
        Ok(Self {
            ctx: Rc::new(SessionContext::new(config, classpath)),
        })
    }

    /// [`new`](Self::new) followed by [`parse`](Self::parse).
    pub fn open(config: JavacConfig) -> Result<Self, JavacError> {
        let mut session = Self::new(config)?;
        session.parse()?;
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.ctx.state()
    }

    pub fn config(&self) -> &JavacConfig {
        self.ctx.config()
    }

    /// Parses and indexes the configured sources. Later calls do nothing.
    pub fn parse(&mut self) -> Result<(), JavacError> {
        self.ctx.ensure_open()?;
        if self.ctx.state() != SessionState::Created {
            return Ok(());
        }
        let files = self.ctx.parse_sources()?;
        info!(files, "parsed Java sources");
        self.ctx.set_state(SessionState::Parsed);
        Ok(())
    }

    /// Runs `javac` over the sources. Output already in the output directory
    /// is entered first, so this pass sees what earlier passes produced.
    pub fn compile(&mut self) -> Result<CompileOutcome, JavacError> {
        self.parse()?;
        let config = self.ctx.config();
        let output_dir = config.output_dir.clone();
        fs::create_dir_all(&output_dir).map_err(|source| JavacError::Io {
            path: output_dir.clone(),
            source,
        })?;
        sync::synchronize_output(&self.ctx, &output_dir)?;

        let javac = match &config.javac {
            Some(javac) => javac.clone(),
            None => discover_jdk()?.javac_path,
        };
        let mut classpath = config.classpath_entries();
        classpath.push(output_dir.clone());

        let sources = self.ctx.java_sources()?;
        let outcome = JavacInvocation::new(javac)
            .output_dir(output_dir)
            .classpath(classpath)
            .options(config.compiler_options.iter().cloned())
            .run(&sources)?;

        if outcome.success {
            info!(files = sources.len(), "javac compiled sources");
        } else {
            warn!(errors = outcome.error_count, "javac failed");
        }
        self.ctx.set_state(SessionState::Compiled);
        Ok(outcome)
    }

    /// Enters new or changed classfiles of the output directory. Returns how
    /// many were entered.
    pub fn synchronize(&mut self) -> Result<usize, JavacError> {
        self.ctx.ensure_open()?;
        let entered = sync::synchronize_output(&self.ctx, &self.ctx.config().output_dir)?;
        self.ctx.set_state(SessionState::Synchronized);
        Ok(entered)
    }

    /// Releases the parser and classpath archives. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.ctx.state() != SessionState::Closed {
            self.ctx.close();
        }
    }

    pub fn find_class(&self, fq_name: &FqName) -> Result<Option<JavaClass>, JavacError> {
        self.find_class_in(fq_name, SearchScope::Everything)
    }

    pub fn find_class_in(&self, fq_name: &FqName, scope: SearchScope) -> Result<Option<JavaClass>, JavacError> {
        self.ctx.find_class(fq_name, scope)
    }

    /// Like [`find_class`](Self::find_class), but the package split of the id
    /// must match too.
    pub fn find_class_by_id(&self, class_id: &ClassId) -> Result<Option<JavaClass>, JavacError> {
        let found = self.find_class(&class_id.as_fq_name())?;
        Ok(found.filter(|class| class.class_id() == *class_id))
    }

    pub fn find_package(&self, fq_name: &FqName) -> Result<Option<JavaPackage>, JavacError> {
        self.find_package_in(fq_name, SearchScope::Everything)
    }

    pub fn find_package_in(&self, fq_name: &FqName, scope: SearchScope) -> Result<Option<JavaPackage>, JavacError> {
        self.ctx.find_package(fq_name, scope)
    }

    pub fn find_sub_packages(&self, fq_name: &FqName) -> Result<Vec<JavaPackage>, JavacError> {
        self.ctx.find_sub_packages(fq_name)
    }

    /// Source classes of the package with all their nested classes, plus
    /// top-level classfiles of the package.
    pub fn find_classes_from_package(&self, fq_name: &FqName) -> Result<Vec<JavaClass>, JavacError> {
        self.ctx.package_members(fq_name, true)
    }

    /// `Ok(None)` means the names are unknown; a returned set is complete.
    pub fn known_class_names_in_package(&self, fq_name: &FqName) -> Result<Option<IndexSet<String>>, JavacError> {
        self.ctx.known_class_names_in_package(fq_name)
    }

    pub fn java_lang_object(&self) -> Result<Option<JavaClass>, JavacError> {
        self.find_class(&FqName::from("java.lang.Object"))
    }

    pub fn compilation_units(&self) -> Result<Vec<Arc<CompilationUnit>>, JavacError> {
        self.ctx.ensure_open()?;
        Ok(self.ctx.compilation_units())
    }
}

impl Drop for JavacSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Platform classes of the configured or discovered JDK: its `jmods`, or
/// `rt.jar` on runtime images without them. No JDK is not an error.
fn add_discovered_platform(classpath: &mut ClassPath, config: &JavacConfig) -> Result<(), JavacError> {
    let jdk = match &config.javac {
        Some(javac) => jdk_from_javac(javac),
        None => discover_jdk(),
    };
    let jdk = match jdk {
        Ok(jdk) => jdk,
        Err(error) => {
            debug!(%error, "no JDK found; platform classes unavailable");
            return Ok(());
        }
    };

    if let Some(jmods) = &jdk.jmods_dir {
        classpath.add_platform_modules(jmods)?;
        return Ok(());
    }
    let rt_jar = [
        jdk.java_home.join("jre").join("lib").join("rt.jar"),
        jdk.java_home.join("lib").join("rt.jar"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file());
    match rt_jar {
        Some(rt_jar) => classpath.append_root(&rt_jar)?,
        None => warn!(java_home = %jdk.java_home.display(), "JDK has neither jmods nor rt.jar"),
    }
    Ok(())
}
