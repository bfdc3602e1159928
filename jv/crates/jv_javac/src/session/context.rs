use super::index::{CompiledSymbol, SymbolIndex};
use super::SessionState;
use crate::finder::SearchScope;
use crate::model::{CompiledClass, JavaClass, JavaPackage, SourceClass};
use crate::name::FqName;
use crate::JavacError;
use indexmap::IndexSet;
use jv_build::metadata::{parse_class, ClassInfo};
use jv_build::{ClassPath, JavacConfig};
use jv_java_syntax::{CompilationUnit, JavaParser, TreePath};
use rustc_hash::FxHashSet;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Everything one compilation job knows. Adapters keep an `Rc` to it; the
/// index only stores plain data, never adapters.
pub(crate) struct SessionContext {
    config: JavacConfig,
    state: Cell<SessionState>,
    parser: RefCell<Option<JavaParser>>,
    pub(crate) classpath: RefCell<ClassPath>,
    pub(crate) index: RefCell<SymbolIndex>,
    resolving: RefCell<FxHashSet<(usize, String)>>,
}

impl SessionContext {
    pub(crate) fn new(config: JavacConfig, classpath: ClassPath) -> Self {
        Self {
            config,
            state: Cell::new(SessionState::Created),
            parser: RefCell::new(None),
            classpath: RefCell::new(classpath),
            index: RefCell::new(SymbolIndex::default()),
            resolving: RefCell::new(FxHashSet::default()),
        }
    }

    pub(crate) fn config(&self) -> &JavacConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        debug!(from = ?self.state.get(), to = ?state, "session state change");
        self.state.set(state);
    }

    pub(crate) fn ensure_open(&self) -> Result<(), JavacError> {
        if self.state.get() == SessionState::Closed {
            return Err(JavacError::Closed);
        }
        Ok(())
    }

    /// `.java` files named by the configuration; directories are walked.
    pub(crate) fn java_sources(&self) -> Result<Vec<PathBuf>, JavacError> {
        let mut files = Vec::new();
        for source in &self.config.sources {
            if source.is_dir() {
                collect_java_files(source, &mut files)?;
            } else {
                files.push(source.clone());
            }
        }
        Ok(files)
    }

    pub(crate) fn parse_sources(&self) -> Result<usize, JavacError> {
        let files = self.java_sources()?;
        let mut parser = self.parser.borrow_mut();
        if parser.is_none() {
            *parser = Some(JavaParser::new()?);
        }
        let Some(parser) = parser.as_mut() else {
            return Ok(0);
        };

        let mut units = Vec::with_capacity(files.len());
        for file in &files {
            let unit = parser.parse_file(file)?;
            if unit.syntax_errors > 0 {
                warn!(
                    file = %file.display(),
                    errors = unit.syntax_errors,
                    "Java source has syntax errors"
                );
            }
            units.push(Arc::new(unit));
        }

        let mut index = self.index.borrow_mut();
        for unit in units {
            index.add_unit(unit);
        }
        debug!(
            files = files.len(),
            classes = index.source_classes.len(),
            "indexed Java sources"
        );
        Ok(files.len())
    }

    pub(crate) fn compilation_units(&self) -> Vec<Arc<CompilationUnit>> {
        self.index.borrow().units.clone()
    }

    /// Releases the parser, the classpath archives and the index.
    pub(crate) fn close(&self) {
        self.parser.borrow_mut().take();
        self.classpath.borrow_mut().close();
        *self.index.borrow_mut() = SymbolIndex::default();
        self.set_state(SessionState::Closed);
    }

    pub(crate) fn find_class(
        self: &Rc<Self>,
        fq_name: &FqName,
        scope: SearchScope,
    ) -> Result<Option<JavaClass>, JavacError> {
        self.ensure_open()?;
        if fq_name.is_root() {
            return Ok(None);
        }
        if scope.includes_sources() {
            if let Some(class) = self.find_source_class(fq_name) {
                return Ok(Some(class));
            }
        }
        if scope.includes_compiled() {
            if let Some(class) = self.find_compiled_class(fq_name)? {
                return Ok(Some(JavaClass::Compiled(class)));
            }
        }
        Ok(None)
    }

    /// Exact match first, then declared member classes below the longest
    /// indexed prefix. Inherited members are not followed, so the result's
    /// name is always `fq_name`.
    fn find_source_class(self: &Rc<Self>, fq_name: &FqName) -> Option<JavaClass> {
        let (path, prefix) = {
            let index = self.index.borrow();
            if let Some(path) = index.source_classes.get(fq_name) {
                (path.clone(), fq_name.clone())
            } else {
                let mut prefix = fq_name.parent();
                loop {
                    let candidate = prefix?;
                    if let Some(path) = index.source_classes.get(&candidate) {
                        break (path.clone(), candidate);
                    }
                    prefix = candidate.parent();
                }
            }
        };
        let class = JavaClass::Source(SourceClass::from_path(path, self.clone())?);
        let rest: Vec<&str> = fq_name
            .as_str()
            .get(prefix.as_str().len()..)
            .unwrap_or_default()
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();
        rest.into_iter()
            .try_fold(class, |outer, segment| outer.find_inner_class(segment))
    }

    /// Tries every package/class split of `fq_name`, longest package first.
    fn find_compiled_class(self: &Rc<Self>, fq_name: &FqName) -> Result<Option<CompiledClass>, JavacError> {
        let cached = self.index.borrow().compiled.get(fq_name).cloned();
        if let Some(symbol) = cached {
            return Ok(Some(CompiledClass::new(symbol, self.clone())));
        }

        let segments: Vec<&str> = fq_name.segments().collect();
        for split in (0..segments.len()).rev() {
            let (package, class) = segments.split_at(split);
            let binary_name = class.join("$");
            let internal_name = if package.is_empty() {
                binary_name
            } else {
                format!("{}/{binary_name}", package.join("/"))
            };
            if let Some(symbol) = self.load_internal(&internal_name)? {
                if &symbol.fq_name == fq_name {
                    return Ok(Some(CompiledClass::new(symbol, self.clone())));
                }
            }
        }
        Ok(None)
    }

    /// Loads and caches the classfile of `internal_name`. An unreadable
    /// classfile becomes a flagless placeholder instead of an error.
    pub(crate) fn load_internal(&self, internal_name: &str) -> Result<Option<Rc<CompiledSymbol>>, JavacError> {
        {
            let index = self.index.borrow();
            if let Some(symbol) = index.compiled_by_internal.get(internal_name) {
                return Ok(Some(symbol.clone()));
            }
            if index.missing.contains(internal_name) {
                return Ok(None);
            }
        }

        let found = self.classpath.borrow_mut().find_class_bytes(internal_name)?;
        let Some(found) = found else {
            self.index.borrow_mut().missing.insert(internal_name.to_string());
            return Ok(None);
        };

        let info = match parse_class(&found.bytes) {
            Ok(info) if info.this_class == internal_name => info,
            Ok(info) => {
                warn!(
                    expected = internal_name,
                    found = %info.this_class,
                    origin = %found.origin.display(),
                    "classfile declares a different class; ignoring"
                );
                self.index.borrow_mut().missing.insert(internal_name.to_string());
                return Ok(None);
            }
            Err(error) => {
                warn!(
                    class = internal_name,
                    origin = %found.origin.display(),
                    %error,
                    "unreadable classfile; using empty modifiers"
                );
                ClassInfo::degraded(internal_name)
            }
        };

        let symbol = Rc::new(CompiledSymbol::new(info, found.origin, &found.bytes));
        trace!(fq_name = %symbol.fq_name, "cached compiled class");
        self.index.borrow_mut().insert_compiled(symbol.clone());
        Ok(Some(symbol))
    }

    pub(crate) fn lookup_internal(self: &Rc<Self>, internal_name: &str) -> Option<CompiledClass> {
        match self.load_internal(internal_name) {
            Ok(symbol) => symbol.map(|symbol| CompiledClass::new(symbol, self.clone())),
            Err(error) => {
                warn!(class = internal_name, %error, "class lookup failed");
                None
            }
        }
    }

    /// Lenient [`find_class`](Self::find_class) for adapters and the resolver.
    pub(crate) fn lookup_class(self: &Rc<Self>, fq_name: &FqName) -> Option<JavaClass> {
        match self.find_class(fq_name, SearchScope::Everything) {
            Ok(class) => class,
            Err(JavacError::Closed) => None,
            Err(error) => {
                warn!(fq_name = %fq_name, %error, "class lookup failed");
                None
            }
        }
    }

    pub(crate) fn find_package(
        self: &Rc<Self>,
        fq_name: &FqName,
        scope: SearchScope,
    ) -> Result<Option<JavaPackage>, JavacError> {
        self.ensure_open()?;
        let in_sources = |ctx: &Self| ctx.index.borrow().source_packages.contains(fq_name);
        let in_compiled = |ctx: &Self| {
            if ctx.index.borrow().compiled_package_exists(fq_name) {
                return true;
            }
            let exists = ctx.classpath.borrow().package_exists(&fq_name.to_internal());
            if exists {
                ctx.index.borrow_mut().mark_classpath_package(fq_name);
            }
            exists
        };
        let found = fq_name.is_root()
            || match scope {
                SearchScope::Everything => in_sources(self) || in_compiled(self),
                SearchScope::SourcesOnly => in_sources(self),
                SearchScope::CompiledOnly => in_compiled(self),
            };
        Ok(found.then(|| JavaPackage::new(fq_name.clone(), self.clone())))
    }

    /// Packages strictly below `fq_name`, any depth, sorted by name.
    pub(crate) fn find_sub_packages(self: &Rc<Self>, fq_name: &FqName) -> Result<Vec<JavaPackage>, JavacError> {
        self.ensure_open()?;
        let mut names: IndexSet<FqName> = self
            .classpath
            .borrow()
            .list_packages_under(&fq_name.to_internal())?
            .iter()
            .map(|internal| FqName::from_internal(internal))
            .collect();
        {
            let index = self.index.borrow();
            names.extend(
                index
                    .packages
                    .iter()
                    .filter(|(_, symbol)| symbol.flags.contains(super::PackageFlags::EXISTS))
                    .map(|(name, _)| name)
                    .chain(index.source_packages.iter())
                    .filter(|name| name.is_strict_subpackage_of(fq_name))
                    .cloned(),
            );
        }
        let mut names: Vec<FqName> = names.into_iter().collect();
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| JavaPackage::new(name, self.clone()))
            .collect())
    }

    /// Classes of a package: source classes (with `include_nested`, their
    /// member classes too), then top-level classfiles not declared in source.
    pub(crate) fn package_members(
        self: &Rc<Self>,
        fq_name: &FqName,
        include_nested: bool,
    ) -> Result<Vec<JavaClass>, JavacError> {
        self.ensure_open()?;
        let top_level_paths: Vec<TreePath> = self
            .index
            .borrow()
            .source_classes
            .values()
            .filter(|path| path.depth() == 1 && path.compilation_unit().package_name() == fq_name.as_str())
            .cloned()
            .collect();

        let mut classes = Vec::new();
        let mut seen = FxHashSet::default();
        for path in top_level_paths {
            let Some(class) = SourceClass::from_path(path, self.clone()) else {
                continue;
            };
            let class = JavaClass::Source(class);
            if include_nested {
                for nested in class.with_inner_classes() {
                    seen.insert(nested.fq_name());
                    classes.push(nested);
                }
            } else {
                seen.insert(class.fq_name());
                classes.push(class);
            }
        }

        let internal_package = fq_name.to_internal();
        let mut binary_names: IndexSet<String> = self
            .classpath
            .borrow()
            .list_classes(&internal_package)?
            .into_iter()
            .collect();
        if let Some(symbol) = self.index.borrow().packages.get(fq_name) {
            binary_names.extend(symbol.members.iter().cloned());
        }

        for binary_name in binary_names {
            let internal_name = if internal_package.is_empty() {
                binary_name
            } else {
                format!("{internal_package}/{binary_name}")
            };
            let Some(symbol) = self.load_internal(&internal_name)? else {
                continue;
            };
            let top_level = symbol.info.own_inner_entry().is_none() && symbol.info.enclosing_method.is_none();
            if top_level && seen.insert(symbol.fq_name.clone()) {
                classes.push(JavaClass::Compiled(CompiledClass::new(symbol, self.clone())));
            }
        }
        Ok(classes)
    }

    pub(crate) fn package_classes(self: &Rc<Self>, fq_name: &FqName) -> Vec<JavaClass> {
        self.package_members(fq_name, false).unwrap_or_else(|error| {
            warn!(package = %fq_name, %error, "listing package classes failed");
            Vec::new()
        })
    }

    pub(crate) fn sub_packages(self: &Rc<Self>, fq_name: &FqName) -> Vec<JavaPackage> {
        self.find_sub_packages(fq_name).unwrap_or_else(|error| {
            warn!(package = %fq_name, %error, "listing sub-packages failed");
            Vec::new()
        })
    }

    /// Simple names of source classes plus binary names of classfiles in the
    /// package; `None` when a classpath root could not be listed.
    pub(crate) fn known_class_names_in_package(
        &self,
        fq_name: &FqName,
    ) -> Result<Option<IndexSet<String>>, JavacError> {
        self.ensure_open()?;
        let mut names: IndexSet<String> = self
            .index
            .borrow()
            .source_classes
            .iter()
            .filter(|(_, path)| path.depth() == 1 && path.compilation_unit().package_name() == fq_name.as_str())
            .map(|(name, _)| name.short_name().to_string())
            .collect();
        match self.classpath.borrow().list_classes(&fq_name.to_internal()) {
            Ok(listed) => names.extend(listed),
            Err(error) => {
                warn!(package = %fq_name, %error, "cannot list package; class names unknown");
                return Ok(None);
            }
        }
        if let Some(symbol) = self.index.borrow().packages.get(fq_name) {
            names.extend(symbol.members.iter().cloned());
        }
        Ok(Some(names))
    }

    /// Marks `(path, name)` as being resolved; `None` when that resolution is
    /// already in progress further up the stack.
    pub(crate) fn enter_resolution(self: &Rc<Self>, path: &TreePath, name: &str) -> Option<ResolutionGuard> {
        let key = (path.leaf_address(), name.to_string());
        if !self.resolving.borrow_mut().insert(key.clone()) {
            trace!(name, "cyclic resolution cut short");
            return None;
        }
        Some(ResolutionGuard {
            ctx: self.clone(),
            key,
        })
    }
}

pub(crate) struct ResolutionGuard {
    ctx: Rc<SessionContext>,
    key: (usize, String),
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        self.ctx.resolving.borrow_mut().remove(&self.key);
    }
}

fn collect_java_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), JavacError> {
    let io_error = |source| JavacError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()
        .map_err(io_error)?;
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_java_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "java") {
            files.push(path);
        }
    }
    Ok(())
}
