use crate::model::{compiled_fq_name, fq_name_of_path};
use crate::name::FqName;
use indexmap::{IndexMap, IndexSet};
use jv_build::metadata::ClassInfo;
use jv_java_syntax::{ClassDecl, CompilationUnit, PathNode, TreePath};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{trace, warn};

/// A classfile read from the classpath or the output directory.
#[derive(Debug)]
pub(crate) struct CompiledSymbol {
    pub(crate) info: ClassInfo,
    pub(crate) fq_name: FqName,
    pub(crate) origin: PathBuf,
    pub(crate) fingerprint: u64,
}

impl CompiledSymbol {
    pub(crate) fn new(info: ClassInfo, origin: PathBuf, bytes: &[u8]) -> Self {
        Self {
            fq_name: compiled_fq_name(&info),
            info,
            origin,
            fingerprint: fingerprint(bytes),
        }
    }
}

pub(crate) fn fingerprint(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// State bits of a compiled package symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackageFlags(pub u8);

impl PackageFlags {
    /// At least one class of the package has been entered.
    pub const EXISTS: u8 = 0x01;
    /// The package was seen on a classpath root.
    pub const FROM_CLASSPATH: u8 = 0x02;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn insert(&mut self, flag: u8) {
        self.0 |= flag;
    }
}

#[derive(Debug, Default)]
pub(crate) struct PackageSymbol {
    pub(crate) flags: PackageFlags,
    /// Binary simple names, e.g. `Map` and `Map$Entry`.
    pub(crate) members: IndexSet<String>,
}

impl PackageSymbol {
    pub(crate) fn enter(&mut self, binary_name: &str) {
        self.flags.insert(PackageFlags::EXISTS);
        self.members.insert(binary_name.to_string());
    }
}

#[derive(Default)]
pub(crate) struct SymbolIndex {
    pub(crate) units: Vec<Arc<CompilationUnit>>,
    pub(crate) source_classes: IndexMap<FqName, TreePath>,
    pub(crate) source_packages: IndexSet<FqName>,
    pub(crate) compiled: FxHashMap<FqName, Rc<CompiledSymbol>>,
    pub(crate) compiled_by_internal: FxHashMap<String, Rc<CompiledSymbol>>,
    /// Internal names the classpath did not have; cleared whenever output is re-entered.
    pub(crate) missing: FxHashSet<String>,
    pub(crate) packages: IndexMap<FqName, PackageSymbol>,
}

impl SymbolIndex {
    /// Indexes every class of `unit`, nested ones included.
    pub(crate) fn add_unit(&mut self, unit: Arc<CompilationUnit>) {
        self.source_packages.insert(FqName::new(unit.package_name()));
        let root = TreePath::root(unit.clone());
        for class in &unit.types {
            self.add_source_class(&root, class);
        }
        self.units.push(unit);
    }

    fn add_source_class(&mut self, parent: &TreePath, class: &Arc<ClassDecl>) {
        let path = parent.child(PathNode::Class(class.clone()));
        let fq_name = fq_name_of_path(&path);
        if self.source_classes.contains_key(&fq_name) {
            warn!(
                fq_name = %fq_name,
                file = %path.compilation_unit().path.display(),
                "duplicate source class; keeping the first declaration"
            );
            return;
        }
        trace!(fq_name = %fq_name, "indexed source class");
        self.source_classes.insert(fq_name, path.clone());
        for inner in class.inner_classes() {
            self.add_source_class(&path, inner);
        }
    }

    pub(crate) fn insert_compiled(&mut self, symbol: Rc<CompiledSymbol>) {
        self.missing.remove(&symbol.info.this_class);
        self.packages
            .entry(FqName::from_internal(symbol.info.package()))
            .or_default()
            .enter(symbol.info.binary_simple_name());
        self.compiled_by_internal
            .insert(symbol.info.this_class.clone(), symbol.clone());
        self.compiled.insert(symbol.fq_name.clone(), symbol);
    }

    pub(crate) fn remove_compiled(&mut self, internal_name: &str) -> Option<Rc<CompiledSymbol>> {
        let symbol = self.compiled_by_internal.remove(internal_name)?;
        self.compiled.remove(&symbol.fq_name);
        Some(symbol)
    }

    pub(crate) fn mark_classpath_package(&mut self, package: &FqName) {
        self.packages
            .entry(package.clone())
            .or_default()
            .flags
            .insert(PackageFlags::FROM_CLASSPATH);
    }

    /// Whether any class has been entered into the compiled package symbol.
    pub(crate) fn compiled_package_exists(&self, package: &FqName) -> bool {
        self.packages
            .get(package)
            .is_some_and(|symbol| symbol.flags.contains(PackageFlags::EXISTS))
    }
}
