use crate::model::{JavaClass, JavaPackage};
use crate::name::{ClassId, FqName};
use crate::session::JavacSession;
use crate::JavacError;
use indexmap::IndexSet;

/// Which symbols a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchScope {
    /// Source classes, then classfiles.
    #[default]
    Everything,
    SourcesOnly,
    CompiledOnly,
}

impl SearchScope {
    pub fn includes_sources(self) -> bool {
        matches!(self, SearchScope::Everything | SearchScope::SourcesOnly)
    }

    pub fn includes_compiled(self) -> bool {
        matches!(self, SearchScope::Everything | SearchScope::CompiledOnly)
    }
}

/// Java symbols as seen from the jv compiler. A miss is `Ok(None)`.
pub trait JavaClassFinder {
    fn find_class(&self, class_id: &ClassId) -> Result<Option<JavaClass>, JavacError>;

    fn find_package(&self, fq_name: &FqName) -> Result<Option<JavaPackage>, JavacError>;

    /// `Ok(None)` when the caller must not assume the listing is complete.
    fn known_class_names_in_package(
        &self,
        package: &FqName,
    ) -> Result<Option<IndexSet<String>>, JavacError>;
}

impl JavaClassFinder for JavacSession {
    fn find_class(&self, class_id: &ClassId) -> Result<Option<JavaClass>, JavacError> {
        self.find_class_by_id(class_id)
    }

    fn find_package(&self, fq_name: &FqName) -> Result<Option<JavaPackage>, JavacError> {
        JavacSession::find_package(self, fq_name)
    }

    fn known_class_names_in_package(
        &self,
        package: &FqName,
    ) -> Result<Option<IndexSet<String>>, JavacError> {
        JavacSession::known_class_names_in_package(self, package)
    }
}
