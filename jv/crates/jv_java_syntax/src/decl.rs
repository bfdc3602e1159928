use crate::types::{ElementValue, Literal, Modifiers, TypeExpr};
use std::path::PathBuf;
use std::sync::Arc;

/// One parsed `.java` file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub path: PathBuf,
    /// `None` for the default package.
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<Arc<ClassDecl>>,
    /// Number of error or missing nodes reported by the parser.
    pub syntax_errors: usize,
}

impl CompilationUnit {
    /// Package name, empty for the default package.
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }

    pub fn single_type_imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.imports.iter().filter(|import| !import.is_wildcard)
    }

    pub fn on_demand_imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.imports.iter().filter(|import| import.is_wildcard)
    }
}

/// `import [static] a.b.C[.*];` with `path` holding `a.b.C`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl ImportDecl {
    pub fn last_segment(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<Arc<TypeParameterDecl>>,
    /// `extends` of a class declaration.
    pub superclass: Option<Arc<TypeExpr>>,
    /// `implements` of a class, enum or record, `extends` of an interface.
    pub interfaces: Vec<Arc<TypeExpr>>,
    pub members: Vec<Member>,
}

impl ClassDecl {
    pub fn inner_classes(&self) -> impl Iterator<Item = &Arc<ClassDecl>> {
        self.members.iter().filter_map(|member| match member {
            Member::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodDecl>> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDecl>> {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    /// Whether `ty` is one of this declaration's supertype clauses.
    pub fn declares_supertype(&self, ty: &Arc<TypeExpr>) -> bool {
        self.superclass
            .iter()
            .chain(self.interfaces.iter())
            .any(|candidate| Arc::ptr_eq(candidate, ty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Class(Arc<ClassDecl>),
    Method(Arc<MethodDecl>),
    Field(Arc<FieldDecl>),
    Initializer { is_static: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub is_constructor: bool,
    pub modifiers: Modifiers,
    pub type_parameters: Vec<Arc<TypeParameterDecl>>,
    /// `None` for constructors.
    pub return_type: Option<Arc<TypeExpr>>,
    pub parameters: Vec<Arc<ParameterDecl>>,
    pub has_body: bool,
    /// `default` value of an annotation type element.
    pub default_value: Option<ElementValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub ty: Arc<TypeExpr>,
    pub is_enum_constant: bool,
    /// Literal initializer, if the declarator has one.
    pub constant: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub modifiers: Modifiers,
    /// Varargs parameters carry their array type here.
    pub ty: Arc<TypeExpr>,
    pub is_varargs: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameterDecl {
    pub name: String,
    pub bounds: Vec<Arc<TypeExpr>>,
}
