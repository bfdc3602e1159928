use crate::decl::{ClassDecl, CompilationUnit, FieldDecl, MethodDecl, ParameterDecl, TypeParameterDecl};
use crate::types::{AnnotationExpr, TypeExpr};
use std::fmt;
use std::sync::Arc;

/// A syntax node that can appear on a lexical path.
#[derive(Debug, Clone)]
pub enum PathNode {
    Unit(Arc<CompilationUnit>),
    Class(Arc<ClassDecl>),
    Method(Arc<MethodDecl>),
    Field(Arc<FieldDecl>),
    Parameter(Arc<ParameterDecl>),
    TypeParameter(Arc<TypeParameterDecl>),
    Type(Arc<TypeExpr>),
    Annotation(Arc<AnnotationExpr>),
}

impl PathNode {
    /// Node identity; two structurally equal declarations are still different nodes.
    pub fn same_node(&self, other: &PathNode) -> bool {
        match (self, other) {
            (PathNode::Unit(a), PathNode::Unit(b)) => Arc::ptr_eq(a, b),
            (PathNode::Class(a), PathNode::Class(b)) => Arc::ptr_eq(a, b),
            (PathNode::Method(a), PathNode::Method(b)) => Arc::ptr_eq(a, b),
            (PathNode::Field(a), PathNode::Field(b)) => Arc::ptr_eq(a, b),
            (PathNode::Parameter(a), PathNode::Parameter(b)) => Arc::ptr_eq(a, b),
            (PathNode::TypeParameter(a), PathNode::TypeParameter(b)) => Arc::ptr_eq(a, b),
            (PathNode::Type(a), PathNode::Type(b)) => Arc::ptr_eq(a, b),
            (PathNode::Annotation(a), PathNode::Annotation(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn address(&self) -> usize {
        match self {
            PathNode::Unit(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::Class(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::Method(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::Field(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::Parameter(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::TypeParameter(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::Type(node) => Arc::as_ptr(node) as *const () as usize,
            PathNode::Annotation(node) => Arc::as_ptr(node) as *const () as usize,
        }
    }

    fn describe(&self) -> String {
        match self {
            PathNode::Unit(unit) => format!("unit({})", unit.package_name()),
            PathNode::Class(class) => format!("class({})", class.name),
            PathNode::Method(method) => format!("method({})", method.name),
            PathNode::Field(field) => format!("field({})", field.name),
            PathNode::Parameter(parameter) => format!("parameter({})", parameter.name),
            PathNode::TypeParameter(parameter) => format!("type-parameter({})", parameter.name),
            PathNode::Type(ty) => format!("type({ty})"),
            PathNode::Annotation(annotation) => format!("annotation(@{})", annotation.name),
        }
    }
}

/// Chain of enclosing nodes from a leaf up to its compilation unit.
///
/// Paths are immutable cons lists: [`TreePath::child`] shares the parent chain
/// and never touches it, so many adapters can hold overlapping paths.
#[derive(Clone)]
pub struct TreePath {
    link: Arc<PathLink>,
}

struct PathLink {
    leaf: PathNode,
    parent: Option<TreePath>,
    unit: Arc<CompilationUnit>,
    depth: usize,
}

impl TreePath {
    pub fn root(unit: Arc<CompilationUnit>) -> Self {
        Self {
            link: Arc::new(PathLink {
                leaf: PathNode::Unit(unit.clone()),
                parent: None,
                unit,
                depth: 0,
            }),
        }
    }

    pub fn child(&self, leaf: PathNode) -> Self {
        Self {
            link: Arc::new(PathLink {
                leaf,
                parent: Some(self.clone()),
                unit: self.link.unit.clone(),
                depth: self.link.depth + 1,
            }),
        }
    }

    pub fn leaf(&self) -> &PathNode {
        &self.link.leaf
    }

    pub fn parent(&self) -> Option<&TreePath> {
        self.link.parent.as_ref()
    }

    pub fn compilation_unit(&self) -> &Arc<CompilationUnit> {
        &self.link.unit
    }

    /// Number of nodes above the leaf.
    pub fn depth(&self) -> usize {
        self.link.depth
    }

    /// Paths from the leaf up to the root, the leaf first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Enclosing class declarations, innermost first; includes the leaf when it is a class.
    pub fn enclosing_classes(&self) -> impl Iterator<Item = &Arc<ClassDecl>> {
        self.ancestors().filter_map(|path| match path.leaf() {
            PathNode::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn leaf_class(&self) -> Option<&Arc<ClassDecl>> {
        match self.leaf() {
            PathNode::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn leaf_type(&self) -> Option<&Arc<TypeExpr>> {
        match self.leaf() {
            PathNode::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn leaf_address(&self) -> usize {
        self.link.leaf.address()
    }
}

impl PartialEq for TreePath {
    fn eq(&self, other: &Self) -> bool {
        self.link.depth == other.link.depth && self.link.leaf.same_node(&other.link.leaf)
    }
}

impl Eq for TreePath {}

impl std::hash::Hash for TreePath {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.link.depth.hash(state);
        self.link.leaf.address().hash(state);
    }
}

impl fmt::Debug for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<String> = self.ancestors().map(|path| path.leaf().describe()).collect();
        nodes.reverse();
        write!(f, "TreePath[{}]", nodes.join(" > "))
    }
}

pub struct Ancestors<'a> {
    next: Option<&'a TreePath>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TreePath;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::ClassKind;
    use crate::types::Modifiers;
    use std::path::PathBuf;

    fn class(name: &str) -> Arc<ClassDecl> {
        Arc::new(ClassDecl {
            name: name.to_string(),
            kind: ClassKind::Class,
            modifiers: Modifiers::default(),
            type_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            members: Vec::new(),
        })
    }

    fn unit() -> Arc<CompilationUnit> {
        Arc::new(CompilationUnit {
            path: PathBuf::from("pack/A.java"),
            package: Some("pack".into()),
            imports: Vec::new(),
            types: Vec::new(),
            syntax_errors: 0,
        })
    }

    #[test]
    fn child_shares_parent_without_mutation() {
        let root = TreePath::root(unit());
        let outer = root.child(PathNode::Class(class("Outer")));
        let first = outer.child(PathNode::Class(class("First")));
        let second = outer.child(PathNode::Class(class("Second")));

        assert_eq!(outer.depth(), 1);
        assert_eq!(first.depth(), 2);
        assert_eq!(first.parent(), Some(&outer));
        assert_eq!(second.parent(), Some(&outer));
        assert_ne!(first, second);
        assert_eq!(outer.ancestors().count(), 2);
    }

    #[test]
    fn enclosing_classes_are_innermost_first() {
        let root = TreePath::root(unit());
        let inner = root
            .child(PathNode::Class(class("Outer")))
            .child(PathNode::Class(class("Inner")))
            .child(PathNode::Type(Arc::new(TypeExpr::ClassRef("String".into()))));

        let names: Vec<&str> = inner.enclosing_classes().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Inner", "Outer"]);
        assert_eq!(inner.compilation_unit().package_name(), "pack");
    }

    #[test]
    fn equality_is_node_identity() {
        let root = TreePath::root(unit());
        let decl = class("Same");
        let a = root.child(PathNode::Class(decl.clone()));
        let b = root.child(PathNode::Class(decl));
        let c = root.child(PathNode::Class(class("Same")));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
