//! Turns a name written in Java source into the classifier it denotes.
//!
//! The first segment of a name is looked up in this order, first hit wins:
//! single-type imports, the enclosing class chain (the class itself, its
//! member classes, then member classes inherited from supertypes), the current
//! package, the name as a fully-qualified name, on-demand imports in
//! declaration order, `java.lang`. Remaining segments are folded as member
//! classes. A single name that matches no class falls back to the type
//! parameters declared along the path.

use crate::model::{ClassifierRef, JavaClass, JavaClassifier, JavaTypeParameter, SourceClass, SourceTypeParameter};
use crate::name::FqName;
use crate::session::SessionContext;
use jv_java_syntax::{PathNode, TreePath};
use rustc_hash::FxHashSet;
use std::rc::Rc;
use tracing::trace;

/// Resolves `name` as written at `path`.
pub(crate) fn resolve_classifier(
    ctx: &Rc<SessionContext>,
    path: &TreePath,
    name: &str,
) -> Option<JavaClassifier> {
    let name = normalize(name);
    if name.is_empty() {
        return None;
    }
    let _guard = ctx.enter_resolution(path, name)?;

    if let Some(class) = resolve_class(ctx, path, name) {
        trace!(name, fq_name = %class.fq_name(), "resolved");
        return Some(JavaClassifier::Class(class));
    }
    if name.contains('.') {
        return None;
    }
    let parameter = find_type_parameter(ctx, path, name)?;
    trace!(name, owner = %parameter.owner(), "resolved to type parameter");
    Some(JavaClassifier::TypeParameter(JavaTypeParameter::Source(parameter)))
}

/// Drops type arguments and a leading `label@` qualifier.
fn normalize(name: &str) -> &str {
    let name = name.split('<').next().unwrap_or(name);
    let name = name.rsplit_once('@').map_or(name, |(_, rest)| rest);
    name.trim()
}

fn resolve_class(ctx: &Rc<SessionContext>, path: &TreePath, name: &str) -> Option<JavaClass> {
    let mut segments = name.split('.');
    let first = segments.next()?;
    let rest: Vec<&str> = segments.collect();
    let fold = |class: JavaClass| {
        rest.iter()
            .try_fold(class, |outer, segment| find_member_class(&outer, segment))
    };

    let unit = path.compilation_unit();
    let package = FqName::new(unit.package_name());

    let found = single_type_import(ctx, path, first)
        .or_else(|| enclosing_scope(ctx, path, first))
        .or_else(|| ctx.lookup_class(&package.child(first)));
    if let Some(class) = found {
        return fold(class);
    }

    if !rest.is_empty() {
        if let Some(class) = ctx.lookup_class(&FqName::new(name)) {
            return Some(class);
        }
    }

    let found = unit
        .on_demand_imports()
        .find_map(|import| ctx.lookup_class(&FqName::new(import.path.as_str()).child(first)))
        .or_else(|| ctx.lookup_class(&FqName::new("java.lang").child(first)))?;
    fold(found)
}

fn single_type_import(ctx: &Rc<SessionContext>, path: &TreePath, name: &str) -> Option<JavaClass> {
    path.compilation_unit()
        .single_type_imports()
        .filter(|import| import.last_segment() == name)
        .find_map(|import| ctx.lookup_class(&FqName::new(import.path.as_str())))
}

/// Walks enclosing classes outwards. A class is not in scope for its own
/// `extends`/`implements` clause, so it is skipped when the walk comes from one.
fn enclosing_scope(ctx: &Rc<SessionContext>, path: &TreePath, name: &str) -> Option<JavaClass> {
    let mut previous: Option<&TreePath> = None;
    for ancestor in path.ancestors() {
        let from_supertype_clause = match (ancestor.leaf_class(), previous.and_then(TreePath::leaf_type)) {
            (Some(decl), Some(ty)) => decl.declares_supertype(ty),
            _ => false,
        };
        previous = Some(ancestor);
        if from_supertype_clause {
            continue;
        }
        let Some(class) = SourceClass::from_path(ancestor.clone(), ctx.clone()) else {
            continue;
        };
        if class.name() == name {
            return Some(JavaClass::Source(class));
        }
        if let Some(member) = find_member_class(&JavaClass::Source(class), name) {
            return Some(member);
        }
    }
    None
}

/// Member class `name` of `class`, declared or inherited.
pub(crate) fn find_member_class(class: &JavaClass, name: &str) -> Option<JavaClass> {
    let mut visited = FxHashSet::default();
    find_member_class_in(class, name, &mut visited)
}

fn find_member_class_in(
    class: &JavaClass,
    name: &str,
    visited: &mut FxHashSet<FqName>,
) -> Option<JavaClass> {
    if !visited.insert(class.fq_name()) {
        return None;
    }
    if let Some(inner) = class.find_inner_class(name) {
        return Some(inner);
    }
    class.supertypes().into_iter().find_map(|supertype| match supertype.classifier() {
        ClassifierRef::Resolved(JavaClassifier::Class(superclass)) => {
            find_member_class_in(&superclass, name, visited)
        }
        ClassifierRef::Resolved(JavaClassifier::TypeParameter(_)) | ClassifierRef::Unresolved(_) => None,
    })
}

fn find_type_parameter(
    ctx: &Rc<SessionContext>,
    path: &TreePath,
    name: &str,
) -> Option<SourceTypeParameter> {
    path.ancestors().find_map(|ancestor| {
        let parameters = match ancestor.leaf() {
            PathNode::Class(class) => &class.type_parameters,
            PathNode::Method(method) => &method.type_parameters,
            _ => return None,
        };
        parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| {
                SourceTypeParameter::new(
                    ancestor.child(PathNode::TypeParameter(parameter.clone())),
                    parameter.clone(),
                    ctx.clone(),
                )
            })
    })
}
