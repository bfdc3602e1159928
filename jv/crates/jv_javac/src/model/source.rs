use super::{
    render_type_arguments, AnnotationArgument, ClassifierRef, JavaAnnotation, JavaClass,
    JavaClassifier, JavaType, LiteralValue, ModelError, Visibility,
};
use crate::name::{ClassId, FqName};
use crate::resolve::resolve_classifier;
use crate::session::SessionContext;
use jv_java_syntax::{
    AnnotationExpr, ClassDecl, ClassKind, ElementValue, FieldDecl, MethodDecl, ModifierFlags,
    Modifiers, ParameterDecl, PathNode, TreePath, TypeExpr, TypeParameterDecl, WildcardBound,
};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Package name followed by the enclosing class names, outermost first.
pub(crate) fn fq_name_of_path(path: &TreePath) -> FqName {
    let mut names: Vec<&str> = path
        .enclosing_classes()
        .map(|class| class.name.as_str())
        .collect();
    names.reverse();
    names.into_iter().fold(
        FqName::new(path.compilation_unit().package_name()),
        |fq_name, name| fq_name.child(name),
    )
}

fn annotations_at(
    path: &TreePath,
    modifiers: &Modifiers,
    ctx: &Rc<SessionContext>,
) -> Vec<SourceAnnotation> {
    modifiers
        .annotations
        .iter()
        .map(|annotation| {
            SourceAnnotation::new(
                path.child(PathNode::Annotation(annotation.clone())),
                annotation.clone(),
                ctx.clone(),
            )
        })
        .collect()
}

/// Maps a written type to the model. Every child type is re-rooted below its
/// parent so name resolution sees the full lexical context.
pub(crate) fn source_type(ctx: &Rc<SessionContext>, parent: &TreePath, ty: &Arc<TypeExpr>) -> JavaType {
    let path = parent.child(PathNode::Type(ty.clone()));
    match ty.as_ref() {
        TypeExpr::Primitive(kind) => JavaType::Primitive(*kind),
        TypeExpr::Array(component) => JavaType::Array(Box::new(source_type(ctx, &path, component))),
        TypeExpr::Wildcard(WildcardBound::Unbounded) => JavaType::Wildcard {
            bound: None,
            is_extends: true,
        },
        TypeExpr::Wildcard(WildcardBound::Extends(bound)) => JavaType::Wildcard {
            bound: Some(Box::new(source_type(ctx, &path, bound))),
            is_extends: true,
        },
        TypeExpr::Wildcard(WildcardBound::Super(bound)) => JavaType::Wildcard {
            bound: Some(Box::new(source_type(ctx, &path, bound))),
            is_extends: false,
        },
        TypeExpr::ClassRef(_) | TypeExpr::Parameterized { .. } => JavaType::Classifier(
            super::JavaClassifierType::Source(SourceClassifierType {
                path,
                ty: ty.clone(),
                ctx: ctx.clone(),
            }),
        ),
    }
}

#[derive(Clone)]
pub struct SourceClass {
    path: TreePath,
    decl: Arc<ClassDecl>,
    ctx: Rc<SessionContext>,
}

impl SourceClass {
    /// `None` unless the path ends at a class declaration.
    pub(crate) fn from_path(path: TreePath, ctx: Rc<SessionContext>) -> Option<Self> {
        let decl = path.leaf_class()?.clone();
        Some(Self { path, decl, ctx })
    }

    pub fn declaration(&self) -> &Arc<ClassDecl> {
        &self.decl
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn fq_name(&self) -> FqName {
        fq_name_of_path(&self.path)
    }

    pub fn kind(&self) -> ClassKind {
        self.decl.kind
    }

    fn outer_decl(&self) -> Option<&Arc<ClassDecl>> {
        self.path.parent().and_then(TreePath::leaf_class)
    }

    fn is_member_of_interface(&self) -> bool {
        self.outer_decl()
            .is_some_and(|outer| matches!(outer.kind, ClassKind::Interface | ClassKind::Annotation))
    }

    fn has(&self, flag: ModifierFlags) -> bool {
        self.decl.modifiers.has(flag)
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.decl.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    pub fn is_annotation_type(&self) -> bool {
        self.decl.kind == ClassKind::Annotation
    }

    pub fn is_enum(&self) -> bool {
        self.decl.kind == ClassKind::Enum
    }

    pub fn is_record(&self) -> bool {
        self.decl.kind == ClassKind::Record
    }

    pub fn is_abstract(&self) -> bool {
        self.has(ModifierFlags::ABSTRACT) || self.is_interface()
    }

    /// Nested interfaces, enums, records and annotations are implicitly
    /// static, as is every member type of an interface.
    pub fn is_static(&self) -> bool {
        if self.has(ModifierFlags::STATIC) {
            return true;
        }
        self.outer_decl().is_some()
            && (self.decl.kind != ClassKind::Class || self.is_member_of_interface())
    }

    pub fn is_final(&self) -> bool {
        self.has(ModifierFlags::FINAL) || matches!(self.decl.kind, ClassKind::Enum | ClassKind::Record)
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_member_of_interface() && !self.has(ModifierFlags::PRIVATE) {
            return Visibility::Public;
        }
        Visibility::from_flags(
            self.has(ModifierFlags::PUBLIC),
            self.has(ModifierFlags::PRIVATE),
            self.has(ModifierFlags::PROTECTED),
            self.is_static(),
        )
    }

    pub fn outer_class(&self) -> Option<SourceClass> {
        let parent = self.path.parent()?;
        SourceClass::from_path(parent.clone(), self.ctx.clone())
    }

    pub fn inner_classes(&self) -> Vec<SourceClass> {
        self.decl
            .inner_classes()
            .map(|inner| self.child_class(inner))
            .collect()
    }

    pub fn find_inner_class(&self, name: &str) -> Option<SourceClass> {
        self.decl
            .inner_classes()
            .find(|inner| inner.name == name)
            .map(|inner| self.child_class(inner))
    }

    fn child_class(&self, decl: &Arc<ClassDecl>) -> SourceClass {
        SourceClass {
            path: self.path.child(PathNode::Class(decl.clone())),
            decl: decl.clone(),
            ctx: self.ctx.clone(),
        }
    }

    pub fn type_parameters(&self) -> Vec<SourceTypeParameter> {
        type_parameters_at(&self.path, &self.decl.type_parameters, &self.ctx)
    }

    pub fn supertypes(&self) -> Vec<SourceClassifierType> {
        self.decl
            .superclass
            .iter()
            .chain(self.decl.interfaces.iter())
            .filter(|ty| ty.is_class_reference())
            .map(|ty| SourceClassifierType {
                path: self.path.child(PathNode::Type(ty.clone())),
                ty: ty.clone(),
                ctx: self.ctx.clone(),
            })
            .collect()
    }

    pub fn methods(&self) -> Vec<SourceMethod> {
        self.decl
            .methods()
            .filter(|method| !method.is_constructor && method.name != "<init>")
            .map(|method| SourceMethod {
                owner: self.clone(),
                path: self.path.child(PathNode::Method(method.clone())),
                decl: method.clone(),
            })
            .collect()
    }

    pub fn constructors(&self) -> Vec<SourceConstructor> {
        self.decl
            .methods()
            .filter(|method| method.is_constructor)
            .map(|method| SourceConstructor {
                owner: self.clone(),
                path: self.path.child(PathNode::Method(method.clone())),
                decl: method.clone(),
            })
            .collect()
    }

    pub fn fields(&self) -> Vec<SourceField> {
        self.decl
            .fields()
            .map(|field| SourceField {
                owner: self.clone(),
                path: self.path.child(PathNode::Field(field.clone())),
                decl: field.clone(),
            })
            .collect()
    }

    pub fn annotations(&self) -> Vec<SourceAnnotation> {
        annotations_at(&self.path, &self.decl.modifiers, &self.ctx)
    }
}

impl fmt::Debug for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceClass({})", self.fq_name())
    }
}

fn type_parameters_at(
    path: &TreePath,
    parameters: &[Arc<TypeParameterDecl>],
    ctx: &Rc<SessionContext>,
) -> Vec<SourceTypeParameter> {
    parameters
        .iter()
        .map(|parameter| SourceTypeParameter {
            path: path.child(PathNode::TypeParameter(parameter.clone())),
            decl: parameter.clone(),
            ctx: ctx.clone(),
        })
        .collect()
}

fn value_parameters_at(path: &TreePath, method: &MethodDecl, ctx: &Rc<SessionContext>) -> Vec<SourceValueParameter> {
    method
        .parameters
        .iter()
        .map(|parameter| SourceValueParameter {
            path: path.child(PathNode::Parameter(parameter.clone())),
            decl: parameter.clone(),
            ctx: ctx.clone(),
        })
        .collect()
}

#[derive(Clone)]
pub struct SourceMethod {
    owner: SourceClass,
    path: TreePath,
    decl: Arc<MethodDecl>,
}

impl SourceMethod {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn containing_class(&self) -> SourceClass {
        self.owner.clone()
    }

    fn has(&self, flag: ModifierFlags) -> bool {
        self.decl.modifiers.has(flag)
    }

    /// Interface methods without a body are abstract unless static, default or private.
    pub fn is_abstract(&self) -> bool {
        if self.has(ModifierFlags::ABSTRACT) {
            return true;
        }
        self.owner.is_interface()
            && !self.decl.has_body
            && !self.has(ModifierFlags::STATIC)
            && !self.has(ModifierFlags::DEFAULT)
            && !self.has(ModifierFlags::PRIVATE)
    }

    pub fn is_static(&self) -> bool {
        self.has(ModifierFlags::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.has(ModifierFlags::FINAL)
    }

    pub fn visibility(&self) -> Visibility {
        if self.owner.is_interface() && !self.has(ModifierFlags::PRIVATE) {
            return Visibility::Public;
        }
        Visibility::from_flags(
            self.has(ModifierFlags::PUBLIC),
            self.has(ModifierFlags::PRIVATE),
            self.has(ModifierFlags::PROTECTED),
            self.is_static(),
        )
    }

    pub fn type_parameters(&self) -> Vec<SourceTypeParameter> {
        type_parameters_at(&self.path, &self.decl.type_parameters, &self.owner.ctx)
    }

    pub fn value_parameters(&self) -> Vec<SourceValueParameter> {
        value_parameters_at(&self.path, &self.decl, &self.owner.ctx)
    }

    pub fn return_type(&self) -> JavaType {
        match &self.decl.return_type {
            Some(ty) => source_type(&self.owner.ctx, &self.path, ty),
            None => JavaType::Primitive(jv_java_syntax::PrimitiveKind::Void),
        }
    }

    pub fn annotations(&self) -> Vec<SourceAnnotation> {
        annotations_at(&self.path, &self.decl.modifiers, &self.owner.ctx)
    }

    pub fn has_annotation_parameter_default_value(&self) -> bool {
        self.decl.default_value.is_some()
    }

    pub fn annotation_parameter_default_value(
        &self,
    ) -> Result<Option<AnnotationArgument>, ModelError> {
        self.decl
            .default_value
            .as_ref()
            .map(|value| element_value_argument(&self.owner.ctx, &self.path, None, value))
            .transpose()
    }
}

impl fmt::Debug for SourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceMethod({}.{})", self.owner.fq_name(), self.decl.name)
    }
}

#[derive(Clone)]
pub struct SourceConstructor {
    owner: SourceClass,
    path: TreePath,
    decl: Arc<MethodDecl>,
}

impl SourceConstructor {
    pub fn containing_class(&self) -> SourceClass {
        self.owner.clone()
    }

    pub fn visibility(&self) -> Visibility {
        let modifiers = &self.decl.modifiers;
        Visibility::from_flags(
            modifiers.has(ModifierFlags::PUBLIC),
            modifiers.has(ModifierFlags::PRIVATE),
            modifiers.has(ModifierFlags::PROTECTED),
            false,
        )
    }

    pub fn type_parameters(&self) -> Vec<SourceTypeParameter> {
        type_parameters_at(&self.path, &self.decl.type_parameters, &self.owner.ctx)
    }

    pub fn value_parameters(&self) -> Vec<SourceValueParameter> {
        value_parameters_at(&self.path, &self.decl, &self.owner.ctx)
    }

    pub fn annotations(&self) -> Vec<SourceAnnotation> {
        annotations_at(&self.path, &self.decl.modifiers, &self.owner.ctx)
    }
}

impl fmt::Debug for SourceConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceConstructor({}, {} parameters)",
            self.owner.fq_name(),
            self.decl.parameters.len()
        )
    }
}

#[derive(Clone)]
pub struct SourceField {
    owner: SourceClass,
    path: TreePath,
    decl: Arc<FieldDecl>,
}

impl SourceField {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn containing_class(&self) -> SourceClass {
        self.owner.clone()
    }

    fn has(&self, flag: ModifierFlags) -> bool {
        self.decl.modifiers.has(flag)
    }

    fn is_implicit_constant(&self) -> bool {
        self.owner.is_interface() || self.decl.is_enum_constant
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_implicit_constant() {
            return Visibility::Public;
        }
        Visibility::from_flags(
            self.has(ModifierFlags::PUBLIC),
            self.has(ModifierFlags::PRIVATE),
            self.has(ModifierFlags::PROTECTED),
            self.is_static(),
        )
    }

    pub fn is_static(&self) -> bool {
        self.has(ModifierFlags::STATIC) || self.is_implicit_constant()
    }

    pub fn is_final(&self) -> bool {
        self.has(ModifierFlags::FINAL) || self.is_implicit_constant()
    }

    pub fn ty(&self) -> JavaType {
        source_type(&self.owner.ctx, &self.path, &self.decl.ty)
    }

    pub fn is_enum_entry(&self) -> bool {
        self.decl.is_enum_constant
    }

    pub fn initializer_value(&self) -> Option<LiteralValue> {
        if !self.is_final() {
            return None;
        }
        self.decl.constant.as_ref().map(LiteralValue::from)
    }

    pub fn annotations(&self) -> Vec<SourceAnnotation> {
        annotations_at(&self.path, &self.decl.modifiers, &self.owner.ctx)
    }
}

impl fmt::Debug for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceField({}.{})", self.owner.fq_name(), self.decl.name)
    }
}

#[derive(Clone)]
pub struct SourceValueParameter {
    path: TreePath,
    decl: Arc<ParameterDecl>,
    ctx: Rc<SessionContext>,
}

impl SourceValueParameter {
    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn ty(&self) -> JavaType {
        source_type(&self.ctx, &self.path, &self.decl.ty)
    }

    pub fn is_vararg(&self) -> bool {
        self.decl.is_varargs
    }

    pub fn annotations(&self) -> Vec<SourceAnnotation> {
        annotations_at(&self.path, &self.decl.modifiers, &self.ctx)
    }
}

impl fmt::Debug for SourceValueParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceValueParameter({}: {})", self.decl.name, self.decl.ty)
    }
}

#[derive(Clone)]
pub struct SourceTypeParameter {
    path: TreePath,
    decl: Arc<TypeParameterDecl>,
    ctx: Rc<SessionContext>,
}

impl SourceTypeParameter {
    pub(crate) fn new(path: TreePath, decl: Arc<TypeParameterDecl>, ctx: Rc<SessionContext>) -> Self {
        Self { path, decl, ctx }
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn owner(&self) -> String {
        let Some(parent) = self.path.parent() else {
            return String::new();
        };
        match parent.leaf() {
            PathNode::Method(method) => {
                let class = parent.parent().map(fq_name_of_path).unwrap_or_default();
                class.child(&method.name).to_string()
            }
            _ => fq_name_of_path(parent).to_string(),
        }
    }

    pub fn upper_bounds(&self) -> Vec<SourceClassifierType> {
        self.decl
            .bounds
            .iter()
            .filter(|bound| bound.is_class_reference())
            .map(|bound| SourceClassifierType {
                path: self.path.child(PathNode::Type(bound.clone())),
                ty: bound.clone(),
                ctx: self.ctx.clone(),
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct SourceClassifierType {
    path: TreePath,
    ty: Arc<TypeExpr>,
    ctx: Rc<SessionContext>,
}

impl SourceClassifierType {
    fn written_name(&self) -> &str {
        self.ty.reference_name().unwrap_or_default()
    }

    pub fn classifier(&self) -> ClassifierRef {
        match resolve_classifier(&self.ctx, &self.path, self.written_name()) {
            Some(classifier) => ClassifierRef::Resolved(classifier),
            None => ClassifierRef::Unresolved(self.written_name().to_string()),
        }
    }

    pub fn type_arguments(&self) -> Vec<JavaType> {
        self.ty
            .type_arguments()
            .iter()
            .map(|argument| source_type(&self.ctx, &self.path, argument))
            .collect()
    }

    /// Only a bare name can be raw; `List<>`-style diamonds never reach a declaration.
    pub fn is_raw(&self) -> bool {
        if !matches!(self.ty.as_ref(), TypeExpr::ClassRef(_)) {
            return false;
        }
        self.classifier()
            .as_class()
            .is_some_and(|class| !class.type_parameters().is_empty())
    }

    pub fn canonical_text(&self) -> String {
        let base = match self.classifier() {
            ClassifierRef::Resolved(JavaClassifier::Class(class)) => class.fq_name().to_string(),
            ClassifierRef::Resolved(JavaClassifier::TypeParameter(parameter)) => parameter.name(),
            ClassifierRef::Unresolved(name) => name,
        };
        render_type_arguments(base, &self.type_arguments())
    }

    pub fn presentable_text(&self) -> String {
        self.ty.to_string()
    }
}

impl fmt::Debug for SourceClassifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceClassifierType({})", self.ty)
    }
}

#[derive(Clone)]
pub struct SourceAnnotation {
    path: TreePath,
    expr: Arc<AnnotationExpr>,
    ctx: Rc<SessionContext>,
}

impl SourceAnnotation {
    fn new(path: TreePath, expr: Arc<AnnotationExpr>, ctx: Rc<SessionContext>) -> Self {
        Self { path, expr, ctx }
    }

    pub fn resolve(&self) -> Option<JavaClass> {
        resolve_classifier(&self.ctx, &self.path, &self.expr.name)?.into_class()
    }

    pub fn class_id(&self) -> Option<ClassId> {
        self.resolve().map(|class| class.class_id())
    }

    pub fn arguments(&self) -> Result<Vec<AnnotationArgument>, ModelError> {
        self.expr
            .arguments
            .iter()
            .map(|pair| {
                element_value_argument(&self.ctx, &self.path, Some(pair.name.clone()), &pair.value)
            })
            .collect()
    }
}

impl fmt::Debug for SourceAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceAnnotation(@{})", self.expr.name)
    }
}

fn element_value_argument(
    ctx: &Rc<SessionContext>,
    path: &TreePath,
    name: Option<String>,
    value: &ElementValue,
) -> Result<AnnotationArgument, ModelError> {
    let argument = match value {
        ElementValue::Literal(literal) => AnnotationArgument::Literal {
            name,
            value: LiteralValue::from(literal),
        },
        ElementValue::Reference(reference) => {
            let (enum_class_id, entry_name) = match reference.rsplit_once('.') {
                Some((class_name, entry)) => (
                    resolve_classifier(ctx, path, class_name)
                        .and_then(JavaClassifier::into_class)
                        .map(|class| class.class_id()),
                    entry.to_string(),
                ),
                None => (None, reference.clone()),
            };
            AnnotationArgument::EnumReference {
                name,
                enum_class_id,
                entry_name,
            }
        }
        ElementValue::ClassLiteral(ty) => AnnotationArgument::ClassObject {
            name,
            ty: source_type(ctx, path, ty),
        },
        ElementValue::Annotation(annotation) => AnnotationArgument::Annotation {
            name,
            annotation: JavaAnnotation::Source(SourceAnnotation::new(
                path.child(PathNode::Annotation(annotation.clone())),
                annotation.clone(),
                ctx.clone(),
            )),
        },
        ElementValue::Array(values) => {
            let elements = values
                .iter()
                .map(|value| element_value_argument(ctx, path, None, value))
                .collect::<Result<Vec<_>, _>>()?;
            AnnotationArgument::flattened_array(name, elements)
        }
        ElementValue::Expression(text) => {
            return Err(ModelError::NotImplemented {
                feature: format!("constant expression `{text}` as annotation argument"),
            })
        }
    };
    Ok(argument)
}
