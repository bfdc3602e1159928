//! Uniform classifier model over Java sources and classfiles.
//!
//! Every entity comes in two flavours: `Source*` views read a parsed
//! declaration through its [`TreePath`](jv_java_syntax::TreePath), `Compiled*`
//! views read a classfile. The public enums wrap one of each and forward every
//! query, so consumers handle both origins through the same API.

mod compiled;
mod source;

pub use compiled::{
    CompiledAnnotation, CompiledClass, CompiledClassifierType, CompiledConstructor, CompiledField,
    CompiledMethod, CompiledTypeParameter, CompiledValueParameter,
};
pub use source::{
    SourceAnnotation, SourceClass, SourceClassifierType, SourceConstructor, SourceField,
    SourceMethod, SourceTypeParameter, SourceValueParameter,
};

pub(crate) use compiled::compiled_fq_name;
pub(crate) use source::fq_name_of_path;

use crate::name::{ClassId, FqName};
use crate::session::SessionContext;
use jv_java_syntax::PrimitiveKind;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("not implemented: {feature}")]
    NotImplemented { feature: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    /// `protected static`: visible to subclasses without an instance.
    ProtectedStatic,
    ProtectedAndPackage,
    Package,
}

impl Visibility {
    pub(crate) fn from_flags(public: bool, private: bool, protected: bool, is_static: bool) -> Self {
        if public {
            Visibility::Public
        } else if private {
            Visibility::Private
        } else if protected {
            if is_static {
                Visibility::ProtectedStatic
            } else {
                Visibility::ProtectedAndPackage
            }
        } else {
            Visibility::Package
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassOrigin {
    Source,
    Compiled,
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Self::Source($inner) => $body,
            Self::Compiled($inner) => $body,
        }
    };
}

#[derive(Clone)]
pub enum JavaClass {
    Source(SourceClass),
    Compiled(CompiledClass),
}

impl JavaClass {
    pub fn name(&self) -> String {
        dispatch!(self, class => class.name().to_string())
    }

    pub fn fq_name(&self) -> FqName {
        dispatch!(self, class => class.fq_name())
    }

    /// Class id through the outer-class chain.
    pub fn class_id(&self) -> ClassId {
        match self.outer_class() {
            Some(outer) => outer.class_id().create_nested(&self.name()),
            None => ClassId::top_level(&self.fq_name()),
        }
    }

    pub fn origin(&self) -> ClassOrigin {
        match self {
            JavaClass::Source(_) => ClassOrigin::Source,
            JavaClass::Compiled(_) => ClassOrigin::Compiled,
        }
    }

    pub fn is_abstract(&self) -> bool {
        dispatch!(self, class => class.is_abstract())
    }

    pub fn is_static(&self) -> bool {
        dispatch!(self, class => class.is_static())
    }

    pub fn is_final(&self) -> bool {
        dispatch!(self, class => class.is_final())
    }

    pub fn visibility(&self) -> Visibility {
        dispatch!(self, class => class.visibility())
    }

    pub fn is_interface(&self) -> bool {
        dispatch!(self, class => class.is_interface())
    }

    pub fn is_annotation_type(&self) -> bool {
        dispatch!(self, class => class.is_annotation_type())
    }

    pub fn is_enum(&self) -> bool {
        dispatch!(self, class => class.is_enum())
    }

    pub fn is_record(&self) -> bool {
        dispatch!(self, class => class.is_record())
    }

    pub fn outer_class(&self) -> Option<JavaClass> {
        match self {
            JavaClass::Source(class) => class.outer_class().map(JavaClass::Source),
            JavaClass::Compiled(class) => class.outer_class().map(JavaClass::Compiled),
        }
    }

    pub fn inner_classes(&self) -> Vec<JavaClass> {
        match self {
            JavaClass::Source(class) => class.inner_classes().into_iter().map(JavaClass::Source).collect(),
            JavaClass::Compiled(class) => class
                .inner_classes()
                .into_iter()
                .map(JavaClass::Compiled)
                .collect(),
        }
    }

    /// Directly declared member class named `name`.
    pub fn find_inner_class(&self, name: &str) -> Option<JavaClass> {
        match self {
            JavaClass::Source(class) => class.find_inner_class(name).map(JavaClass::Source),
            JavaClass::Compiled(class) => class.find_inner_class(name).map(JavaClass::Compiled),
        }
    }

    /// This class followed by all of its nested classes, depth first.
    pub fn with_inner_classes(&self) -> Vec<JavaClass> {
        let mut classes = vec![self.clone()];
        for inner in self.inner_classes() {
            classes.extend(inner.with_inner_classes());
        }
        classes
    }

    pub fn type_parameters(&self) -> Vec<JavaTypeParameter> {
        match self {
            JavaClass::Source(class) => class
                .type_parameters()
                .into_iter()
                .map(JavaTypeParameter::Source)
                .collect(),
            JavaClass::Compiled(class) => class
                .type_parameters()
                .into_iter()
                .map(JavaTypeParameter::Compiled)
                .collect(),
        }
    }

    /// Declared `extends` and `implements` types, superclass first.
    pub fn supertypes(&self) -> Vec<JavaClassifierType> {
        match self {
            JavaClass::Source(class) => class
                .supertypes()
                .into_iter()
                .map(JavaClassifierType::Source)
                .collect(),
            JavaClass::Compiled(class) => class
                .supertypes()
                .into_iter()
                .map(JavaClassifierType::Compiled)
                .collect(),
        }
    }

    pub fn methods(&self) -> Vec<JavaMethod> {
        match self {
            JavaClass::Source(class) => class.methods().into_iter().map(JavaMethod::Source).collect(),
            JavaClass::Compiled(class) => class.methods().into_iter().map(JavaMethod::Compiled).collect(),
        }
    }

    pub fn fields(&self) -> Vec<JavaField> {
        match self {
            JavaClass::Source(class) => class.fields().into_iter().map(JavaField::Source).collect(),
            JavaClass::Compiled(class) => class.fields().into_iter().map(JavaField::Compiled).collect(),
        }
    }

    pub fn constructors(&self) -> Vec<JavaConstructor> {
        match self {
            JavaClass::Source(class) => class
                .constructors()
                .into_iter()
                .map(JavaConstructor::Source)
                .collect(),
            JavaClass::Compiled(class) => class
                .constructors()
                .into_iter()
                .map(JavaConstructor::Compiled)
                .collect(),
        }
    }

    pub fn annotations(&self) -> Vec<JavaAnnotation> {
        match self {
            JavaClass::Source(class) => class
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Source)
                .collect(),
            JavaClass::Compiled(class) => class
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Compiled)
                .collect(),
        }
    }

    pub fn find_annotation(&self, class_id: &ClassId) -> Option<JavaAnnotation> {
        find_annotation(self.annotations(), class_id)
    }
}

impl PartialEq for JavaClass {
    fn eq(&self, other: &Self) -> bool {
        self.origin() == other.origin() && self.fq_name() == other.fq_name()
    }
}

impl Eq for JavaClass {}

impl Hash for JavaClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fq_name().hash(state);
    }
}

impl fmt::Debug for JavaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, class => fmt::Debug::fmt(class, f))
    }
}

/// Anything a type name can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum JavaClassifier {
    Class(JavaClass),
    TypeParameter(JavaTypeParameter),
}

impl JavaClassifier {
    pub fn name(&self) -> String {
        match self {
            JavaClassifier::Class(class) => class.name(),
            JavaClassifier::TypeParameter(parameter) => parameter.name(),
        }
    }

    pub fn as_class(&self) -> Option<&JavaClass> {
        match self {
            JavaClassifier::Class(class) => Some(class),
            JavaClassifier::TypeParameter(_) => None,
        }
    }

    pub(crate) fn into_class(self) -> Option<JavaClass> {
        match self {
            JavaClassifier::Class(class) => Some(class),
            JavaClassifier::TypeParameter(_) => None,
        }
    }
}

#[derive(Clone)]
pub enum JavaTypeParameter {
    Source(SourceTypeParameter),
    Compiled(CompiledTypeParameter),
}

impl JavaTypeParameter {
    pub fn name(&self) -> String {
        dispatch!(self, parameter => parameter.name().to_string())
    }

    /// Class or method declaring the parameter, e.g. `pack.Box` or `pack.Box.map`.
    pub fn owner(&self) -> String {
        dispatch!(self, parameter => parameter.owner())
    }

    pub fn upper_bounds(&self) -> Vec<JavaClassifierType> {
        match self {
            JavaTypeParameter::Source(parameter) => parameter
                .upper_bounds()
                .into_iter()
                .map(JavaClassifierType::Source)
                .collect(),
            JavaTypeParameter::Compiled(parameter) => parameter
                .upper_bounds()
                .into_iter()
                .map(JavaClassifierType::Compiled)
                .collect(),
        }
    }
}

impl PartialEq for JavaTypeParameter {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.owner() == other.owner()
    }
}

impl fmt::Debug for JavaTypeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeParameter({} of {})", self.name(), self.owner())
    }
}

#[derive(Debug, Clone)]
pub enum JavaMethod {
    Source(SourceMethod),
    Compiled(CompiledMethod),
}

impl JavaMethod {
    pub fn name(&self) -> String {
        dispatch!(self, method => method.name().to_string())
    }

    pub fn containing_class(&self) -> JavaClass {
        match self {
            JavaMethod::Source(method) => JavaClass::Source(method.containing_class()),
            JavaMethod::Compiled(method) => JavaClass::Compiled(method.containing_class()),
        }
    }

    pub fn visibility(&self) -> Visibility {
        dispatch!(self, method => method.visibility())
    }

    pub fn is_abstract(&self) -> bool {
        dispatch!(self, method => method.is_abstract())
    }

    pub fn is_static(&self) -> bool {
        dispatch!(self, method => method.is_static())
    }

    pub fn is_final(&self) -> bool {
        dispatch!(self, method => method.is_final())
    }

    pub fn type_parameters(&self) -> Vec<JavaTypeParameter> {
        match self {
            JavaMethod::Source(method) => method
                .type_parameters()
                .into_iter()
                .map(JavaTypeParameter::Source)
                .collect(),
            JavaMethod::Compiled(method) => method
                .type_parameters()
                .into_iter()
                .map(JavaTypeParameter::Compiled)
                .collect(),
        }
    }

    pub fn value_parameters(&self) -> Vec<JavaValueParameter> {
        match self {
            JavaMethod::Source(method) => method
                .value_parameters()
                .into_iter()
                .map(JavaValueParameter::Source)
                .collect(),
            JavaMethod::Compiled(method) => method
                .value_parameters()
                .into_iter()
                .map(JavaValueParameter::Compiled)
                .collect(),
        }
    }

    pub fn return_type(&self) -> JavaType {
        dispatch!(self, method => method.return_type())
    }

    pub fn annotations(&self) -> Vec<JavaAnnotation> {
        match self {
            JavaMethod::Source(method) => method
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Source)
                .collect(),
            JavaMethod::Compiled(method) => method
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Compiled)
                .collect(),
        }
    }

    pub fn find_annotation(&self, class_id: &ClassId) -> Option<JavaAnnotation> {
        find_annotation(self.annotations(), class_id)
    }

    pub fn has_annotation_parameter_default_value(&self) -> bool {
        dispatch!(self, method => method.has_annotation_parameter_default_value())
    }

    /// `default` value of an annotation type element.
    pub fn annotation_parameter_default_value(
        &self,
    ) -> Result<Option<AnnotationArgument>, ModelError> {
        dispatch!(self, method => method.annotation_parameter_default_value())
    }
}

#[derive(Debug, Clone)]
pub enum JavaConstructor {
    Source(SourceConstructor),
    Compiled(CompiledConstructor),
}

impl JavaConstructor {
    pub fn containing_class(&self) -> JavaClass {
        match self {
            JavaConstructor::Source(constructor) => JavaClass::Source(constructor.containing_class()),
            JavaConstructor::Compiled(constructor) => {
                JavaClass::Compiled(constructor.containing_class())
            }
        }
    }

    pub fn visibility(&self) -> Visibility {
        dispatch!(self, constructor => constructor.visibility())
    }

    pub fn type_parameters(&self) -> Vec<JavaTypeParameter> {
        match self {
            JavaConstructor::Source(constructor) => constructor
                .type_parameters()
                .into_iter()
                .map(JavaTypeParameter::Source)
                .collect(),
            JavaConstructor::Compiled(constructor) => constructor
                .type_parameters()
                .into_iter()
                .map(JavaTypeParameter::Compiled)
                .collect(),
        }
    }

    pub fn value_parameters(&self) -> Vec<JavaValueParameter> {
        match self {
            JavaConstructor::Source(constructor) => constructor
                .value_parameters()
                .into_iter()
                .map(JavaValueParameter::Source)
                .collect(),
            JavaConstructor::Compiled(constructor) => constructor
                .value_parameters()
                .into_iter()
                .map(JavaValueParameter::Compiled)
                .collect(),
        }
    }

    pub fn annotations(&self) -> Vec<JavaAnnotation> {
        match self {
            JavaConstructor::Source(constructor) => constructor
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Source)
                .collect(),
            JavaConstructor::Compiled(constructor) => constructor
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Compiled)
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum JavaField {
    Source(SourceField),
    Compiled(CompiledField),
}

impl JavaField {
    pub fn name(&self) -> String {
        dispatch!(self, field => field.name().to_string())
    }

    pub fn containing_class(&self) -> JavaClass {
        match self {
            JavaField::Source(field) => JavaClass::Source(field.containing_class()),
            JavaField::Compiled(field) => JavaClass::Compiled(field.containing_class()),
        }
    }

    pub fn visibility(&self) -> Visibility {
        dispatch!(self, field => field.visibility())
    }

    pub fn is_static(&self) -> bool {
        dispatch!(self, field => field.is_static())
    }

    pub fn is_final(&self) -> bool {
        dispatch!(self, field => field.is_final())
    }

    pub fn ty(&self) -> JavaType {
        dispatch!(self, field => field.ty())
    }

    pub fn is_enum_entry(&self) -> bool {
        dispatch!(self, field => field.is_enum_entry())
    }

    /// Compile-time constant of a `final` field.
    pub fn initializer_value(&self) -> Option<LiteralValue> {
        dispatch!(self, field => field.initializer_value())
    }

    pub fn has_constant_not_null_initializer(&self) -> bool {
        self.initializer_value()
            .is_some_and(|value| value != LiteralValue::Null)
    }

    pub fn annotations(&self) -> Vec<JavaAnnotation> {
        match self {
            JavaField::Source(field) => field.annotations().into_iter().map(JavaAnnotation::Source).collect(),
            JavaField::Compiled(field) => field
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Compiled)
                .collect(),
        }
    }

    pub fn find_annotation(&self, class_id: &ClassId) -> Option<JavaAnnotation> {
        find_annotation(self.annotations(), class_id)
    }
}

#[derive(Debug, Clone)]
pub enum JavaValueParameter {
    Source(SourceValueParameter),
    Compiled(CompiledValueParameter),
}

impl JavaValueParameter {
    /// Declared name; classfiles without `MethodParameters` give `p0`, `p1`, ...
    pub fn name(&self) -> String {
        dispatch!(self, parameter => parameter.name().to_string())
    }

    pub fn ty(&self) -> JavaType {
        dispatch!(self, parameter => parameter.ty())
    }

    pub fn is_vararg(&self) -> bool {
        dispatch!(self, parameter => parameter.is_vararg())
    }

    pub fn annotations(&self) -> Vec<JavaAnnotation> {
        match self {
            JavaValueParameter::Source(parameter) => parameter
                .annotations()
                .into_iter()
                .map(JavaAnnotation::Source)
                .collect(),
            JavaValueParameter::Compiled(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum JavaAnnotation {
    Source(SourceAnnotation),
    Compiled(CompiledAnnotation),
}

impl JavaAnnotation {
    /// `None` when the annotation type cannot be resolved.
    pub fn class_id(&self) -> Option<ClassId> {
        dispatch!(self, annotation => annotation.class_id())
    }

    pub fn resolve(&self) -> Option<JavaClass> {
        dispatch!(self, annotation => annotation.resolve())
    }

    pub fn arguments(&self) -> Result<Vec<AnnotationArgument>, ModelError> {
        dispatch!(self, annotation => annotation.arguments())
    }

    pub fn argument(&self, name: &str) -> Result<Option<AnnotationArgument>, ModelError> {
        Ok(self
            .arguments()?
            .into_iter()
            .find(|argument| argument.name() == Some(name)))
    }
}

fn find_annotation(annotations: Vec<JavaAnnotation>, class_id: &ClassId) -> Option<JavaAnnotation> {
    annotations
        .into_iter()
        .find(|annotation| annotation.class_id().as_ref() == Some(class_id))
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Null,
}

impl From<&jv_java_syntax::Literal> for LiteralValue {
    fn from(literal: &jv_java_syntax::Literal) -> Self {
        use jv_java_syntax::Literal;
        match literal {
            Literal::String(value) => LiteralValue::String(value.clone()),
            Literal::Char(value) => LiteralValue::Char(*value),
            Literal::Int(value) => LiteralValue::Int(*value),
            Literal::Long(value) => LiteralValue::Long(*value),
            Literal::Float(value) => LiteralValue::Float(*value),
            Literal::Double(value) => LiteralValue::Double(*value),
            Literal::Boolean(value) => LiteralValue::Boolean(*value),
            Literal::Null => LiteralValue::Null,
        }
    }
}

/// One annotation element value; nested arrays are flattened into their parent.
#[derive(Debug, Clone)]
pub enum AnnotationArgument {
    Literal {
        name: Option<String>,
        value: LiteralValue,
    },
    /// Enum constant or other static field reference.
    EnumReference {
        name: Option<String>,
        enum_class_id: Option<ClassId>,
        entry_name: String,
    },
    ClassObject {
        name: Option<String>,
        ty: JavaType,
    },
    Annotation {
        name: Option<String>,
        annotation: JavaAnnotation,
    },
    Array {
        name: Option<String>,
        elements: Vec<AnnotationArgument>,
    },
}

impl AnnotationArgument {
    pub fn name(&self) -> Option<&str> {
        match self {
            AnnotationArgument::Literal { name, .. }
            | AnnotationArgument::EnumReference { name, .. }
            | AnnotationArgument::ClassObject { name, .. }
            | AnnotationArgument::Annotation { name, .. }
            | AnnotationArgument::Array { name, .. } => name.as_deref(),
        }
    }

    /// Array argument whose nested arrays are spliced into one level.
    pub(crate) fn flattened_array(
        name: Option<String>,
        values: impl IntoIterator<Item = AnnotationArgument>,
    ) -> Self {
        let mut elements = Vec::new();
        for value in values {
            match value {
                AnnotationArgument::Array { elements: nested, .. } => elements.extend(nested),
                other => elements.push(other),
            }
        }
        AnnotationArgument::Array { name, elements }
    }
}

#[derive(Debug, Clone)]
pub enum JavaType {
    /// `void` included.
    Primitive(PrimitiveKind),
    Array(Box<JavaType>),
    Wildcard {
        bound: Option<Box<JavaType>>,
        is_extends: bool,
    },
    Classifier(JavaClassifierType),
}

impl JavaType {
    pub fn as_classifier_type(&self) -> Option<&JavaClassifierType> {
        match self {
            JavaType::Classifier(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn canonical_text(&self) -> String {
        match self {
            JavaType::Primitive(kind) => kind.keyword().to_string(),
            JavaType::Array(component) => format!("{}[]", component.canonical_text()),
            JavaType::Wildcard { bound: None, .. } => "?".to_string(),
            JavaType::Wildcard {
                bound: Some(bound),
                is_extends,
            } => {
                let keyword = if *is_extends { "extends" } else { "super" };
                format!("? {keyword} {}", bound.canonical_text())
            }
            JavaType::Classifier(ty) => ty.canonical_text(),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text())
    }
}

/// Classifier carried by a classifier type.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierRef {
    Resolved(JavaClassifier),
    /// Name as written (source) or as recorded (classfile) when lookup failed.
    Unresolved(String),
}

impl ClassifierRef {
    pub fn as_class(&self) -> Option<&JavaClass> {
        match self {
            ClassifierRef::Resolved(classifier) => classifier.as_class(),
            ClassifierRef::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ClassifierRef::Resolved(_))
    }
}

/// A class or type variable used in a type position.
#[derive(Debug, Clone)]
pub enum JavaClassifierType {
    Source(SourceClassifierType),
    Compiled(CompiledClassifierType),
}

impl JavaClassifierType {
    pub fn classifier(&self) -> ClassifierRef {
        dispatch!(self, ty => ty.classifier())
    }

    pub fn type_arguments(&self) -> Vec<JavaType> {
        dispatch!(self, ty => ty.type_arguments())
    }

    /// A generic class used without type arguments.
    pub fn is_raw(&self) -> bool {
        dispatch!(self, ty => ty.is_raw())
    }

    /// Resolved name with arguments, e.g. `java.util.List<java.lang.String>`.
    pub fn canonical_text(&self) -> String {
        dispatch!(self, ty => ty.canonical_text())
    }

    pub fn presentable_text(&self) -> String {
        dispatch!(self, ty => ty.presentable_text())
    }
}

pub(crate) fn render_type_arguments(base: String, arguments: &[JavaType]) -> String {
    if arguments.is_empty() {
        return base;
    }
    let rendered: Vec<String> = arguments.iter().map(JavaType::canonical_text).collect();
    format!("{base}<{}>", rendered.join(", "))
}

/// A package known from sources, the classpath or synchronized output.
#[derive(Clone)]
pub struct JavaPackage {
    fq_name: FqName,
    ctx: Rc<SessionContext>,
}

impl JavaPackage {
    pub(crate) fn new(fq_name: FqName, ctx: Rc<SessionContext>) -> Self {
        Self { fq_name, ctx }
    }

    pub fn fq_name(&self) -> &FqName {
        &self.fq_name
    }

    /// Top-level classes of the package whose simple name passes `filter`.
    pub fn classes(&self, filter: impl Fn(&str) -> bool) -> Vec<JavaClass> {
        self.ctx
            .package_classes(&self.fq_name)
            .into_iter()
            .filter(|class| filter(&class.name()))
            .collect()
    }

    pub fn sub_packages(&self) -> Vec<JavaPackage> {
        self.ctx.sub_packages(&self.fq_name)
    }
}

impl PartialEq for JavaPackage {
    fn eq(&self, other: &Self) -> bool {
        self.fq_name == other.fq_name
    }
}

impl Eq for JavaPackage {}

impl Hash for JavaPackage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fq_name.hash(state);
    }
}

impl fmt::Debug for JavaPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JavaPackage({})", self.fq_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(true, false, false, false, Visibility::Public; "public")]
    #[test_case(false, true, false, false, Visibility::Private; "private")]
    #[test_case(false, false, true, true, Visibility::ProtectedStatic; "protected static")]
    #[test_case(false, false, true, false, Visibility::ProtectedAndPackage; "protected")]
    #[test_case(false, false, false, true, Visibility::Package; "package private")]
    fn visibility_from_flags(
        public: bool,
        private: bool,
        protected: bool,
        is_static: bool,
        expected: Visibility,
    ) {
        assert_eq!(
            Visibility::from_flags(public, private, protected, is_static),
            expected
        );
    }

    #[test]
    fn nested_arrays_are_flattened() {
        let literal = |value: i32| AnnotationArgument::Literal {
            name: None,
            value: LiteralValue::Int(value),
        };
        let nested = AnnotationArgument::Array {
            name: None,
            elements: vec![literal(2), literal(3)],
        };
        let array = AnnotationArgument::flattened_array(
            Some("value".to_string()),
            vec![literal(1), nested],
        );

        match array {
            AnnotationArgument::Array { name, elements } => {
                assert_eq!(name.as_deref(), Some("value"));
                assert_eq!(elements.len(), 3);
                assert!(elements
                    .iter()
                    .all(|element| matches!(element, AnnotationArgument::Literal { .. })));
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn primitive_and_wildcard_text() {
        let array = JavaType::Array(Box::new(JavaType::Primitive(PrimitiveKind::Int)));
        assert_eq!(array.canonical_text(), "int[]");
        let wildcard = JavaType::Wildcard {
            bound: Some(Box::new(array)),
            is_extends: false,
        };
        assert_eq!(wildcard.to_string(), "? super int[]");
    }
}
