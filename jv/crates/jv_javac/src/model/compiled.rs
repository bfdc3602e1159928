use super::{
    render_type_arguments, AnnotationArgument, ClassifierRef, JavaAnnotation, JavaClassifier,
    JavaClassifierType, JavaType, JavaTypeParameter, LiteralValue, ModelError, Visibility,
};
use crate::name::{ClassId, FqName};
use crate::session::{CompiledSymbol, SessionContext};
use jv_build::metadata::{
    parse_class_signature, parse_field_descriptor, parse_field_signature, parse_method_descriptor,
    parse_method_signature, AccessFlags, AnnotationInfo, AnnotationValue, BaseType, ClassInfo,
    ClassSignature, ConstantValue, FieldInfo, MethodInfo, MethodSignature, SignatureType,
    TypeArgument, TypeParameterSignature,
};
use jv_java_syntax::PrimitiveKind;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tracing::warn;

const MAX_NESTING: usize = 64;

/// Dotted name through the `InnerClasses` outer chain, e.g. `java/util/Map$Entry`
/// becomes `java.util.Map.Entry`. Local and anonymous classes keep their binary name.
pub(crate) fn compiled_fq_name(info: &ClassInfo) -> FqName {
    outer_chain_name(info, &info.this_class, 0)
}

fn outer_chain_name(info: &ClassInfo, internal_name: &str, depth: usize) -> FqName {
    if depth < MAX_NESTING {
        let entry = info
            .inner_classes
            .iter()
            .find(|entry| entry.inner_class == internal_name);
        if let Some(entry) = entry {
            if let (Some(outer), Some(simple)) = (&entry.outer_class, &entry.inner_name) {
                return outer_chain_name(info, outer, depth + 1).child(simple);
            }
        }
    }
    FqName::from_internal(internal_name)
}

fn class_id_from_internal(internal_name: &str) -> ClassId {
    let (package, relative) = internal_name.rsplit_once('/').unwrap_or(("", internal_name));
    ClassId::new(
        FqName::from_internal(package),
        FqName::new(relative.replace('$', ".")),
    )
}

fn internal_name_of_descriptor(descriptor: &str) -> &str {
    descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(descriptor)
}

fn primitive_of(base: BaseType) -> PrimitiveKind {
    match base {
        BaseType::Byte => PrimitiveKind::Byte,
        BaseType::Char => PrimitiveKind::Char,
        BaseType::Double => PrimitiveKind::Double,
        BaseType::Float => PrimitiveKind::Float,
        BaseType::Int => PrimitiveKind::Int,
        BaseType::Long => PrimitiveKind::Long,
        BaseType::Short => PrimitiveKind::Short,
        BaseType::Boolean => PrimitiveKind::Boolean,
        BaseType::Void => PrimitiveKind::Void,
    }
}

fn literal_from_constant(tag: char, value: &ConstantValue) -> LiteralValue {
    match (tag, value) {
        ('Z', ConstantValue::Int(value)) => LiteralValue::Boolean(*value != 0),
        ('C', ConstantValue::Int(value)) => {
            LiteralValue::Char(char::from_u32(*value as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
        ('B', ConstantValue::Int(value)) => LiteralValue::Byte(*value as i8),
        ('S', ConstantValue::Int(value)) => LiteralValue::Short(*value as i16),
        (_, ConstantValue::Int(value)) => LiteralValue::Int(*value),
        (_, ConstantValue::Long(value)) => LiteralValue::Long(*value),
        (_, ConstantValue::Float(value)) => LiteralValue::Float(*value),
        (_, ConstantValue::Double(value)) => LiteralValue::Double(*value),
        (_, ConstantValue::String(value)) => LiteralValue::String(value.clone()),
    }
}

fn parse_generic<T>(
    owner: &str,
    signature: Option<&str>,
    parse: impl FnOnce(&str) -> Result<T, jv_build::metadata::ClassParseError>,
) -> Option<T> {
    let signature = signature?;
    match parse(signature) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            warn!(class = owner, %error, "ignoring malformed generic signature");
            None
        }
    }
}

/// Type variables visible at one point of a classfile: the method's own, then
/// the class's, then those of enclosing instance classes.
pub(crate) struct TypeScope {
    owner: String,
    parameters: Vec<TypeParameterSignature>,
    parent: Option<Rc<TypeScope>>,
}

impl TypeScope {
    fn empty() -> Rc<Self> {
        Rc::new(Self {
            owner: String::new(),
            parameters: Vec::new(),
            parent: None,
        })
    }

    fn lookup(scope: &Rc<TypeScope>, name: &str) -> Option<(Rc<TypeScope>, usize)> {
        let mut current = Some(scope.clone());
        while let Some(scope) = current {
            if let Some(index) = scope.parameters.iter().position(|parameter| parameter.name == name) {
                return Some((scope, index));
            }
            current = scope.parent.clone();
        }
        None
    }
}

fn compiled_type(ty: &SignatureType, scope: &Rc<TypeScope>, ctx: &Rc<SessionContext>) -> JavaType {
    match ty {
        SignatureType::Base(base) => JavaType::Primitive(primitive_of(*base)),
        SignatureType::Array(component) => JavaType::Array(Box::new(compiled_type(component, scope, ctx))),
        SignatureType::TypeVariable(_) | SignatureType::Class { .. } => {
            JavaType::Classifier(JavaClassifierType::Compiled(CompiledClassifierType {
                ty: ty.clone(),
                scope: scope.clone(),
                ctx: ctx.clone(),
            }))
        }
    }
}

#[derive(Clone)]
pub struct CompiledClass {
    symbol: Rc<CompiledSymbol>,
    ctx: Rc<SessionContext>,
}

impl CompiledClass {
    pub(crate) fn new(symbol: Rc<CompiledSymbol>, ctx: Rc<SessionContext>) -> Self {
        Self { symbol, ctx }
    }

    /// Parsed classfile structure.
    pub fn info(&self) -> &ClassInfo {
        &self.symbol.info
    }

    pub fn internal_name(&self) -> &str {
        &self.symbol.info.this_class
    }

    /// Classfile path, or `archive!/entry` for archive members.
    pub fn origin_path(&self) -> &Path {
        &self.symbol.origin
    }

    pub fn name(&self) -> &str {
        self.symbol.fq_name.short_name()
    }

    pub fn fq_name(&self) -> FqName {
        self.symbol.fq_name.clone()
    }

    fn flags(&self) -> AccessFlags {
        self.symbol.info.declared_flags()
    }

    pub fn is_abstract(&self) -> bool {
        self.flags().is_abstract()
    }

    pub fn is_static(&self) -> bool {
        self.flags().is_static()
    }

    pub fn is_final(&self) -> bool {
        self.flags().is_final()
    }

    pub fn visibility(&self) -> Visibility {
        let flags = self.flags();
        Visibility::from_flags(
            flags.is_public(),
            flags.is_private(),
            flags.is_protected(),
            flags.is_static(),
        )
    }

    pub fn is_interface(&self) -> bool {
        self.symbol.info.access_flags.is_interface()
    }

    pub fn is_annotation_type(&self) -> bool {
        self.symbol.info.access_flags.is_annotation()
    }

    pub fn is_enum(&self) -> bool {
        self.symbol.info.access_flags.is_enum()
    }

    pub fn is_record(&self) -> bool {
        self.symbol.info.super_class.as_deref() == Some("java/lang/Record")
    }

    pub fn outer_class(&self) -> Option<CompiledClass> {
        let outer = self.symbol.info.own_inner_entry()?.outer_class.as_deref()?;
        self.ctx.lookup_internal(outer)
    }

    pub fn inner_classes(&self) -> Vec<CompiledClass> {
        self.symbol
            .info
            .member_classes()
            .filter_map(|entry| self.ctx.lookup_internal(&entry.inner_class))
            .collect()
    }

    pub fn find_inner_class(&self, name: &str) -> Option<CompiledClass> {
        let entry = self
            .symbol
            .info
            .member_classes()
            .find(|entry| entry.inner_name.as_deref() == Some(name))?;
        self.ctx.lookup_internal(&entry.inner_class)
    }

    fn signature(&self) -> Option<ClassSignature> {
        parse_generic(
            self.internal_name(),
            self.symbol.info.signature.as_deref(),
            parse_class_signature,
        )
    }

    pub(crate) fn type_scope(&self) -> Rc<TypeScope> {
        let parent = if self.is_static() || self.symbol.info.own_inner_entry().is_none() {
            None
        } else {
            self.outer_class().map(|outer| outer.type_scope())
        };
        Rc::new(TypeScope {
            owner: self.symbol.fq_name.to_string(),
            parameters: self
                .signature()
                .map(|signature| signature.type_parameters)
                .unwrap_or_default(),
            parent,
        })
    }

    pub fn type_parameters(&self) -> Vec<CompiledTypeParameter> {
        let scope = self.type_scope();
        (0..scope.parameters.len())
            .map(|index| CompiledTypeParameter {
                scope: scope.clone(),
                index,
                ctx: self.ctx.clone(),
            })
            .collect()
    }

    pub fn supertypes(&self) -> Vec<CompiledClassifierType> {
        let info = &self.symbol.info;
        let (superclass, interfaces) = match self.signature() {
            Some(signature) => (Some(signature.superclass), signature.interfaces),
            None => (
                info.super_class.as_deref().map(SignatureType::class),
                info.interfaces.iter().map(|name| SignatureType::class(name.as_str())).collect(),
            ),
        };
        // Interfaces record `java/lang/Object` as their superclass.
        let superclass = superclass.filter(|ty| {
            !(self.is_interface() && ty.internal_name() == Some("java/lang/Object"))
        });

        let scope = self.type_scope();
        superclass
            .into_iter()
            .chain(interfaces)
            .map(|ty| CompiledClassifierType {
                ty,
                scope: scope.clone(),
                ctx: self.ctx.clone(),
            })
            .collect()
    }

    pub fn methods(&self) -> Vec<CompiledMethod> {
        self.symbol
            .info
            .methods
            .iter()
            .enumerate()
            .filter(|(_, method)| {
                !method.name.starts_with('<')
                    && !method.access_flags.is_synthetic()
                    && !method.access_flags.contains(AccessFlags::BRIDGE)
            })
            .map(|(index, _)| CompiledMethod {
                owner: self.clone(),
                index,
            })
            .collect()
    }

    pub fn constructors(&self) -> Vec<CompiledConstructor> {
        self.symbol
            .info
            .methods
            .iter()
            .enumerate()
            .filter(|(_, method)| method.name == "<init>" && !method.access_flags.is_synthetic())
            .map(|(index, _)| CompiledConstructor {
                owner: self.clone(),
                index,
            })
            .collect()
    }

    pub fn fields(&self) -> Vec<CompiledField> {
        self.symbol
            .info
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.access_flags.is_synthetic())
            .map(|(index, _)| CompiledField {
                owner: self.clone(),
                index,
            })
            .collect()
    }

    pub fn annotations(&self) -> Vec<CompiledAnnotation> {
        compiled_annotations(&self.symbol.info.annotations, &self.ctx)
    }

    /// Leading constructor parameters javac adds: enum name and ordinal, or
    /// the enclosing instance of an inner class.
    fn implicit_constructor_parameters(&self) -> usize {
        if self.is_enum() {
            return 2;
        }
        match self.symbol.info.own_inner_entry() {
            Some(entry) if entry.outer_class.is_some() && !entry.access_flags.is_static() => 1,
            _ => 0,
        }
    }
}

impl fmt::Debug for CompiledClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledClass({})", self.symbol.fq_name)
    }
}

fn compiled_annotations(annotations: &[AnnotationInfo], ctx: &Rc<SessionContext>) -> Vec<CompiledAnnotation> {
    annotations
        .iter()
        .map(|annotation| CompiledAnnotation {
            info: annotation.clone(),
            ctx: ctx.clone(),
        })
        .collect()
}

fn method_scope(owner: &CompiledClass, method: &MethodInfo, signature: Option<&MethodSignature>) -> Rc<TypeScope> {
    Rc::new(TypeScope {
        owner: owner.symbol.fq_name.child(&method.name).to_string(),
        parameters: signature
            .map(|signature| signature.type_parameters.clone())
            .unwrap_or_default(),
        parent: Some(owner.type_scope()),
    })
}

fn method_signature(owner: &CompiledClass, method: &MethodInfo) -> Option<MethodSignature> {
    parse_generic(owner.internal_name(), method.signature.as_deref(), parse_method_signature)
}

fn method_descriptor(owner: &CompiledClass, method: &MethodInfo) -> Option<MethodSignature> {
    match parse_method_descriptor(&method.descriptor) {
        Ok(descriptor) => Some(descriptor),
        Err(error) => {
            warn!(class = owner.internal_name(), method = %method.name, %error, "malformed method descriptor");
            None
        }
    }
}

fn compiled_value_parameters(
    owner: &CompiledClass,
    method: &MethodInfo,
    is_constructor: bool,
) -> Vec<CompiledValueParameter> {
    let Some(descriptor) = method_descriptor(owner, method) else {
        return Vec::new();
    };
    let signature = method_signature(owner, method);
    let scope = method_scope(owner, method, signature.as_ref());
    let count = descriptor.parameters.len();

    let kept: Vec<usize> = if method.parameters.len() == count {
        (0..count)
            .filter(|&slot| {
                let flags = method.parameters[slot].access_flags;
                !flags.is_synthetic() && !flags.contains(AccessFlags::MANDATED)
            })
            .collect()
    } else {
        let implicit = if is_constructor {
            owner.implicit_constructor_parameters()
        } else {
            0
        };
        (implicit.min(count)..count).collect()
    };

    // Generic signatures already omit implicit parameters.
    let types: Vec<SignatureType> = match signature {
        Some(signature) if signature.parameters.len() == kept.len() => signature.parameters,
        _ => kept
            .iter()
            .map(|&slot| descriptor.parameters[slot].clone())
            .collect(),
    };

    let is_varargs = method.access_flags.contains(AccessFlags::VARARGS);
    let last = types.len().saturating_sub(1);
    types
        .into_iter()
        .zip(kept)
        .enumerate()
        .map(|(position, (ty, slot))| CompiledValueParameter {
            name: method
                .parameters
                .get(slot)
                .and_then(|parameter| parameter.name.clone())
                .unwrap_or_else(|| format!("p{position}")),
            ty,
            is_vararg: is_varargs && position == last,
            scope: scope.clone(),
            ctx: owner.ctx.clone(),
        })
        .collect()
}

fn method_type_parameters(owner: &CompiledClass, method: &MethodInfo) -> Vec<CompiledTypeParameter> {
    let signature = method_signature(owner, method);
    let scope = method_scope(owner, method, signature.as_ref());
    (0..scope.parameters.len())
        .map(|index| CompiledTypeParameter {
            scope: scope.clone(),
            index,
            ctx: owner.ctx.clone(),
        })
        .collect()
}

fn member_visibility(flags: AccessFlags) -> Visibility {
    Visibility::from_flags(
        flags.is_public(),
        flags.is_private(),
        flags.is_protected(),
        flags.is_static(),
    )
}

#[derive(Clone)]
pub struct CompiledMethod {
    owner: CompiledClass,
    index: usize,
}

impl CompiledMethod {
    fn info(&self) -> &MethodInfo {
        &self.owner.symbol.info.methods[self.index]
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn descriptor(&self) -> &str {
        &self.info().descriptor
    }

    pub fn containing_class(&self) -> CompiledClass {
        self.owner.clone()
    }

    pub fn visibility(&self) -> Visibility {
        member_visibility(self.info().access_flags)
    }

    pub fn is_abstract(&self) -> bool {
        self.info().access_flags.is_abstract()
    }

    pub fn is_static(&self) -> bool {
        self.info().access_flags.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.info().access_flags.is_final()
    }

    pub fn type_parameters(&self) -> Vec<CompiledTypeParameter> {
        method_type_parameters(&self.owner, self.info())
    }

    pub fn value_parameters(&self) -> Vec<CompiledValueParameter> {
        compiled_value_parameters(&self.owner, self.info(), false)
    }

    pub fn return_type(&self) -> JavaType {
        let method = self.info();
        let signature = method_signature(&self.owner, method);
        let scope = method_scope(&self.owner, method, signature.as_ref());
        match signature.or_else(|| method_descriptor(&self.owner, method)) {
            Some(signature) => compiled_type(&signature.return_type, &scope, &self.owner.ctx),
            None => JavaType::Primitive(PrimitiveKind::Void),
        }
    }

    pub fn annotations(&self) -> Vec<CompiledAnnotation> {
        compiled_annotations(&self.info().annotations, &self.owner.ctx)
    }

    pub fn has_annotation_parameter_default_value(&self) -> bool {
        self.info().annotation_default.is_some()
    }

    pub fn annotation_parameter_default_value(
        &self,
    ) -> Result<Option<AnnotationArgument>, ModelError> {
        Ok(self
            .info()
            .annotation_default
            .as_ref()
            .map(|value| annotation_value_argument(None, value, &self.owner.ctx)))
    }
}

impl fmt::Debug for CompiledMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledMethod({}.{}{})",
            self.owner.symbol.fq_name,
            self.info().name,
            self.info().descriptor
        )
    }
}

#[derive(Clone)]
pub struct CompiledConstructor {
    owner: CompiledClass,
    index: usize,
}

impl CompiledConstructor {
    fn info(&self) -> &MethodInfo {
        &self.owner.symbol.info.methods[self.index]
    }

    pub fn containing_class(&self) -> CompiledClass {
        self.owner.clone()
    }

    pub fn visibility(&self) -> Visibility {
        member_visibility(self.info().access_flags)
    }

    pub fn type_parameters(&self) -> Vec<CompiledTypeParameter> {
        method_type_parameters(&self.owner, self.info())
    }

    pub fn value_parameters(&self) -> Vec<CompiledValueParameter> {
        compiled_value_parameters(&self.owner, self.info(), true)
    }

    pub fn annotations(&self) -> Vec<CompiledAnnotation> {
        compiled_annotations(&self.info().annotations, &self.owner.ctx)
    }
}

impl fmt::Debug for CompiledConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledConstructor({}{})",
            self.owner.symbol.fq_name,
            self.info().descriptor
        )
    }
}

#[derive(Clone)]
pub struct CompiledField {
    owner: CompiledClass,
    index: usize,
}

impl CompiledField {
    fn info(&self) -> &FieldInfo {
        &self.owner.symbol.info.fields[self.index]
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn containing_class(&self) -> CompiledClass {
        self.owner.clone()
    }

    pub fn visibility(&self) -> Visibility {
        member_visibility(self.info().access_flags)
    }

    pub fn is_static(&self) -> bool {
        self.info().access_flags.is_static()
    }

    pub fn is_final(&self) -> bool {
        self.info().access_flags.is_final()
    }

    pub fn ty(&self) -> JavaType {
        let field = self.info();
        let owner = self.owner.internal_name();
        let ty = parse_generic(owner, field.signature.as_deref(), parse_field_signature)
            .or_else(|| match parse_field_descriptor(&field.descriptor) {
                Ok(ty) => Some(ty),
                Err(error) => {
                    warn!(class = owner, field = %field.name, %error, "malformed field descriptor");
                    None
                }
            });
        match ty {
            Some(ty) => compiled_type(&ty, &self.owner.type_scope(), &self.owner.ctx),
            None => JavaType::Classifier(JavaClassifierType::Compiled(CompiledClassifierType {
                ty: SignatureType::class(internal_name_of_descriptor(&field.descriptor)),
                scope: TypeScope::empty(),
                ctx: self.owner.ctx.clone(),
            })),
        }
    }

    pub fn is_enum_entry(&self) -> bool {
        self.info().access_flags.is_enum()
    }

    pub fn initializer_value(&self) -> Option<LiteralValue> {
        let field = self.info();
        if !field.access_flags.is_final() {
            return None;
        }
        let tag = field.descriptor.chars().next().unwrap_or('L');
        field
            .constant_value
            .as_ref()
            .map(|value| literal_from_constant(tag, value))
    }

    pub fn annotations(&self) -> Vec<CompiledAnnotation> {
        compiled_annotations(&self.info().annotations, &self.owner.ctx)
    }
}

impl fmt::Debug for CompiledField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledField({}.{})",
            self.owner.symbol.fq_name,
            self.info().name
        )
    }
}

#[derive(Clone)]
pub struct CompiledValueParameter {
    name: String,
    ty: SignatureType,
    is_vararg: bool,
    scope: Rc<TypeScope>,
    ctx: Rc<SessionContext>,
}

impl CompiledValueParameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> JavaType {
        compiled_type(&self.ty, &self.scope, &self.ctx)
    }

    pub fn is_vararg(&self) -> bool {
        self.is_vararg
    }
}

impl fmt::Debug for CompiledValueParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledValueParameter({}: {:?})", self.name, self.ty)
    }
}

#[derive(Clone)]
pub struct CompiledTypeParameter {
    scope: Rc<TypeScope>,
    index: usize,
    ctx: Rc<SessionContext>,
}

impl CompiledTypeParameter {
    fn signature(&self) -> &TypeParameterSignature {
        &self.scope.parameters[self.index]
    }

    pub fn name(&self) -> &str {
        &self.signature().name
    }

    pub fn owner(&self) -> String {
        self.scope.owner.clone()
    }

    pub fn upper_bounds(&self) -> Vec<CompiledClassifierType> {
        self.signature()
            .bounds()
            .filter(|bound| !matches!(bound, SignatureType::Base(_) | SignatureType::Array(_)))
            .map(|bound| CompiledClassifierType {
                ty: bound.clone(),
                scope: self.scope.clone(),
                ctx: self.ctx.clone(),
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct CompiledClassifierType {
    ty: SignatureType,
    scope: Rc<TypeScope>,
    ctx: Rc<SessionContext>,
}

impl CompiledClassifierType {
    pub fn classifier(&self) -> ClassifierRef {
        match &self.ty {
            SignatureType::Class { internal_name, .. } => match self.ctx.lookup_internal(internal_name) {
                Some(class) => ClassifierRef::Resolved(JavaClassifier::Class(super::JavaClass::Compiled(class))),
                None => ClassifierRef::Unresolved(internal_name.replace(['/', '$'], ".")),
            },
            SignatureType::TypeVariable(name) => match TypeScope::lookup(&self.scope, name) {
                Some((scope, index)) => ClassifierRef::Resolved(JavaClassifier::TypeParameter(
                    JavaTypeParameter::Compiled(CompiledTypeParameter {
                        scope,
                        index,
                        ctx: self.ctx.clone(),
                    }),
                )),
                None => ClassifierRef::Unresolved(name.clone()),
            },
            SignatureType::Base(base) => ClassifierRef::Unresolved(base.keyword().to_string()),
            SignatureType::Array(_) => ClassifierRef::Unresolved(String::new()),
        }
    }

    pub fn type_arguments(&self) -> Vec<JavaType> {
        let SignatureType::Class { type_arguments, .. } = &self.ty else {
            return Vec::new();
        };
        type_arguments
            .iter()
            .map(|argument| match argument {
                TypeArgument::Any => JavaType::Wildcard {
                    bound: None,
                    is_extends: true,
                },
                TypeArgument::Extends(bound) => JavaType::Wildcard {
                    bound: Some(Box::new(compiled_type(bound, &self.scope, &self.ctx))),
                    is_extends: true,
                },
                TypeArgument::Super(bound) => JavaType::Wildcard {
                    bound: Some(Box::new(compiled_type(bound, &self.scope, &self.ctx))),
                    is_extends: false,
                },
                TypeArgument::Exact(ty) => compiled_type(ty, &self.scope, &self.ctx),
            })
            .collect()
    }

    pub fn is_raw(&self) -> bool {
        match &self.ty {
            SignatureType::Class { type_arguments, .. } if type_arguments.is_empty() => self
                .classifier()
                .as_class()
                .is_some_and(|class| !class.type_parameters().is_empty()),
            _ => false,
        }
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
        self.canonical_text()
    }
}

impl fmt::Debug for CompiledClassifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledClassifierType({:?})", self.ty)
    }
}

#[derive(Clone)]
pub struct CompiledAnnotation {
    info: AnnotationInfo,
    ctx: Rc<SessionContext>,
}

impl CompiledAnnotation {
    fn internal_name(&self) -> &str {
        internal_name_of_descriptor(&self.info.type_descriptor)
    }

    pub fn is_runtime_visible(&self) -> bool {
        self.info.visible
    }

    pub fn resolve(&self) -> Option<super::JavaClass> {
        self.ctx
            .lookup_internal(self.internal_name())
            .map(super::JavaClass::Compiled)
    }

    /// Falls back to the descriptor when the annotation class is not on the classpath.
    pub fn class_id(&self) -> Option<ClassId> {
        Some(class_id_for_descriptor(&self.info.type_descriptor, &self.ctx))
    }

    pub fn arguments(&self) -> Result<Vec<AnnotationArgument>, ModelError> {
        Ok(self
            .info
            .elements
            .iter()
            .map(|(name, value)| annotation_value_argument(Some(name.clone()), value, &self.ctx))
            .collect())
    }
}

impl fmt::Debug for CompiledAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompiledAnnotation({})", self.info.type_descriptor)
    }
}

fn class_id_for_descriptor(descriptor: &str, ctx: &Rc<SessionContext>) -> ClassId {
    let internal_name = internal_name_of_descriptor(descriptor);
    match ctx.lookup_internal(internal_name) {
        Some(class) => super::JavaClass::Compiled(class).class_id(),
        None => class_id_from_internal(internal_name),
    }
}

fn annotation_value_argument(
    name: Option<String>,
    value: &AnnotationValue,
    ctx: &Rc<SessionContext>,
) -> AnnotationArgument {
    match value {
        AnnotationValue::Constant { tag, value } => AnnotationArgument::Literal {
            name,
            value: literal_from_constant(*tag, value),
        },
        AnnotationValue::Enum {
            type_descriptor,
            const_name,
        } => AnnotationArgument::EnumReference {
            name,
            enum_class_id: Some(class_id_for_descriptor(type_descriptor, ctx)),
            entry_name: const_name.clone(),
        },
        AnnotationValue::Class(descriptor) => {
            let ty = parse_field_descriptor(descriptor)
                .unwrap_or_else(|_| SignatureType::class(internal_name_of_descriptor(descriptor)));
            AnnotationArgument::ClassObject {
                name,
                ty: compiled_type(&ty, &TypeScope::empty(), ctx),
            }
        }
        AnnotationValue::Annotation(annotation) => AnnotationArgument::Annotation {
            name,
            annotation: JavaAnnotation::Compiled(CompiledAnnotation {
                info: annotation.clone(),
                ctx: ctx.clone(),
            }),
        },
        AnnotationValue::Array(values) => AnnotationArgument::flattened_array(
            name,
            values
                .iter()
                .map(|value| annotation_value_argument(None, value, ctx)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jv_build::testing::ClassFileBuilder;
    use jv_build::metadata::parse_class;

    #[test]
    fn fq_name_follows_outer_chain() {
        let bytes = ClassFileBuilder::new("pack/Outer$Mid$Leaf")
            .inner_class("pack/Outer$Mid$Leaf", Some("pack/Outer$Mid"), Some("Leaf"), AccessFlags::STATIC)
            .inner_class("pack/Outer$Mid", Some("pack/Outer"), Some("Mid"), AccessFlags::STATIC)
            .build();
        let info = parse_class(&bytes).expect("class");
        assert_eq!(compiled_fq_name(&info), FqName::from("pack.Outer.Mid.Leaf"));
    }

    #[test]
    fn anonymous_classes_keep_binary_name() {
        let bytes = ClassFileBuilder::new("pack/Outer$1")
            .inner_class("pack/Outer$1", None, None, 0)
            .build();
        let info = parse_class(&bytes).expect("class");
        assert_eq!(compiled_fq_name(&info), FqName::from("pack.Outer$1"));
    }

    #[test]
    fn class_id_fallback_splits_nesting() {
        let id = class_id_from_internal("java/util/Map$Entry");
        assert_eq!(id.package(), &FqName::from("java.util"));
        assert_eq!(id.relative_class_name(), &FqName::from("Map.Entry"));
    }

    #[test]
    fn constant_tags_select_literal_kind() {
        assert_eq!(
            literal_from_constant('Z', &ConstantValue::Int(1)),
            LiteralValue::Boolean(true)
        );
        assert_eq!(
            literal_from_constant('C', &ConstantValue::Int(65)),
            LiteralValue::Char('A')
        );
        assert_eq!(
            literal_from_constant('B', &ConstantValue::Int(-1)),
            LiteralValue::Byte(-1)
        );
        assert_eq!(
            literal_from_constant('s', &ConstantValue::String("x".into())),
            LiteralValue::String("x".into())
        );
    }
}
