//! Classfile metadata for the Java interop layer.
//!
//! `classfile` reads the structural part of a `.class` file (members, inner
//! class table, generic signatures, annotations); `signature` turns descriptor
//! and `Signature` attribute strings into a typed model.

mod classfile;
mod signature;

pub use classfile::{
    parse_class, AccessFlags, AnnotationInfo, AnnotationValue, ClassInfo, ClassParseError,
    ConstantValue, EnclosingMethod, FieldInfo, InnerClassEntry, MethodInfo, MethodParameter,
};
pub use signature::{
    parse_class_signature, parse_field_descriptor, parse_field_signature,
    parse_method_descriptor, parse_method_signature, BaseType, ClassSignature, MethodSignature,
    SignatureType, TypeArgument, TypeParameterSignature,
};

#[cfg(any(test, feature = "testing"))]
pub(crate) use classfile::encode_modified_utf8;
