//! Classes emitted by the jv compiler carry a metadata annotation
//! (`@jv.Metadata` by default) with these elements:
//!
//! | element | type       | meaning                                   |
//! |---------|------------|-------------------------------------------|
//! | `mv`    | `int[]`    | metadata version                          |
//! | `k`     | `int`      | [`MetadataKind`] code, `1` when absent    |
//! | `d1`    | `String[]` | packed bytes, one char per byte           |
//! | `d2`    | `String[]` | string table                              |
//!
//! The bytes of `d1` are unsigned LEB128 varints, each an index into `d2`
//! naming one declared member.

use crate::model::{AnnotationArgument, JavaClass, LiteralValue};
use crate::name::{ClassId, FqName};
use jv_build::MetadataConfig;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("cannot decode jv metadata of {class}: {reason}")]
    Decode { class: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Class,
    FileFacade,
    SyntheticClass,
    MultiFileClassFacade,
    MultiFileClassPart,
}

impl MetadataKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(MetadataKind::Class),
            2 => Some(MetadataKind::FileFacade),
            3 => Some(MetadataKind::SyntheticClass),
            4 => Some(MetadataKind::MultiFileClassFacade),
            5 => Some(MetadataKind::MultiFileClassPart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub version: Vec<u32>,
    pub kind: MetadataKind,
    /// The `d2` string table.
    pub strings: Vec<String>,
    /// Members named by `d1`, in declaration order.
    pub member_names: Vec<String>,
}

/// Reads the metadata header of `class`.
///
/// `Ok(None)` when the class has no header, declares an unknown kind, or was
/// written by an incompatible metadata version. Malformed data under a
/// compatible version is an error.
pub fn read_class_metadata(
    class: &JavaClass,
    config: &MetadataConfig,
) -> Result<Option<ClassMetadata>, MetadataError> {
    let class_name = class.fq_name().to_string();
    let decode_error = |reason: String| MetadataError::Decode {
        class: class_name.clone(),
        reason,
    };

    let Some(annotation) = class.find_annotation(&annotation_class_id(&config.annotation)) else {
        return Ok(None);
    };
    let arguments = annotation
        .arguments()
        .map_err(|error| decode_error(error.to_string()))?;
    let argument = |name: &str| arguments.iter().find(|argument| argument.name() == Some(name));

    let version = match argument("mv").map(int_array) {
        Some(Some(version)) => version,
        _ => {
            warn!(class = %class_name, "jv metadata without a readable version; ignoring");
            return Ok(None);
        }
    };
    if !config.is_compatible(&version) {
        warn!(
            class = %class_name,
            version = ?version,
            supported = ?config.version,
            "incompatible jv metadata version; ignoring"
        );
        return Ok(None);
    }

    let code = match argument("k") {
        None => 1,
        Some(AnnotationArgument::Literal {
            value: LiteralValue::Int(code),
            ..
        }) => *code,
        Some(other) => return Err(decode_error(format!("`k` is not an int: {other:?}"))),
    };
    let Some(kind) = MetadataKind::from_code(code) else {
        debug!(class = %class_name, code, "unknown jv metadata kind");
        return Ok(None);
    };

    let packed = string_array(argument("d1")).map_err(|reason| decode_error(format!("d1: {reason}")))?;
    let strings = string_array(argument("d2")).map_err(|reason| decode_error(format!("d2: {reason}")))?;
    let bytes = unpack_bytes(&packed).map_err(&decode_error)?;
    let member_names = read_varints(&bytes)
        .map_err(&decode_error)?
        .into_iter()
        .map(|index| {
            strings
                .get(index as usize)
                .cloned()
                .ok_or_else(|| decode_error(format!("string index {index} out of range")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(ClassMetadata {
        version,
        kind,
        strings,
        member_names,
    }))
}

fn annotation_class_id(descriptor: &str) -> ClassId {
    let internal_name = descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(descriptor);
    let (package, name) = internal_name.rsplit_once('/').unwrap_or(("", internal_name));
    ClassId::new(
        FqName::from_internal(package),
        FqName::new(name.replace('$', ".")),
    )
}

fn int_array(argument: &AnnotationArgument) -> Option<Vec<u32>> {
    let AnnotationArgument::Array { elements, .. } = argument else {
        return None;
    };
    elements
        .iter()
        .map(|element| match element {
            AnnotationArgument::Literal {
                value: LiteralValue::Int(value),
                ..
            } => u32::try_from(*value).ok(),
            _ => None,
        })
        .collect()
}

fn string_array(argument: Option<&AnnotationArgument>) -> Result<Vec<String>, String> {
    let Some(argument) = argument else {
        return Ok(Vec::new());
    };
    let AnnotationArgument::Array { elements, .. } = argument else {
        return Err("not an array".to_string());
    };
    elements
        .iter()
        .map(|element| match element {
            AnnotationArgument::Literal {
                value: LiteralValue::String(value),
                ..
            } => Ok(value.clone()),
            other => Err(format!("unexpected element {other:?}")),
        })
        .collect()
}

fn unpack_bytes(packed: &[String]) -> Result<Vec<u8>, String> {
    packed
        .iter()
        .flat_map(|chunk| chunk.chars())
        .map(|ch| u8::try_from(u32::from(ch)).map_err(|_| format!("char U+{:04X} is not a byte", u32::from(ch))))
        .collect()
}

fn read_varints(bytes: &[u8]) -> Result<Vec<u32>, String> {
    let mut values = Vec::new();
    let mut current: u32 = 0;
    let mut shift = 0;
    let mut pending = false;
    for &byte in bytes {
        if shift > 28 {
            return Err("varint longer than 5 bytes".to_string());
        }
        current |= u32::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            values.push(current);
            current = 0;
            shift = 0;
            pending = false;
        } else {
            shift += 7;
            pending = true;
        }
    }
    if pending {
        return Err("truncated varint".to_string());
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[0x00], &[0]; "zero")]
    #[test_case(&[0x05, 0x7f], &[5, 127]; "single bytes")]
    #[test_case(&[0xac, 0x02], &[300]; "two byte value")]
    fn reads_varints(bytes: &[u8], expected: &[u32]) {
        assert_eq!(read_varints(bytes).expect("varints"), expected);
    }

    #[test]
    fn truncated_varint_is_rejected() {
        assert!(read_varints(&[0x80]).is_err());
        assert!(read_varints(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]).is_err());
    }

    #[test]
    fn chars_above_a_byte_are_rejected() {
        assert_eq!(unpack_bytes(&["\u{1}\u{ff}".to_string()]), Ok(vec![1, 255]));
        assert!(unpack_bytes(&["\u{100}".to_string()]).is_err());
    }

    #[test]
    fn default_annotation_descriptor() {
        let id = annotation_class_id("Ljv/Metadata;");
        assert_eq!(id.as_fq_name(), FqName::from("jv.Metadata"));
    }

    #[test_case(1, Some(MetadataKind::Class); "class")]
    #[test_case(5, Some(MetadataKind::MultiFileClassPart); "multifile part")]
    #[test_case(9, None; "unknown")]
    fn kinds(code: i32, expected: Option<MetadataKind>) {
        assert_eq!(MetadataKind::from_code(code), expected);
    }
}
