use thiserror::Error;

/// Access and property flags shared by classes, members and inner-class entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessFlags(pub u16);

impl AccessFlags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const VOLATILE: u16 = 0x0040;
    pub const BRIDGE: u16 = 0x0040;
    pub const TRANSIENT: u16 = 0x0080;
    pub const VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const STRICT: u16 = 0x0800;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
    pub const MANDATED: u16 = 0x8000;

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    pub fn is_annotation(self) -> bool {
        self.contains(Self::ANNOTATION)
    }

    pub fn is_enum(self) -> bool {
        self.contains(Self::ENUM)
    }

    pub fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }
}

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("invalid modified UTF-8 string in constant pool")]
    InvalidModifiedUtf8,
    #[error("invalid annotation element tag '{tag}'")]
    InvalidElementTag { tag: char },
    #[error("malformed signature `{signature}`: {reason}")]
    InvalidSignature { signature: String, reason: String },
}

/// Structure of one `.class` file, names kept in internal (`a/b/C$D`) form.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: AccessFlags,
    pub this_class: String,
    /// `None` only for `java/lang/Object` and `module-info`.
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub signature: Option<String>,
    pub inner_classes: Vec<InnerClassEntry>,
    pub enclosing_method: Option<EnclosingMethod>,
    pub annotations: Vec<AnnotationInfo>,
}

impl ClassInfo {
    /// Placeholder kept for a classfile that could not be read.
    pub fn degraded(internal_name: impl Into<String>) -> Self {
        Self {
            minor_version: 0,
            major_version: 0,
            access_flags: AccessFlags::empty(),
            this_class: internal_name.into(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            signature: None,
            inner_classes: Vec::new(),
            enclosing_method: None,
            annotations: Vec::new(),
        }
    }

    /// Internal package name, empty for the default package.
    pub fn package(&self) -> &str {
        self.this_class
            .rsplit_once('/')
            .map(|(package, _)| package)
            .unwrap_or("")
    }

    /// Binary name relative to the package, e.g. `Map$Entry`.
    pub fn binary_simple_name(&self) -> &str {
        self.this_class
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.this_class)
    }

    /// The `InnerClasses` entry describing this class itself, if it is nested.
    pub fn own_inner_entry(&self) -> Option<&InnerClassEntry> {
        self.inner_classes
            .iter()
            .find(|entry| entry.inner_class == self.this_class)
    }

    /// Declared member classes: entries whose outer class is this class.
    pub fn member_classes(&self) -> impl Iterator<Item = &InnerClassEntry> {
        self.inner_classes.iter().filter(move |entry| {
            entry.outer_class.as_deref() == Some(self.this_class.as_str())
                && entry.inner_name.is_some()
        })
    }

    /// Flags as seen by source code: nested classes take them from `InnerClasses`.
    pub fn declared_flags(&self) -> AccessFlags {
        self.own_inner_entry()
            .map(|entry| entry.access_flags)
            .unwrap_or(self.access_flags)
    }

    pub fn find_annotation(&self, type_descriptor: &str) -> Option<&AnnotationInfo> {
        self.annotations
            .iter()
            .find(|annotation| annotation.type_descriptor == type_descriptor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub constant_value: Option<ConstantValue>,
    pub annotations: Vec<AnnotationInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: AccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    /// From the `MethodParameters` attribute; empty when absent.
    pub parameters: Vec<MethodParameter>,
    pub annotation_default: Option<AnnotationValue>,
    pub annotations: Vec<AnnotationInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: Option<String>,
    pub access_flags: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner_class: String,
    pub outer_class: Option<String>,
    /// `None` for anonymous classes.
    pub inner_name: Option<String>,
    pub access_flags: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingMethod {
    pub class: String,
    pub method: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationInfo {
    /// Field descriptor of the annotation type, e.g. `Lpack/MyAnnotation;`.
    pub type_descriptor: String,
    pub visible: bool,
    pub elements: Vec<(String, AnnotationValue)>,
}

impl AnnotationInfo {
    pub fn element(&self, name: &str) -> Option<&AnnotationValue> {
        self.elements
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// Tags `B C D F I J S Z s`; `tag` tells the source-level type apart.
    Constant { tag: char, value: ConstantValue },
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of a class literal, e.g. `Ljava/lang/String;` or `V`.
    Class(String),
    Annotation(AnnotationInfo),
    Array(Vec<AnnotationValue>),
}

pub fn parse_class(bytes: &[u8]) -> Result<ClassInfo, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let access_flags = AccessFlags(reader.read_u2()?);
    let this_class = pool.class_name(reader.read_u2()?)?;
    let super_index = reader.read_u2()?;
    let super_class = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?)
    };

    let interfaces_count = reader.read_u2()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        interfaces.push(pool.class_name(reader.read_u2()?)?);
    }

    let fields_count = reader.read_u2()?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        fields.push(read_field(&mut reader, &pool)?);
    }

    let methods_count = reader.read_u2()?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        methods.push(read_method(&mut reader, &pool)?);
    }

    let mut class = ClassInfo {
        minor_version,
        major_version,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        signature: None,
        inner_classes: Vec::new(),
        enclosing_method: None,
        annotations: Vec::new(),
    };

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name = pool.utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let mut attribute = ClassReader::new(reader.read_slice(length)?);
        match name {
            "Signature" => class.signature = Some(pool.utf8(attribute.read_u2()?)?.to_string()),
            "InnerClasses" => {
                let count = attribute.read_u2()?;
                for _ in 0..count {
                    let inner_index = attribute.read_u2()?;
                    let outer_index = attribute.read_u2()?;
                    let name_index = attribute.read_u2()?;
                    let flags = attribute.read_u2()?;
                    class.inner_classes.push(InnerClassEntry {
                        inner_class: pool.class_name(inner_index)?,
                        outer_class: pool.optional_class_name(outer_index)?,
                        inner_name: pool.optional_utf8(name_index)?,
                        access_flags: AccessFlags(flags),
                    });
                }
            }
            "EnclosingMethod" => {
                let class_index = attribute.read_u2()?;
                let method_index = attribute.read_u2()?;
                class.enclosing_method = Some(EnclosingMethod {
                    class: pool.class_name(class_index)?,
                    method: if method_index == 0 {
                        None
                    } else {
                        Some(pool.name_and_type(method_index)?)
                    },
                });
            }
            "RuntimeVisibleAnnotations" => {
                class.annotations.extend(read_annotations(&mut attribute, &pool, true)?)
            }
            "RuntimeInvisibleAnnotations" => {
                class.annotations.extend(read_annotations(&mut attribute, &pool, false)?)
            }
            _ => {}
        }
    }

    Ok(class)
}

fn read_field(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<FieldInfo, ClassParseError> {
    let access_flags = AccessFlags(reader.read_u2()?);
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let mut field = FieldInfo {
        access_flags,
        name,
        descriptor,
        signature: None,
        constant_value: None,
        annotations: Vec::new(),
    };

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name = pool.utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let mut attribute = ClassReader::new(reader.read_slice(length)?);
        match name {
            "Signature" => field.signature = Some(pool.utf8(attribute.read_u2()?)?.to_string()),
            "ConstantValue" => field.constant_value = Some(pool.constant(attribute.read_u2()?)?),
            "RuntimeVisibleAnnotations" => {
                field.annotations.extend(read_annotations(&mut attribute, pool, true)?)
            }
            "RuntimeInvisibleAnnotations" => {
                field.annotations.extend(read_annotations(&mut attribute, pool, false)?)
            }
            _ => {}
        }
    }
    Ok(field)
}

fn read_method(reader: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<MethodInfo, ClassParseError> {
    let access_flags = AccessFlags(reader.read_u2()?);
    let name = pool.utf8(reader.read_u2()?)?.to_string();
    let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let mut method = MethodInfo {
        access_flags,
        name,
        descriptor,
        signature: None,
        parameters: Vec::new(),
        annotation_default: None,
        annotations: Vec::new(),
    };

    let attributes_count = reader.read_u2()?;
    for _ in 0..attributes_count {
        let name = pool.utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let mut attribute = ClassReader::new(reader.read_slice(length)?);
        match name {
            "Signature" => method.signature = Some(pool.utf8(attribute.read_u2()?)?.to_string()),
            "MethodParameters" => {
                let count = attribute.read_u1()?;
                for _ in 0..count {
                    let name_index = attribute.read_u2()?;
                    let flags = attribute.read_u2()?;
                    method.parameters.push(MethodParameter {
                        name: pool.optional_utf8(name_index)?,
                        access_flags: AccessFlags(flags),
                    });
                }
            }
            "AnnotationDefault" => {
                method.annotation_default = Some(read_element_value(&mut attribute, pool, true)?)
            }
            "RuntimeVisibleAnnotations" => {
                method.annotations.extend(read_annotations(&mut attribute, pool, true)?)
            }
            "RuntimeInvisibleAnnotations" => {
                method.annotations.extend(read_annotations(&mut attribute, pool, false)?)
            }
            _ => {}
        }
    }
    Ok(method)
}

fn read_annotations(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Vec<AnnotationInfo>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(read_annotation(reader, pool, visible)?);
    }
    Ok(annotations)
}

fn read_annotation(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<AnnotationInfo, ClassParseError> {
    let type_descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let pairs = reader.read_u2()?;
    let mut elements = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        let name = pool.utf8(reader.read_u2()?)?.to_string();
        elements.push((name, read_element_value(reader, pool, visible)?));
    }
    Ok(AnnotationInfo {
        type_descriptor,
        visible,
        elements,
    })
}

fn read_element_value(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<AnnotationValue, ClassParseError> {
    let tag = reader.read_u1()?;
    let value = match tag {
        b'B' | b'C' | b'I' | b'S' | b'Z' | b'D' | b'F' | b'J' => AnnotationValue::Constant {
            tag: tag as char,
            value: pool.constant(reader.read_u2()?)?,
        },
        b's' => AnnotationValue::Constant {
            tag: 's',
            value: ConstantValue::String(pool.utf8(reader.read_u2()?)?.to_string()),
        },
        b'e' => AnnotationValue::Enum {
            type_descriptor: pool.utf8(reader.read_u2()?)?.to_string(),
            const_name: pool.utf8(reader.read_u2()?)?.to_string(),
        },
        b'c' => AnnotationValue::Class(pool.utf8(reader.read_u2()?)?.to_string()),
        b'@' => AnnotationValue::Annotation(read_annotation(reader, pool, visible)?),
        b'[' => {
            let count = reader.read_u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(read_element_value(reader, pool, visible)?);
            }
            AnnotationValue::Array(values)
        }
        other => return Err(ClassParseError::InvalidElementTag { tag: other as char }),
    };
    Ok(value)
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable); // index 0 unused

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    Constant::Utf8(decode_modified_utf8(reader.read_slice(length)?)?)
                }
                3 => Constant::Integer(reader.read_u4()? as i32),
                4 => Constant::Float(f32::from_bits(reader.read_u4()?)),
                5 | 6 => {
                    let high = reader.read_u4()? as u64;
                    let low = reader.read_u4()? as u64;
                    let bits = (high << 32) | low;
                    let entry = if tag == 5 {
                        Constant::Long(bits as i64)
                    } else {
                        Constant::Double(f64::from_bits(bits))
                    };
                    // Eight-byte constants take two pool slots.
                    entries.push(entry);
                    index += 1;
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => Constant::String {
                    string_index: reader.read_u2()?,
                },
                9 | 10 | 11 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                16 | 19 | 20 => {
                    reader.read_u2()?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn optional_utf8(&self, index: u16) -> Result<Option<String>, ClassParseError> {
        if index == 0 {
            return Ok(None);
        }
        self.utf8(index).map(|value| Some(value.to_string()))
    }

    fn class_name(&self, index: u16) -> Result<String, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => Ok(self.utf8(*name_index)?.to_string()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn optional_class_name(&self, index: u16) -> Result<Option<String>, ClassParseError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    fn name_and_type(&self, index: u16) -> Result<(String, String), ClassParseError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((
                self.utf8(*name_index)?.to_string(),
                self.utf8(*descriptor_index)?.to_string(),
            )),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn constant(&self, index: u16) -> Result<ConstantValue, ClassParseError> {
        let value = match self.get(index)? {
            Constant::Integer(value) => ConstantValue::Int(*value),
            Constant::Float(value) => ConstantValue::Float(*value),
            Constant::Long(value) => ConstantValue::Long(*value),
            Constant::Double(value) => ConstantValue::Double(*value),
            Constant::String { string_index } => {
                ConstantValue::String(self.utf8(*string_index)?.to_string())
            }
            _ => return Err(ClassParseError::InvalidConstantIndex { index }),
        };
        Ok(value)
    }
}

/// Decodes the JVM's modified UTF-8 (two-byte NUL, surrogate pairs as two
/// three-byte sequences).
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ClassParseError> {
    if bytes.is_ascii() {
        return String::from_utf8(bytes.to_vec()).map_err(|_| ClassParseError::InvalidModifiedUtf8);
    }

    let continuation = |index: usize| -> Result<u16, ClassParseError> {
        match bytes.get(index) {
            Some(byte) if byte & 0xC0 == 0x80 => Ok((byte & 0x3F) as u16),
            _ => Err(ClassParseError::InvalidModifiedUtf8),
        }
    };

    let mut units = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let lead = bytes[index];
        if lead & 0x80 == 0 {
            units.push(lead as u16);
            index += 1;
        } else if lead & 0xE0 == 0xC0 {
            units.push(((lead & 0x1F) as u16) << 6 | continuation(index + 1)?);
            index += 2;
        } else if lead & 0xF0 == 0xE0 {
            units.push(
                ((lead & 0x0F) as u16) << 12
                    | continuation(index + 1)? << 6
                    | continuation(index + 2)?,
            );
            index += 3;
        } else {
            return Err(ClassParseError::InvalidModifiedUtf8);
        }
    }
    String::from_utf16(&units).map_err(|_| ClassParseError::InvalidModifiedUtf8)
}

/// Encodes a string the way the constant pool stores it.
#[cfg(any(test, feature = "testing"))]
pub(crate) fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        const MAGIC: u32 = 0xCAFEBABE;
        let magic = self.read_u4()?;
        if magic != MAGIC {
            return Err(ClassParseError::InvalidMagic);
        }
        Ok(())
    }

    fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        if self.pos >= self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        if self.pos + len > self.data.len() {
            return Err(ClassParseError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ClassFileBuilder, FieldSpec, MethodSpec};

    #[test]
    fn rejects_non_class_bytes() {
        assert!(matches!(
            parse_class(b"not a class"),
            Err(ClassParseError::InvalidMagic)
        ));
        assert!(matches!(
            parse_class(&[0xCA, 0xFE, 0xBA, 0xBE, 0, 0]),
            Err(ClassParseError::UnexpectedEof)
        ));
    }

    #[test]
    fn reads_class_structure_and_attributes() {
        let bytes = ClassFileBuilder::new("pack/Outer$Inner")
            .access(AccessFlags::PUBLIC | AccessFlags::SUPER)
            .interface("java/util/List")
            .signature("Ljava/lang/Object;Ljava/util/List<Ljava/lang/String;>;")
            .inner_class(
                "pack/Outer$Inner",
                Some("pack/Outer"),
                Some("Inner"),
                AccessFlags::PUBLIC | AccessFlags::STATIC,
            )
            .field(
                FieldSpec::new(AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL, "LIMIT", "J")
                    .constant(ConstantValue::Long(1 << 40)),
            )
            .method(
                MethodSpec::new(AccessFlags::PUBLIC, "<init>", "(Ljava/lang/String;)V")
                    .parameter_names(&["label"]),
            )
            .annotation(AnnotationInfo {
                type_descriptor: "Lpack/Marker;".into(),
                visible: true,
                elements: vec![(
                    "name".into(),
                    AnnotationValue::Constant {
                        tag: 's',
                        value: ConstantValue::String("név".into()),
                    },
                )],
            })
            .build();

        let class = parse_class(&bytes).expect("parsed class");
        assert_eq!(class.this_class, "pack/Outer$Inner");
        assert_eq!(class.package(), "pack");
        assert_eq!(class.binary_simple_name(), "Outer$Inner");
        assert_eq!(class.super_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(class.interfaces, vec!["java/util/List".to_string()]);
        assert!(class.declared_flags().is_static());
        assert!(!class.access_flags.is_static());

        assert_eq!(class.fields[0].constant_value, Some(ConstantValue::Long(1 << 40)));
        assert_eq!(
            class.methods[0].parameters[0].name.as_deref(),
            Some("label")
        );

        let marker = class.find_annotation("Lpack/Marker;").expect("annotation");
        assert_eq!(
            marker.element("name"),
            Some(&AnnotationValue::Constant {
                tag: 's',
                value: ConstantValue::String("név".into()),
            })
        );
    }

    #[test]
    fn member_classes_skip_foreign_entries() {
        let bytes = ClassFileBuilder::new("pack/Outer")
            .inner_class("pack/Outer$A", Some("pack/Outer"), Some("A"), AccessFlags::PUBLIC)
            .inner_class("pack/Outer$1", None, None, 0)
            .inner_class("java/util/Map$Entry", Some("java/util/Map"), Some("Entry"), AccessFlags::PUBLIC)
            .build();
        let class = parse_class(&bytes).expect("parsed class");
        let members: Vec<&str> = class
            .member_classes()
            .map(|entry| entry.inner_class.as_str())
            .collect();
        assert_eq!(members, vec!["pack/Outer$A"]);
        assert!(class.own_inner_entry().is_none());
    }

    #[test]
    fn modified_utf8_handles_nul_and_supplementary_characters() {
        let text = "a\u{0}b\u{1F600}";
        let encoded = encode_modified_utf8(text);
        assert!(!encoded.contains(&0));
        assert_eq!(decode_modified_utf8(&encoded).expect("decoded"), text);
    }
}
