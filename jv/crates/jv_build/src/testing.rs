//! Classfile synthesis for tests.
//!
//! Produces structurally valid classfiles without a JDK. Methods carry no
//! `Code` attribute; the output is meant for symbol reading only.

use crate::metadata::{
    encode_modified_utf8, AccessFlags, AnnotationInfo, AnnotationValue, ConstantValue,
    InnerClassEntry,
};
use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    this_class: String,
    access: u16,
    major_version: u16,
    super_class: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    inner_classes: Vec<InnerClassEntry>,
    annotations: Vec<AnnotationInfo>,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    access: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    constant: Option<ConstantValue>,
    annotations: Vec<AnnotationInfo>,
}

impl FieldSpec {
    pub fn new(access: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            constant: None,
            annotations: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn constant(mut self, value: ConstantValue) -> Self {
        self.constant = Some(value);
        self
    }

    pub fn annotation(mut self, annotation: AnnotationInfo) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    access: u16,
    name: String,
    descriptor: String,
    signature: Option<String>,
    parameter_names: Vec<String>,
    annotation_default: Option<AnnotationValue>,
    annotations: Vec<AnnotationInfo>,
}

impl MethodSpec {
    pub fn new(access: u16, name: &str, descriptor: &str) -> Self {
        Self {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            parameter_names: Vec::new(),
            annotation_default: None,
            annotations: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    /// Emits a `MethodParameters` attribute.
    pub fn parameter_names(mut self, names: &[&str]) -> Self {
        self.parameter_names = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn annotation_default(mut self, value: AnnotationValue) -> Self {
        self.annotation_default = Some(value);
        self
    }

    pub fn annotation(mut self, annotation: AnnotationInfo) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl ClassFileBuilder {
    /// A public class extending `java/lang/Object`, Java 17 format.
    pub fn new(internal_name: &str) -> Self {
        Self {
            this_class: internal_name.to_string(),
            access: AccessFlags::PUBLIC | AccessFlags::SUPER,
            major_version: 61,
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            signature: None,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Interface flags with no superclass other than `Object`.
    pub fn interface_type(internal_name: &str) -> Self {
        Self::new(internal_name)
            .access(AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT)
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access = flags;
        self
    }

    pub fn super_class(mut self, name: Option<&str>) -> Self {
        self.super_class = name.map(str::to_string);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        simple_name: Option<&str>,
        flags: u16,
    ) -> Self {
        self.inner_classes.push(InnerClassEntry {
            inner_class: inner.to_string(),
            outer_class: outer.map(str::to_string),
            inner_name: simple_name.map(str::to_string),
            access_flags: AccessFlags(flags),
        });
        self
    }

    pub fn annotation(mut self, annotation: AnnotationInfo) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn internal_name(&self) -> &str {
        &self.this_class
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = PoolWriter::new();
        let mut body = Vec::new();

        put_u2(&mut body, self.access);
        put_u2(&mut body, pool.class(&self.this_class));
        let super_index = self
            .super_class
            .as_deref()
            .map(|name| pool.class(name))
            .unwrap_or(0);
        put_u2(&mut body, super_index);
        put_u2(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            put_u2(&mut body, pool.class(interface));
        }

        put_u2(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            put_u2(&mut body, field.access);
            put_u2(&mut body, pool.utf8(&field.name));
            put_u2(&mut body, pool.utf8(&field.descriptor));
            let mut attributes = Attributes::default();
            if let Some(signature) = &field.signature {
                let index = pool.utf8(signature);
                attributes.push(&mut pool, "Signature", index.to_be_bytes().to_vec());
            }
            if let Some(constant) = &field.constant {
                let index = pool.constant(constant);
                attributes.push(&mut pool, "ConstantValue", index.to_be_bytes().to_vec());
            }
            attributes.annotations(&mut pool, &field.annotations);
            attributes.write(&mut body);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u2(&mut body, method.access);
            put_u2(&mut body, pool.utf8(&method.name));
            put_u2(&mut body, pool.utf8(&method.descriptor));
            let mut attributes = Attributes::default();
            if let Some(signature) = &method.signature {
                let index = pool.utf8(signature);
                attributes.push(&mut pool, "Signature", index.to_be_bytes().to_vec());
            }
            if !method.parameter_names.is_empty() {
                let mut data = vec![method.parameter_names.len() as u8];
                for name in &method.parameter_names {
                    put_u2(&mut data, pool.utf8(name));
                    put_u2(&mut data, 0);
                }
                attributes.push(&mut pool, "MethodParameters", data);
            }
            if let Some(default) = &method.annotation_default {
                let mut data = Vec::new();
                write_element_value(&mut pool, default, &mut data);
                attributes.push(&mut pool, "AnnotationDefault", data);
            }
            attributes.annotations(&mut pool, &method.annotations);
            attributes.write(&mut body);
        }

        let mut attributes = Attributes::default();
        if let Some(signature) = &self.signature {
            let index = pool.utf8(signature);
            attributes.push(&mut pool, "Signature", index.to_be_bytes().to_vec());
        }
        if !self.inner_classes.is_empty() {
            let mut data = Vec::new();
            put_u2(&mut data, self.inner_classes.len() as u16);
            for entry in &self.inner_classes {
                put_u2(&mut data, pool.class(&entry.inner_class));
                let outer = entry
                    .outer_class
                    .as_deref()
                    .map(|name| pool.class(name))
                    .unwrap_or(0);
                put_u2(&mut data, outer);
                let name = entry
                    .inner_name
                    .as_deref()
                    .map(|name| pool.utf8(name))
                    .unwrap_or(0);
                put_u2(&mut data, name);
                put_u2(&mut data, entry.access_flags.0);
            }
            attributes.push(&mut pool, "InnerClasses", data);
        }
        attributes.annotations(&mut pool, &self.annotations);
        attributes.write(&mut body);

        let mut out = Vec::with_capacity(body.len() + pool.bytes.len() + 10);
        out.extend_from_slice(&0xCAFEBABE_u32.to_be_bytes());
        put_u2(&mut out, 0);
        put_u2(&mut out, self.major_version);
        put_u2(&mut out, pool.next_index);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }

    /// Writes `<root>/<internal name>.class`, creating package directories.
    pub fn write_to(&self, root: &Path) -> io::Result<PathBuf> {
        let path = root.join(format!("{}.class", self.this_class));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.build())?;
        Ok(path)
    }
}

#[derive(Default)]
struct Attributes {
    entries: Vec<(u16, Vec<u8>)>,
}

impl Attributes {
    fn push(&mut self, pool: &mut PoolWriter, name: &str, data: Vec<u8>) {
        let index = pool.utf8(name);
        self.entries.push((index, data));
    }

    fn annotations(&mut self, pool: &mut PoolWriter, annotations: &[AnnotationInfo]) {
        for (visible, name) in [
            (true, "RuntimeVisibleAnnotations"),
            (false, "RuntimeInvisibleAnnotations"),
        ] {
            let selected: Vec<&AnnotationInfo> = annotations
                .iter()
                .filter(|annotation| annotation.visible == visible)
                .collect();
            if selected.is_empty() {
                continue;
            }
            let mut data = Vec::new();
            put_u2(&mut data, selected.len() as u16);
            for annotation in selected {
                write_annotation(pool, annotation, &mut data);
            }
            self.push(pool, name, data);
        }
    }

    fn write(self, out: &mut Vec<u8>) {
        put_u2(out, self.entries.len() as u16);
        for (name, data) in self.entries {
            put_u2(out, name);
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            out.extend_from_slice(&data);
        }
    }
}

fn write_annotation(pool: &mut PoolWriter, annotation: &AnnotationInfo, out: &mut Vec<u8>) {
    put_u2(out, pool.utf8(&annotation.type_descriptor));
    put_u2(out, annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        put_u2(out, pool.utf8(name));
        write_element_value(pool, value, out);
    }
}

fn write_element_value(pool: &mut PoolWriter, value: &AnnotationValue, out: &mut Vec<u8>) {
    match value {
        AnnotationValue::Constant { tag, value } => {
            out.push(*tag as u8);
            let index = match (tag, value) {
                ('s', ConstantValue::String(text)) => pool.utf8(text),
                _ => pool.constant(value),
            };
            put_u2(out, index);
        }
        AnnotationValue::Enum {
            type_descriptor,
            const_name,
        } => {
            out.push(b'e');
            put_u2(out, pool.utf8(type_descriptor));
            put_u2(out, pool.utf8(const_name));
        }
        AnnotationValue::Class(descriptor) => {
            out.push(b'c');
            put_u2(out, pool.utf8(descriptor));
        }
        AnnotationValue::Annotation(nested) => {
            out.push(b'@');
            write_annotation(pool, nested, out);
        }
        AnnotationValue::Array(values) => {
            out.push(b'[');
            put_u2(out, values.len() as u16);
            for value in values {
                write_element_value(pool, value, out);
            }
        }
    }
}

struct PoolWriter {
    bytes: Vec<u8>,
    next_index: u16,
    utf8: FxHashMap<String, u16>,
    classes: FxHashMap<String, u16>,
}

impl PoolWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8: FxHashMap::default(),
            classes: FxHashMap::default(),
        }
    }

    fn allocate(&mut self, slots: u16) -> u16 {
        let index = self.next_index;
        self.next_index += slots;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8.get(value) {
            return *index;
        }
        let encoded = encode_modified_utf8(value);
        self.bytes.push(1);
        put_u2(&mut self.bytes, encoded.len() as u16);
        self.bytes.extend_from_slice(&encoded);
        let index = self.allocate(1);
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        self.bytes.push(7);
        put_u2(&mut self.bytes, name_index);
        let index = self.allocate(1);
        self.classes.insert(name.to_string(), index);
        index
    }

    fn constant(&mut self, value: &ConstantValue) -> u16 {
        match value {
            ConstantValue::Int(value) => {
                self.bytes.push(3);
                self.bytes.extend_from_slice(&value.to_be_bytes());
                self.allocate(1)
            }
            ConstantValue::Float(value) => {
                self.bytes.push(4);
                self.bytes.extend_from_slice(&value.to_bits().to_be_bytes());
                self.allocate(1)
            }
            ConstantValue::Long(value) => {
                self.bytes.push(5);
                self.bytes.extend_from_slice(&value.to_be_bytes());
                self.allocate(2)
            }
            ConstantValue::Double(value) => {
                self.bytes.push(6);
                self.bytes.extend_from_slice(&value.to_bits().to_be_bytes());
                self.allocate(2)
            }
            ConstantValue::String(text) => {
                let string_index = self.utf8(text);
                self.bytes.push(8);
                put_u2(&mut self.bytes, string_index);
                self.allocate(1)
            }
        }
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}
