#![allow(dead_code)]

use jv_build::metadata::AccessFlags;
use jv_build::testing::{ClassFileBuilder, MethodSpec};
use jv_build::{JavacConfig, PlatformConfig};
use jv_javac::{FqName, JavaClass, JavacSession};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ANNOTATION_TYPE: u16 =
    AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT | AccessFlags::ANNOTATION;

/// The slice of the Java platform the scenarios reference.
pub fn platform_classes() -> Vec<ClassFileBuilder> {
    vec![
        ClassFileBuilder::new("java/lang/Object")
            .super_class(None)
            .method(MethodSpec::new(AccessFlags::PUBLIC, "<init>", "()V"))
            .method(MethodSpec::new(AccessFlags::PUBLIC, "toString", "()Ljava/lang/String;")),
        ClassFileBuilder::new("java/lang/String")
            .access(AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER),
        ClassFileBuilder::new("java/lang/Record")
            .access(AccessFlags::PUBLIC | AccessFlags::ABSTRACT | AccessFlags::SUPER),
        ClassFileBuilder::new("java/lang/Deprecated")
            .access(ANNOTATION_TYPE)
            .interface("java/lang/annotation/Annotation"),
        ClassFileBuilder::new("java/lang/Override")
            .access(ANNOTATION_TYPE)
            .interface("java/lang/annotation/Annotation"),
        ClassFileBuilder::interface_type("java/lang/annotation/Annotation"),
        ClassFileBuilder::interface_type("java/util/Collection")
            .signature("<E:Ljava/lang/Object;>Ljava/lang/Object;"),
        ClassFileBuilder::interface_type("java/util/List")
            .interface("java/util/Collection")
            .signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;")
            .method(
                MethodSpec::new(AccessFlags::PUBLIC | AccessFlags::ABSTRACT, "get", "(I)Ljava/lang/Object;")
                    .signature("(I)TE;"),
            ),
        ClassFileBuilder::interface_type("java/util/Map")
            .signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;")
            .inner_class(
                "java/util/Map$Entry",
                Some("java/util/Map"),
                Some("Entry"),
                AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT,
            ),
        ClassFileBuilder::interface_type("java/util/Map$Entry")
            .signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;")
            .inner_class(
                "java/util/Map$Entry",
                Some("java/util/Map"),
                Some("Entry"),
                AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT,
            ),
    ]
}

pub fn write_classes(root: &Path, classes: &[ClassFileBuilder]) {
    for class in classes {
        class.write_to(root).expect("write fixture class");
    }
}

/// A temporary project: Java sources under `src/`, the platform fixture
/// under `platform/`, compiler output in `out/`.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            dir: tempfile::tempdir().expect("temp dir"),
        };
        fs::create_dir_all(project.src()).expect("src dir");
        write_classes(&project.platform(), &platform_classes());
        project
    }

    pub fn src(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    pub fn platform(&self) -> PathBuf {
        self.dir.path().join("platform")
    }

    pub fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn source(self, relative: &str, text: &str) -> Self {
        let path = self.src().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("source dir");
        }
        fs::write(&path, text).expect("write source");
        self
    }

    pub fn config(&self) -> JavacConfig {
        JavacConfig::default()
            .with_sources([self.src()])
            .with_classpath([self.platform()])
            .with_output_dir(self.out())
            .with_platform(PlatformConfig::Disabled)
    }

    pub fn open(&self) -> JavacSession {
        JavacSession::open(self.config()).expect("open session")
    }
}

pub fn class(session: &JavacSession, fq_name: &str) -> JavaClass {
    session
        .find_class(&FqName::from(fq_name))
        .expect("lookup")
        .unwrap_or_else(|| panic!("class {fq_name} not found"))
}

pub fn supertype_names(class: &JavaClass) -> Vec<String> {
    class
        .supertypes()
        .iter()
        .map(|supertype| match supertype.classifier().as_class() {
            Some(resolved) => resolved.fq_name().to_string(),
            None => format!("unresolved {}", supertype.presentable_text()),
        })
        .collect()
}
