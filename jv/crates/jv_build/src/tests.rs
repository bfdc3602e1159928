use super::*;
use crate::metadata::{parse_class, AccessFlags};
use crate::testing::ClassFileBuilder;

#[test]
fn build_error_wraps_classpath_failures() {
    let dir = tempfile::tempdir().expect("temp dir");
    let broken = dir.path().join("broken.jar");
    std::fs::write(&broken, b"not a zip archive").expect("write jar");

    let error: BuildError = ClassPath::new([broken])
        .err()
        .expect("corrupt archive should fail")
        .into();
    assert!(matches!(error, BuildError::ClassPath(ClassPathError::Zip { .. })));
}

#[test]
fn config_classpath_feeds_the_file_manager() {
    let dir = tempfile::tempdir().expect("temp dir");
    ClassFileBuilder::interface_type("dep/Api")
        .write_to(dir.path())
        .expect("write class");

    let config = JavacConfig::default().with_classpath([dir.path().to_path_buf()]);
    let mut classpath = ClassPath::new(config.classpath_entries()).expect("classpath");

    let found = classpath
        .find_class_bytes("dep/Api")
        .expect("lookup")
        .expect("class");
    let class = parse_class(&found.bytes).expect("parsed");
    assert!(class.access_flags.is_interface());
    assert!(class.access_flags.contains(AccessFlags::ABSTRACT));
}

#[cfg(unix)]
#[test]
fn javac_invocation_passes_output_and_classpath() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("temp dir");
    let log = dir.path().join("args.txt");
    let script = dir.path().join("javac");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho \"$@\" > '{}'\nexit 0\n", log.display()),
    )
    .expect("write script");
    let mut permissions = std::fs::metadata(&script).expect("metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&script, permissions).expect("set permissions");

    let out = dir.path().join("out");
    let outcome = JavacInvocation::new(&script)
        .output_dir(&out)
        .classpath([dir.path().join("lib.jar")])
        .options(["-parameters"])
        .run(&[dir.path().join("A.java")])
        .expect("compiler ran");

    assert!(outcome.success);
    assert_eq!(outcome.error_count, 0);
    let args = std::fs::read_to_string(&log).expect("args");
    assert!(args.starts_with(&format!("-d {}", out.display())));
    assert!(args.contains("-cp"));
    assert!(args.contains("-parameters"));
    assert!(args.trim_end().ends_with("A.java"));
}
