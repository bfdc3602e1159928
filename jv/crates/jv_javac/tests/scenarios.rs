mod common;

use common::{class, supertype_names, write_classes, Project};
use jv_build::testing::ClassFileBuilder;
use jv_javac::{
    AnnotationArgument, ClassId, ClassOrigin, ClassifierRef, FqName, JavaClassifier, JavaType,
    LiteralValue, ModelError, Visibility,
};
use std::collections::BTreeSet;

fn field_type(project_class: &jv_javac::JavaClass, field: &str) -> JavaType {
    project_class
        .fields()
        .into_iter()
        .find(|candidate| candidate.name() == field)
        .unwrap_or_else(|| panic!("field {field} missing"))
        .ty()
}

fn field_classifier(project_class: &jv_javac::JavaClass, field: &str) -> ClassifierRef {
    field_type(project_class, field)
        .as_classifier_type()
        .expect("classifier type")
        .classifier()
}

fn resolved_name(classifier: &ClassifierRef) -> String {
    classifier
        .as_class()
        .map(|class| class.fq_name().to_string())
        .unwrap_or_else(|| panic!("unresolved: {classifier:?}"))
}

#[test]
fn singleton_scenario() {
    let project = Project::new()
        .source(
            "pack/MyAnnotation.java",
            "package pack;\npublic @interface MyAnnotation { String name(); }\n",
        )
        .source(
            "pack/Singleton.java",
            r#"package pack;

import java.util.List;

@MyAnnotation(name = "name")
public class Singleton implements List<String> {
    public Singleton() {}
    public Singleton(String value) {}
}
"#,
        );
    let session = project.open();

    let id = ClassId::new(FqName::from("pack"), FqName::from("Singleton"));
    let singleton = session
        .find_class_by_id(&id)
        .expect("lookup")
        .expect("Singleton");

    assert!(!singleton.is_interface());
    assert_eq!(singleton.origin(), ClassOrigin::Source);

    let constructors = singleton.constructors();
    assert_eq!(constructors.len(), 2);
    assert!(constructors
        .iter()
        .any(|constructor| constructor.value_parameters().is_empty()));
    let with_string = constructors
        .iter()
        .find(|constructor| constructor.value_parameters().len() == 1)
        .expect("String overload");
    let parameter_type = with_string.value_parameters()[0].ty();
    assert_eq!(parameter_type.canonical_text(), "java.lang.String");

    let annotation_id = ClassId::new(FqName::from("pack"), FqName::from("MyAnnotation"));
    let annotation = singleton
        .find_annotation(&annotation_id)
        .expect("annotation found");
    let arguments = annotation.arguments().expect("arguments");
    assert!(matches!(
        arguments.as_slice(),
        [AnnotationArgument::Literal { name: Some(name), value: LiteralValue::String(value) }]
            if name == "name" && value == "name"
    ));

    let supertypes = singleton.supertypes();
    assert_eq!(supertypes.len(), 1);
    assert_eq!(supertypes[0].canonical_text(), "java.util.List<java.lang.String>");
    assert!(!supertypes[0].is_raw());
    assert_eq!(
        supertypes[0].classifier().as_class().map(|list| list.origin()),
        Some(ClassOrigin::Compiled)
    );
}

#[test]
fn package_lists_exactly_its_classes() {
    let project = Project::new()
        .source("pack/SomeClass.java", "package pack;\npublic class SomeClass {}\n")
        .source("pack/Singleton.java", "package pack;\npublic class Singleton {}\n")
        .source("pack/Enum.java", "package pack;\npublic enum Enum { A, B }\n")
        .source("pack/SimpleClass.java", "package pack;\nclass SimpleClass {}\n")
        .source("other/Elsewhere.java", "package other;\nclass Elsewhere {}\n");
    let session = project.open();

    let package = session
        .find_package(&FqName::from("pack"))
        .expect("lookup")
        .expect("package");
    let names: BTreeSet<String> = package
        .classes(|_| true)
        .iter()
        .map(|class| class.fq_name().to_string())
        .collect();
    let expected: BTreeSet<String> = ["pack.SomeClass", "pack.Singleton", "pack.Enum", "pack.SimpleClass"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(names, expected);

    let filtered = package.classes(|name| name.starts_with('S'));
    assert_eq!(filtered.len(), 3);
}

#[test]
fn classes_from_package_include_nested_classes() {
    let project = Project::new().source(
        "pack/Outer.java",
        "package pack;\npublic class Outer { class Inner { interface Deep {} } }\n",
    );
    let session = project.open();

    let names: Vec<String> = session
        .find_classes_from_package(&FqName::from("pack"))
        .expect("classes")
        .iter()
        .map(|class| class.fq_name().to_string())
        .collect();
    assert_eq!(names, ["pack.Outer", "pack.Outer.Inner", "pack.Outer.Inner.Deep"]);
}

#[test]
fn fq_names_follow_nesting() {
    let project = Project::new()
        .source(
            "pack/Outer.java",
            "package pack;\npublic class Outer { static class Inner { enum Deep { X } } }\n",
        )
        .source("Main.java", "public class Main {}\n");
    let session = project.open();

    let outer = class(&session, "pack.Outer");
    let inner = outer.find_inner_class("Inner").expect("Inner");
    let deep = inner.find_inner_class("Deep").expect("Deep");
    assert_eq!(inner.fq_name(), outer.fq_name().child("Inner"));
    assert_eq!(deep.fq_name(), FqName::from("pack.Outer.Inner.Deep"));
    assert_eq!(deep.outer_class().map(|outer| outer.fq_name()), Some(inner.fq_name()));
    assert_eq!(
        deep.class_id(),
        ClassId::new(FqName::from("pack"), FqName::from("Outer.Inner.Deep"))
    );
    assert!(outer.outer_class().is_none());

    let main = class(&session, "Main");
    assert!(main.class_id().package().is_root());
    assert!(main.outer_class().is_none());
}

#[test]
fn find_class_is_idempotent() {
    let project = Project::new().source("pack/A.java", "package pack;\npublic class A {}\n");
    let session = project.open();

    for name in ["pack.A", "java.util.List", "java.util.Map.Entry"] {
        let first = class(&session, name);
        let second = class(&session, name);
        assert_eq!(first.fq_name(), second.fq_name());
        assert_eq!(first, second);
    }
}

#[test]
fn same_package_supertype() {
    let project = Project::new()
        .source("pack/A.java", "package pack;\npublic class A {}\n")
        .source("pack/B.java", "package pack;\npublic class B extends A {}\n");
    let session = project.open();

    assert_eq!(supertype_names(&class(&session, "pack.B")), ["pack.A"]);
}

#[test]
fn wildcard_import_resolves_bare_name() {
    let project = Project::new()
        .source("pack2/Helper.java", "package pack2;\npublic class Helper {}\n")
        .source(
            "pack/User.java",
            "package pack;\nimport pack2.*;\npublic class User extends Helper {}\n",
        );
    let session = project.open();

    assert_eq!(supertype_names(&class(&session, "pack.User")), ["pack2.Helper"]);
}

#[test]
fn java_lang_fallback() {
    let project = Project::new().source(
        "pack/Person.java",
        "package pack;\npublic class Person { String name; }\n",
    );
    let session = project.open();

    let person = class(&session, "pack.Person");
    let classifier = field_classifier(&person, "name");
    assert_eq!(resolved_name(&classifier), "java.lang.String");
    assert_eq!(classifier.as_class().map(|class| class.origin()), Some(ClassOrigin::Compiled));
}

#[test]
fn single_type_import_wins_over_same_package() {
    let project = Project::new()
        .source("pack/List.java", "package pack;\npublic class List {}\n")
        .source(
            "pack/Holder.java",
            "package pack;\nimport java.util.List;\npublic class Holder { List<String> items; }\n",
        );
    let session = project.open();

    let holder = class(&session, "pack.Holder");
    assert_eq!(resolved_name(&field_classifier(&holder, "items")), "java.util.List");
}

#[test]
fn member_classes_before_same_package() {
    let project = Project::new()
        .source("pack/Node.java", "package pack;\npublic class Node {}\n")
        .source(
            "pack/Tree.java",
            "package pack;\npublic class Tree { static class Node {} Node root; Tree parent; }\n",
        );
    let session = project.open();

    let tree = class(&session, "pack.Tree");
    assert_eq!(resolved_name(&field_classifier(&tree, "root")), "pack.Tree.Node");
    assert_eq!(resolved_name(&field_classifier(&tree, "parent")), "pack.Tree");
}

#[test]
fn inherited_member_classes_are_in_scope() {
    let project = Project::new()
        .source(
            "pack/Base.java",
            "package pack;\npublic class Base { public static class Nested {} }\n",
        )
        .source(
            "pack/Derived.java",
            "package pack;\npublic class Derived extends Base { Nested nested; }\n",
        );
    let session = project.open();

    let derived = class(&session, "pack.Derived");
    assert_eq!(resolved_name(&field_classifier(&derived, "nested")), "pack.Base.Nested");
    let declared = class(&session, "pack.Base.Nested");
    assert_eq!(declared.fq_name(), FqName::from("pack.Base.Nested"));
    assert!(session
        .find_class(&FqName::from("pack.Derived.Nested"))
        .expect("lookup")
        .is_none());
}

#[test]
fn supertype_clause_ignores_own_members() {
    let project = Project::new()
        .source("pack/B.java", "package pack;\npublic class B {}\n")
        .source(
            "pack/A.java",
            "package pack;\npublic class A extends B { static class B {} }\n",
        );
    let session = project.open();

    assert_eq!(supertype_names(&class(&session, "pack.A")), ["pack.B"]);
}

#[test]
fn qualified_and_nested_names() {
    let project = Project::new().source(
        "pack/Refs.java",
        r#"package pack;

import java.util.Map;

public class Refs {
    Map.Entry<String, String> entry;
    java.util.List<String> list;
}
"#,
    );
    let session = project.open();

    let refs = class(&session, "pack.Refs");
    assert_eq!(resolved_name(&field_classifier(&refs, "entry")), "java.util.Map.Entry");
    assert_eq!(resolved_name(&field_classifier(&refs, "list")), "java.util.List");
    assert_eq!(
        field_type(&refs, "entry").canonical_text(),
        "java.util.Map.Entry<java.lang.String, java.lang.String>"
    );
}

#[test]
fn type_parameters_resolve_last() {
    let project = Project::new().source(
        "pack/Box.java",
        r#"package pack;

public class Box<T extends Comparable> {
    T value;
    <R> R map() { return null; }
}
"#,
    );
    let session = project.open();

    let boxed = class(&session, "pack.Box");
    match field_classifier(&boxed, "value") {
        ClassifierRef::Resolved(JavaClassifier::TypeParameter(parameter)) => {
            assert_eq!(parameter.name(), "T");
            assert_eq!(parameter.owner(), "pack.Box");
            let bounds = parameter.upper_bounds();
            assert_eq!(bounds.len(), 1);
            assert!(!bounds[0].classifier().is_resolved());
        }
        other => panic!("expected type parameter, got {other:?}"),
    }

    let map = boxed.methods().into_iter().find(|method| method.name() == "map").expect("map");
    let returned = map.return_type();
    match returned.as_classifier_type().map(|ty| ty.classifier()) {
        Some(ClassifierRef::Resolved(JavaClassifier::TypeParameter(parameter))) => {
            assert_eq!(parameter.owner(), "pack.Box.map");
        }
        other => panic!("expected method type parameter, got {other:?}"),
    }
}

#[test]
fn raw_types() {
    let project = Project::new().source(
        "pack/Raw.java",
        "package pack;\nimport java.util.List;\npublic class Raw { List raw; List<String> typed; Raw self; }\n",
    );
    let session = project.open();

    let raw = class(&session, "pack.Raw");
    let is_raw = |field: &str| {
        field_type(&raw, field)
            .as_classifier_type()
            .map(|ty| ty.is_raw())
            .unwrap_or(false)
    };
    assert!(is_raw("raw"));
    assert!(!is_raw("typed"));
    assert!(!is_raw("self"));
}

#[test]
fn unresolved_names_and_cycles() {
    let project = Project::new()
        .source("pack/A.java", "package pack;\npublic class A extends B { Missing missing; }\n")
        .source("pack/B.java", "package pack;\npublic class B extends A {}\n");
    let session = project.open();

    let a = class(&session, "pack.A");
    assert_eq!(
        field_classifier(&a, "missing"),
        ClassifierRef::Unresolved("Missing".to_string())
    );
    assert_eq!(supertype_names(&a), ["pack.B"]);
}

#[test]
fn implicit_interface_modifiers() {
    let project = Project::new().source(
        "pack/Shape.java",
        r#"package pack;

public interface Shape {
    int SIDES = 4;
    double area();
    default String label() { return "shape"; }
    class Unit {}
}
"#,
    );
    let session = project.open();

    let shape = class(&session, "pack.Shape");
    assert!(shape.is_interface());
    assert!(shape.is_abstract());

    let sides = shape.fields().into_iter().next().expect("SIDES");
    assert!(sides.is_static());
    assert!(sides.is_final());
    assert_eq!(sides.visibility(), Visibility::Public);
    assert_eq!(sides.initializer_value(), Some(LiteralValue::Int(4)));
    assert!(sides.has_constant_not_null_initializer());

    let methods = shape.methods();
    let area = methods.iter().find(|method| method.name() == "area").expect("area");
    let label = methods.iter().find(|method| method.name() == "label").expect("label");
    assert!(area.is_abstract());
    assert!(!label.is_abstract());
    assert_eq!(area.visibility(), Visibility::Public);

    let unit = shape.find_inner_class("Unit").expect("Unit");
    assert!(unit.is_static());
    assert_eq!(unit.visibility(), Visibility::Public);
}

#[test]
fn enum_and_record_declarations() {
    let project = Project::new()
        .source("pack/Color.java", "package pack;\npublic enum Color { RED, GREEN }\n")
        .source("pack/Point.java", "package pack;\npublic record Point(int x, int y) {}\n");
    let session = project.open();

    let color = class(&session, "pack.Color");
    assert!(color.is_enum());
    assert!(color.is_final());
    let entries: Vec<String> = color
        .fields()
        .iter()
        .filter(|field| field.is_enum_entry())
        .map(|field| field.name())
        .collect();
    assert_eq!(entries, ["RED", "GREEN"]);

    let point = class(&session, "pack.Point");
    assert!(point.is_record());
    let constructors = point.constructors();
    assert_eq!(constructors.len(), 1);
    let names: Vec<String> = constructors[0]
        .value_parameters()
        .iter()
        .map(|parameter| parameter.name())
        .collect();
    assert_eq!(names, ["x", "y"]);
}

#[test]
fn annotation_arguments() {
    let project = Project::new()
        .source("pack/Level.java", "package pack;\npublic enum Level { LOW, HIGH }\n")
        .source(
            "pack/Tagged.java",
            "package pack;\npublic @interface Tagged { Level level() default Level.LOW; String[] tags() default {}; Class<?> type() default Object.class; }\n",
        )
        .source(
            "pack/Target.java",
            r#"package pack;

@Tagged(level = Level.HIGH, tags = {"a", "b"}, type = String.class)
public class Target {
    @Tagged(tags = "x" + "y") int computed;
}
"#,
        );
    let session = project.open();

    let target = class(&session, "pack.Target");
    let tagged_id = ClassId::new(FqName::from("pack"), FqName::from("Tagged"));
    let annotation = target.find_annotation(&tagged_id).expect("@Tagged");

    match annotation.argument("level").expect("arguments") {
        Some(AnnotationArgument::EnumReference { enum_class_id, entry_name, .. }) => {
            assert_eq!(
                enum_class_id,
                Some(ClassId::new(FqName::from("pack"), FqName::from("Level")))
            );
            assert_eq!(entry_name, "HIGH");
        }
        other => panic!("expected enum reference, got {other:?}"),
    }
    match annotation.argument("tags").expect("arguments") {
        Some(AnnotationArgument::Array { elements, .. }) => assert_eq!(elements.len(), 2),
        other => panic!("expected array, got {other:?}"),
    }
    match annotation.argument("type").expect("arguments") {
        Some(AnnotationArgument::ClassObject { ty, .. }) => {
            assert_eq!(ty.canonical_text(), "java.lang.String")
        }
        other => panic!("expected class literal, got {other:?}"),
    }

    let computed = target.fields().into_iter().next().expect("computed");
    let field_annotation = computed.find_annotation(&tagged_id).expect("@Tagged on field");
    assert!(matches!(
        field_annotation.arguments(),
        Err(ModelError::NotImplemented { .. })
    ));

    let tagged = class(&session, "pack.Tagged");
    assert!(tagged.is_annotation_type());
    let level = tagged
        .methods()
        .into_iter()
        .find(|method| method.name() == "level")
        .expect("level");
    assert!(level.has_annotation_parameter_default_value());
    assert!(matches!(
        level.annotation_parameter_default_value(),
        Ok(Some(AnnotationArgument::EnumReference { .. }))
    ));
}

#[test]
fn packages_from_sources_and_classpath() {
    let project = Project::new().source("pack/inner/Deep.java", "package pack.inner;\nclass Deep {}\n");
    let session = project.open();

    let found = |name: &str| session.find_package(&FqName::from(name)).expect("lookup").is_some();
    assert!(found("java"));
    assert!(found("java.util"));
    assert!(found("pack.inner"));
    assert!(!found("pack"));
    assert!(!found("nope"));
    assert!(session.find_package(&FqName::root()).expect("lookup").is_some());

    let sub_packages: Vec<String> = session
        .find_sub_packages(&FqName::from("java"))
        .expect("sub packages")
        .iter()
        .map(|package| package.fq_name().to_string())
        .collect();
    assert_eq!(sub_packages, ["java.lang", "java.lang.annotation", "java.util"]);

    let known = session
        .known_class_names_in_package(&FqName::from("java.util"))
        .expect("lookup")
        .expect("listing");
    assert!(known.contains("List"));
    assert!(known.contains("Map"));
    assert!(!known.contains("String"));
}

#[test]
fn sub_packages_merge_sources_and_classpath() {
    let project = Project::new()
        .source("pack/inner/Top.java", "package pack.inner;\npublic class Top {}\n")
        .source("pack/inner/deep/Leaf.java", "package pack.inner.deep;\nclass Leaf {}\n");
    write_classes(&project.platform(), &[ClassFileBuilder::new("pack/inner/Lib")]);
    let session = project.open();

    let sub_packages = |name: &str| -> Vec<String> {
        session
            .find_sub_packages(&FqName::from(name))
            .expect("sub packages")
            .iter()
            .map(|package| package.fq_name().to_string())
            .collect()
    };
    assert_eq!(sub_packages("pack"), ["pack.inner", "pack.inner.deep"]);
    assert_eq!(sub_packages("pack.inner"), ["pack.inner.deep"]);
    assert!(sub_packages("pack.inner.deep").is_empty());
}

#[test]
fn search_scopes() {
    use jv_javac::SearchScope;

    let project = Project::new().source("pack/A.java", "package pack;\npublic class A {}\n");
    let session = project.open();

    let a = FqName::from("pack.A");
    let list = FqName::from("java.util.List");
    let found = |name: &FqName, scope| session.find_class_in(name, scope).expect("lookup").is_some();
    assert!(found(&a, SearchScope::SourcesOnly));
    assert!(!found(&a, SearchScope::CompiledOnly));
    assert!(!found(&list, SearchScope::SourcesOnly));
    assert!(found(&list, SearchScope::CompiledOnly));

    let package = |name: &str, scope| {
        session
            .find_package_in(&FqName::from(name), scope)
            .expect("lookup")
            .is_some()
    };
    assert!(package("pack", SearchScope::SourcesOnly));
    assert!(!package("pack", SearchScope::CompiledOnly));
    assert!(package("java.util", SearchScope::CompiledOnly));
}

#[test]
fn class_id_must_match_package_split() {
    let project = Project::new().source(
        "pack/Outer.java",
        "package pack;\npublic class Outer { public static class Inner {} }\n",
    );
    let session = project.open();

    let nested = ClassId::new(FqName::from("pack"), FqName::from("Outer.Inner"));
    let wrong_split = ClassId::new(FqName::from("pack.Outer"), FqName::from("Inner"));
    assert!(session.find_class_by_id(&nested).expect("lookup").is_some());
    assert!(session.find_class_by_id(&wrong_split).expect("lookup").is_none());

    let entry = ClassId::new(FqName::from("java.util"), FqName::from("Map.Entry"));
    let found = session.find_class_by_id(&entry).expect("lookup").expect("Map.Entry");
    assert_eq!(found.origin(), ClassOrigin::Compiled);
    assert!(found.is_static());
}

#[test]
fn session_lifecycle() {
    use jv_javac::{JavacError, JavacSession, SessionState};

    let project = Project::new().source("pack/A.java", "package pack;\npublic class A {}\n");
    let mut session = JavacSession::new(project.config()).expect("session");
    assert_eq!(session.state(), SessionState::Created);
    assert!(session
        .find_class(&FqName::from("pack.A"))
        .expect("lookup")
        .is_none());
    assert!(session.java_lang_object().expect("lookup").is_some());

    session.parse().expect("parse");
    assert_eq!(session.state(), SessionState::Parsed);
    session.parse().expect("second parse");
    assert_eq!(session.compilation_units().expect("units").len(), 1);
    assert!(session.find_class(&FqName::from("pack.A")).expect("lookup").is_some());

    session.close();
    session.close();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(matches!(
        session.find_class(&FqName::from("pack.A")),
        Err(JavacError::Closed)
    ));
    assert!(matches!(session.compilation_units(), Err(JavacError::Closed)));
    assert!(matches!(session.parse(), Err(JavacError::Closed)));
}

#[test]
fn syntax_errors_do_not_fail_the_session() {
    let project = Project::new()
        .source("pack/Broken.java", "package pack;\npublic class Broken { int x = ; }\n")
        .source("pack/Fine.java", "package pack;\npublic class Fine {}\n");
    let session = project.open();

    assert!(session.find_class(&FqName::from("pack.Fine")).expect("lookup").is_some());
}
