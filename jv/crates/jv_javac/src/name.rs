use std::fmt;

/// Dot-separated name of a package or class; the empty name is the root package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FqName(String);

impl FqName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn root() -> Self {
        Self(String::new())
    }

    /// `a/b/C` to `a.b.C`; `$` is left alone.
    pub fn from_internal(internal: &str) -> Self {
        Self(internal.replace('/', "."))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Internal form, `a/b/C`.
    pub fn to_internal(&self) -> String {
        self.0.replace('.', "/")
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }

    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// `None` only for the root.
    pub fn parent(&self) -> Option<FqName> {
        if self.is_root() {
            return None;
        }
        Some(match self.0.rsplit_once('.') {
            Some((parent, _)) => FqName(parent.to_string()),
            None => FqName::root(),
        })
    }

    pub fn child(&self, name: &str) -> FqName {
        if self.is_root() {
            FqName(name.to_string())
        } else {
            FqName(format!("{}.{name}", self.0))
        }
    }

    /// True for `self == package` and for any package below it.
    pub fn is_subpackage_of(&self, package: &FqName) -> bool {
        if package.is_root() {
            return true;
        }
        self.0 == package.0
            || self
                .0
                .strip_prefix(package.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }

    pub fn is_strict_subpackage_of(&self, package: &FqName) -> bool {
        self != package && self.is_subpackage_of(package)
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FqName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A class named by its package and its dotted name relative to the package,
/// e.g. `java.util` + `Map.Entry`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassId {
    package: FqName,
    relative: FqName,
}

impl ClassId {
    pub fn new(package: FqName, relative: FqName) -> Self {
        Self { package, relative }
    }

    pub fn top_level(fq_name: &FqName) -> Self {
        Self {
            package: fq_name.parent().unwrap_or_default(),
            relative: FqName::new(fq_name.short_name()),
        }
    }

    pub fn package(&self) -> &FqName {
        &self.package
    }

    pub fn relative_class_name(&self) -> &FqName {
        &self.relative
    }

    pub fn short_class_name(&self) -> &str {
        self.relative.short_name()
    }

    pub fn is_nested(&self) -> bool {
        self.relative.as_str().contains('.')
    }

    pub fn create_nested(&self, name: &str) -> ClassId {
        Self {
            package: self.package.clone(),
            relative: self.relative.child(name),
        }
    }

    pub fn outer_class_id(&self) -> Option<ClassId> {
        if !self.is_nested() {
            return None;
        }
        self.relative.parent().map(|relative| Self {
            package: self.package.clone(),
            relative,
        })
    }

    pub fn as_fq_name(&self) -> FqName {
        self.relative
            .segments()
            .fold(self.package.clone(), |fq, segment| fq.child(segment))
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package.to_internal(), self.relative)
    }
}

/// Java identifier check used on names taken from classfiles.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parent_and_child() {
        let name = FqName::from("java.util.Map");
        assert_eq!(name.short_name(), "Map");
        assert_eq!(name.parent(), Some(FqName::from("java.util")));
        assert_eq!(FqName::from("pack").parent(), Some(FqName::root()));
        assert_eq!(FqName::root().parent(), None);
        assert_eq!(FqName::root().child("A"), FqName::from("A"));
        assert_eq!(FqName::from("a").child("B").as_str(), "a.B");
    }

    #[test_case("a.b", "a", true; "child")]
    #[test_case("a.b.c", "a", true; "grandchild")]
    #[test_case("ab", "a", false; "shared prefix only")]
    #[test_case("a", "a", true; "itself")]
    #[test_case("a", "", true; "root")]
    fn subpackage_checks(name: &str, package: &str, expected: bool) {
        assert_eq!(
            FqName::from(name).is_subpackage_of(&FqName::from(package)),
            expected
        );
    }

    #[test]
    fn strict_subpackage_excludes_itself() {
        assert!(!FqName::from("a").is_strict_subpackage_of(&FqName::from("a")));
        assert!(FqName::from("a.b").is_strict_subpackage_of(&FqName::from("a")));
    }

    #[test]
    fn class_id_nesting() {
        let outer = ClassId::top_level(&FqName::from("java.util.Map"));
        let entry = outer.create_nested("Entry");

        assert_eq!(entry.as_fq_name(), FqName::from("java.util.Map.Entry"));
        assert_eq!(entry.short_class_name(), "Entry");
        assert!(entry.is_nested());
        assert_eq!(entry.outer_class_id(), Some(outer.clone()));
        assert_eq!(outer.outer_class_id(), None);
        assert_eq!(entry.to_string(), "java/util/Map.Entry");
    }

    #[test]
    fn default_package_class_id() {
        let id = ClassId::top_level(&FqName::from("Main"));
        assert!(id.package().is_root());
        assert_eq!(id.as_fq_name(), FqName::from("Main"));
    }

    #[test_case("Foo", true; "plain")]
    #[test_case("$proxy1", true; "dollar start")]
    #[test_case("1abc", false; "digit start")]
    #[test_case("a-b", false; "dash")]
    #[test_case("", false; "empty")]
    fn identifiers(name: &str, valid: bool) {
        assert_eq!(is_valid_identifier(name), valid);
    }
}
