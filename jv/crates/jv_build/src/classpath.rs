//! File manager over classpath roots: class directories, jars and jmods.
use indexmap::{IndexMap, IndexSet};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum ClassPathError {
    #[error("IO error while scanning {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ZIP error while scanning {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

/// Bytes of one class file and where they came from.
#[derive(Debug, Clone)]
pub struct ClassBytes {
    pub bytes: Vec<u8>,
    /// File path, or `archive!/entry` for archive members.
    pub origin: PathBuf,
}

/// Ordered classpath. Lookups follow root order; the first root that has an
/// entry wins.
pub struct ClassPath {
    roots: Vec<ClassPathRoot>,
    closed: bool,
}

enum ClassPathRoot {
    /// Read live on every lookup; output directories change between passes.
    Directory(PathBuf),
    Archive(ArchiveRoot),
}

struct ArchiveRoot {
    path: PathBuf,
    /// `classes/` for jmods, empty for jars.
    prefix: &'static str,
    archive: ZipArchive<BufReader<File>>,
    /// Internal package name -> binary simple names of its class files.
    packages: IndexMap<String, Vec<String>>,
}

impl ClassPath {
    pub fn empty() -> Self {
        Self {
            roots: Vec::new(),
            closed: false,
        }
    }

    pub fn new<I>(entries: I) -> Result<Self, ClassPathError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut classpath = Self::empty();
        for entry in entries {
            classpath.append_root(&entry)?;
        }
        Ok(classpath)
    }

    /// Adds every `*.jmod` of a platform module directory, in file name order.
    pub fn add_platform_modules(&mut self, jmods_dir: &Path) -> Result<(), ClassPathError> {
        let entries = fs::read_dir(jmods_dir).map_err(|source| ClassPathError::Io {
            path: jmods_dir.to_path_buf(),
            source,
        })?;
        let mut modules = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ClassPathError::Io {
                path: jmods_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if has_extension(&path, &["jmod"]) {
                modules.push(path);
            }
        }
        modules.sort();
        debug!(
            jmods = %jmods_dir.display(),
            modules = modules.len(),
            "registering platform modules"
        );
        for module in modules {
            self.append_root(&module)?;
        }
        Ok(())
    }

    /// Appends a root unless it is already present. Missing archives are
    /// skipped; missing directories are kept since they may appear later.
    pub fn append_root(&mut self, path: &Path) -> Result<(), ClassPathError> {
        if self.closed || self.roots.iter().any(|root| root.path() == path) {
            return Ok(());
        }

        if is_archive(path) {
            if !path.is_file() {
                warn!(path = %path.display(), "classpath archive does not exist; skipping");
                return Ok(());
            }
            let root = ArchiveRoot::open(path)?;
            debug!(
                path = %path.display(),
                packages = root.packages.len(),
                "opened classpath archive"
            );
            self.roots.push(ClassPathRoot::Archive(root));
        } else {
            debug!(path = %path.display(), "added classpath directory");
            self.roots.push(ClassPathRoot::Directory(path.to_path_buf()));
        }
        Ok(())
    }

    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(ClassPathRoot::path)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases every archive handle. Later lookups miss.
    pub fn close(&mut self) {
        if !self.closed {
            debug!(roots = self.roots.len(), "closing classpath");
        }
        self.roots.clear();
        self.closed = true;
    }

    /// Reads `internal_name.class` (e.g. `java/util/Map$Entry`) from the first root that has it.
    pub fn find_class_bytes(
        &mut self,
        internal_name: &str,
    ) -> Result<Option<ClassBytes>, ClassPathError> {
        let relative = format!("{internal_name}.class");
        for root in &mut self.roots {
            match root {
                ClassPathRoot::Directory(dir) => {
                    let path = dir.join(&relative);
                    if !path.is_file() {
                        continue;
                    }
                    let bytes = fs::read(&path).map_err(|source| ClassPathError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    trace!(class = internal_name, origin = %path.display(), "class found");
                    return Ok(Some(ClassBytes {
                        bytes,
                        origin: path,
                    }));
                }
                ClassPathRoot::Archive(archive) => {
                    if let Some(found) = archive.read(&relative)? {
                        trace!(class = internal_name, origin = %found.origin.display(), "class found");
                        return Ok(Some(found));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Whether any root has the package directory or a class below it.
    pub fn package_exists(&self, package: &str) -> bool {
        self.roots.iter().any(|root| match root {
            ClassPathRoot::Directory(dir) => package.is_empty() || dir.join(package).is_dir(),
            ClassPathRoot::Archive(archive) => archive.has_package(package),
        })
    }

    /// Binary simple names (`Map`, `Map$Entry`) of the classes in `package`,
    /// deduplicated in classpath order.
    pub fn list_classes(&self, package: &str) -> Result<Vec<String>, ClassPathError> {
        let mut names = IndexSet::new();
        for root in &self.roots {
            match root {
                ClassPathRoot::Directory(dir) => {
                    let package_dir = dir.join(package);
                    if !package_dir.is_dir() {
                        continue;
                    }
                    for class in class_files_in(&package_dir)? {
                        names.insert(class);
                    }
                }
                ClassPathRoot::Archive(archive) => {
                    if let Some(classes) = archive.packages.get(package) {
                        names.extend(classes.iter().cloned());
                    }
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Packages strictly below `package` (any depth) that hold class files.
    pub fn list_packages_under(&self, package: &str) -> Result<Vec<String>, ClassPathError> {
        let mut found = IndexSet::new();
        for root in &self.roots {
            match root {
                ClassPathRoot::Directory(dir) => {
                    let start = dir.join(package);
                    if !start.is_dir() {
                        continue;
                    }
                    let mut pending = vec![start];
                    while let Some(current) = pending.pop() {
                        let entries = fs::read_dir(&current).map_err(|source| ClassPathError::Io {
                            path: current.clone(),
                            source,
                        })?;
                        for entry in entries {
                            let entry = entry.map_err(|source| ClassPathError::Io {
                                path: current.clone(),
                                source,
                            })?;
                            let path = entry.path();
                            if !path.is_dir() {
                                continue;
                            }
                            if !class_files_in(&path)?.is_empty() {
                                if let Some(name) = internal_package_name(dir, &path) {
                                    found.insert(name);
                                }
                            }
                            pending.push(path);
                        }
                    }
                }
                ClassPathRoot::Archive(archive) => {
                    found.extend(
                        archive
                            .packages
                            .keys()
                            .filter(|candidate| is_strict_subpackage(candidate, package))
                            .cloned(),
                    );
                }
            }
        }
        let mut packages: Vec<String> = found.into_iter().collect();
        packages.sort();
        Ok(packages)
    }
}

impl ClassPathRoot {
    fn path(&self) -> &Path {
        match self {
            ClassPathRoot::Directory(path) => path,
            ClassPathRoot::Archive(archive) => &archive.path,
        }
    }
}

impl ArchiveRoot {
    fn open(path: &Path) -> Result<Self, ClassPathError> {
        let file = File::open(path).map_err(|source| ClassPathError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| ClassPathError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        let prefix = if has_extension(path, &["jmod"]) {
            "classes/"
        } else {
            ""
        };

        let mut packages: IndexMap<String, Vec<String>> = IndexMap::new();
        for name in archive.file_names() {
            let Some(relative) = name.strip_prefix(prefix) else {
                continue;
            };
            if should_skip_entry(relative) {
                continue;
            }
            let Some(class) = relative.strip_suffix(".class") else {
                continue;
            };
            let (package, simple) = class.rsplit_once('/').unwrap_or(("", class));
            packages
                .entry(package.to_string())
                .or_default()
                .push(simple.to_string());
        }

        Ok(Self {
            path: path.to_path_buf(),
            prefix,
            archive,
            packages,
        })
    }

    fn has_package(&self, package: &str) -> bool {
        self.packages.contains_key(package)
            || self
                .packages
                .keys()
                .any(|candidate| is_strict_subpackage(candidate, package))
    }

    fn read(&mut self, relative: &str) -> Result<Option<ClassBytes>, ClassPathError> {
        let (package, file) = relative.rsplit_once('/').unwrap_or(("", relative));
        let simple = file.trim_end_matches(".class");
        let listed = self
            .packages
            .get(package)
            .is_some_and(|classes| classes.iter().any(|class| class == simple));
        if !listed {
            return Ok(None);
        }

        let entry_name = format!("{}{relative}", self.prefix);
        let mut entry = match self.archive.by_name(&entry_name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(source) => {
                return Err(ClassPathError::Zip {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| ClassPathError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(ClassBytes {
            bytes,
            origin: archive_entry_path(&self.path, &entry_name),
        }))
    }
}

/// Splits raw entries on the platform path separator, dropping blanks.
pub fn expand_classpath(raw: &[String]) -> Vec<PathBuf> {
    let separator = if cfg!(windows) { ';' } else { ':' };
    raw.iter()
        .flat_map(|entry| entry.split(separator))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn class_files_in(dir: &Path) -> Result<Vec<String>, ClassPathError> {
    let entries = fs::read_dir(dir).map_err(|source| ClassPathError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut classes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ClassPathError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() || !has_extension(&path, &["class"]) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(OsStr::to_str) {
            if stem != "module-info" && stem != "package-info" {
                classes.push(stem.to_string());
            }
        }
    }
    classes.sort();
    Ok(classes)
}

fn internal_package_name(root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(root).ok()?;
    let segments: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(segments.join("/"))
}

fn is_strict_subpackage(candidate: &str, package: &str) -> bool {
    if package.is_empty() {
        return !candidate.is_empty();
    }
    candidate
        .strip_prefix(package)
        .is_some_and(|rest| rest.starts_with('/'))
}

fn is_archive(path: &Path) -> bool {
    has_extension(path, &["jar", "zip", "jmod"])
}

fn has_extension(path: &Path, values: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| values.iter().any(|value| ext.eq_ignore_ascii_case(value)))
        .unwrap_or(false)
}

fn should_skip_entry(name: &str) -> bool {
    name.starts_with("META-INF/")
        || name.ends_with("module-info.class")
        || name.ends_with("package-info.class")
}

fn archive_entry_path(archive: &Path, entry: &str) -> PathBuf {
    let mut display = archive.display().to_string();
    display.push('!');
    display.push('/');
    display.push_str(entry);
    PathBuf::from(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ClassFileBuilder;
    use std::io::Write;
    use zip::write::FileOptions;

    fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let file = File::create(path).expect("create jar");
        let mut writer = zip::ZipWriter::new(file);
        let options = FileOptions::default();
        for (name, bytes) in entries {
            writer.start_file(*name, options).expect("start entry");
            writer.write_all(bytes).expect("write entry");
        }
        writer.finish().expect("finish jar");
    }

    #[test]
    fn directory_root_is_read_live() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut classpath = ClassPath::new([dir.path().to_path_buf()]).expect("classpath");
        assert!(classpath.find_class_bytes("pack/Late").expect("lookup").is_none());

        ClassFileBuilder::new("pack/Late")
            .write_to(dir.path())
            .expect("write class");

        let found = classpath
            .find_class_bytes("pack/Late")
            .expect("lookup")
            .expect("class present");
        assert!(found.origin.ends_with("pack/Late.class"));
        assert!(classpath.package_exists("pack"));
        assert_eq!(classpath.list_classes("pack").expect("list"), vec!["Late"]);
    }

    #[test]
    fn jar_and_jmod_entries_are_indexed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let jar = dir.path().join("lib.jar");
        write_jar(
            &jar,
            &[
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
                ("lib/Util.class", ClassFileBuilder::new("lib/Util").build()),
                ("lib/deep/Node.class", ClassFileBuilder::new("lib/deep/Node").build()),
            ],
        );
        let jmod = dir.path().join("java.base.jmod");
        write_jar(
            &jmod,
            &[(
                "classes/java/lang/String.class",
                ClassFileBuilder::new("java/lang/String").build(),
            )],
        );

        let mut classpath = ClassPath::new([jar.clone(), jmod]).expect("classpath");
        assert!(classpath.find_class_bytes("lib/Util").expect("lookup").is_some());
        let string = classpath
            .find_class_bytes("java/lang/String")
            .expect("lookup")
            .expect("jmod class");
        assert!(string
            .origin
            .to_string_lossy()
            .ends_with("java.base.jmod!/classes/java/lang/String.class"));

        assert!(classpath.package_exists("lib"));
        assert!(classpath.package_exists("java"));
        assert!(!classpath.package_exists("META-INF"));
        assert_eq!(
            classpath.list_packages_under("lib").expect("packages"),
            vec!["lib/deep".to_string()]
        );
    }

    #[test]
    fn first_root_wins() {
        let first = tempfile::tempdir().expect("temp dir");
        let second = tempfile::tempdir().expect("temp dir");
        ClassFileBuilder::new("pack/Dup")
            .write_to(first.path())
            .expect("write first");
        ClassFileBuilder::interface_type("pack/Dup")
            .write_to(second.path())
            .expect("write second");

        let mut classpath = ClassPath::new([first.path().to_path_buf(), second.path().to_path_buf()])
            .expect("classpath");
        let found = classpath
            .find_class_bytes("pack/Dup")
            .expect("lookup")
            .expect("class");
        assert!(found.origin.starts_with(first.path()));
    }

    #[test]
    fn closed_classpath_misses() {
        let dir = tempfile::tempdir().expect("temp dir");
        ClassFileBuilder::new("pack/A")
            .write_to(dir.path())
            .expect("write class");
        let mut classpath = ClassPath::new([dir.path().to_path_buf()]).expect("classpath");
        classpath.close();

        assert!(classpath.is_closed());
        assert!(classpath.find_class_bytes("pack/A").expect("lookup").is_none());
        assert!(!classpath.package_exists("pack"));
        classpath.append_root(dir.path()).expect("append after close");
        assert_eq!(classpath.roots().count(), 0);
    }

    #[test]
    fn missing_archive_is_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let classpath = ClassPath::new([dir.path().join("absent.jar")]).expect("classpath");
        assert_eq!(classpath.roots().count(), 0);
    }

    #[test]
    fn expand_classpath_splits_entries() {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let raw = vec![format!("a{separator}b"), " ".to_string(), "c".to_string()];
        assert_eq!(
            expand_classpath(&raw),
            vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]
        );
    }
}
