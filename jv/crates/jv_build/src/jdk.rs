use crate::BuildError;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const HOME_VARIABLES: [&str; 2] = ["JAVA_HOME", "JDK_HOME"];

/// A located JDK installation.
#[derive(Debug, Clone)]
pub struct JdkInfo {
    pub javac_path: PathBuf,
    pub java_home: PathBuf,
    pub major_version: u32,
    /// `<home>/jmods`, absent on runtime images without platform modules.
    pub jmods_dir: Option<PathBuf>,
}

/// Finds a JDK through `JAVA_HOME`/`JDK_HOME`, `PATH`, then well-known
/// installation roots.
pub fn discover_jdk() -> Result<JdkInfo, BuildError> {
    let javac = javac_from_environment()
        .or_else(|| which::which(javac_executable()).ok())
        .or_else(javac_from_install_roots)
        .ok_or_else(|| {
            BuildError::JdkNotFound("no javac on JAVA_HOME, PATH or the usual install roots".into())
        })?;
    jdk_from_javac(&javac)
}

/// Describes the JDK owning an explicit `javac` executable.
pub fn jdk_from_javac(javac_path: &Path) -> Result<JdkInfo, BuildError> {
    let java_home = javac_path
        .parent()
        .filter(|bin| bin.join(java_executable()).is_file())
        .and_then(Path::parent)
        .ok_or_else(|| {
            BuildError::JdkNotFound(format!("{} is not inside a JDK bin directory", javac_path.display()))
        })?
        .to_path_buf();

    let major_version = probe_major_version(&java_home)?;
    let jmods_dir = Some(java_home.join("jmods")).filter(|dir| dir.is_dir());
    info!(
        javac = %javac_path.display(),
        java_home = %java_home.display(),
        major_version,
        has_jmods = jmods_dir.is_some(),
        "discovered JDK"
    );

    Ok(JdkInfo {
        javac_path: javac_path.to_path_buf(),
        java_home,
        major_version,
        jmods_dir,
    })
}

fn javac_from_environment() -> Option<PathBuf> {
    HOME_VARIABLES.iter().find_map(|variable| {
        let home = PathBuf::from(env::var_os(variable)?);
        let javac = javac_in_home(&home)?;
        debug!(variable, javac = %javac.display(), "javac from environment");
        Some(javac)
    })
}

fn javac_in_home(home: &Path) -> Option<PathBuf> {
    Some(home.join("bin").join(javac_executable())).filter(|javac| javac.is_file())
}

/// Each root is either a JDK home or a directory of JDK homes.
fn javac_from_install_roots() -> Option<PathBuf> {
    install_roots().into_iter().find_map(|root| {
        if !root.is_dir() {
            return None;
        }
        javac_in_home(&root).or_else(|| {
            let mut homes: Vec<PathBuf> = fs::read_dir(&root)
                .ok()?
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            homes.sort();
            homes.into_iter().find_map(|home| {
                // macOS bundles keep the home under Contents/Home.
                javac_in_home(&home.join("Contents").join("Home")).or_else(|| javac_in_home(&home))
            })
        })
    })
}

fn install_roots() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    if cfg!(target_os = "windows") {
        for variable in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(dir) = env::var_os(variable).map(PathBuf::from) {
                roots.extend(["Java", "Eclipse Adoptium", "Zulu", "Microsoft"].map(|vendor| dir.join(vendor)));
            }
        }
    } else if cfg!(target_os = "macos") {
        roots.extend(
            ["/Library/Java/JavaVirtualMachines", "/opt/homebrew/opt/openjdk", "/usr/local/opt/openjdk"]
                .map(PathBuf::from),
        );
    } else {
        roots.extend(["/usr/lib/jvm", "/usr/java", "/opt/java", "/opt/jdk"].map(PathBuf::from));
    }
    roots
}

fn probe_major_version(java_home: &Path) -> Result<u32, BuildError> {
    let java = java_home.join("bin").join(java_executable());
    let output = Command::new(&java)
        .arg("-version")
        .output()
        .map_err(|source| BuildError::CliSpawnError {
            command: java.display().to_string(),
            source,
        })?;
    // `java -version` writes to stderr.
    let text = [output.stderr, output.stdout]
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    major_version_of(&text).ok_or_else(|| {
        BuildError::JdkVersionParse(text.lines().next().unwrap_or_default().to_string())
    })
}

/// Major version from `java -version` output: `"1.8.0_362"` is 8, `"21.0.2"` is 21.
fn major_version_of(output: &str) -> Option<u32> {
    let quoted = output.split('"').nth(1)?;
    let significant = quoted.strip_prefix("1.").unwrap_or(quoted);
    let digits: String = significant.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn javac_executable() -> &'static str {
    if cfg!(windows) {
        "javac.exe"
    } else {
        "javac"
    }
}

fn java_executable() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}
