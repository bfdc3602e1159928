use crate::BuildError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// One `javac -d <out> -cp <classpath> [options] <files>` run.
#[derive(Debug, Clone)]
pub struct JavacInvocation {
    javac: PathBuf,
    output_dir: Option<PathBuf>,
    classpath: Vec<PathBuf>,
    options: Vec<String>,
}

/// Result of a finished compiler process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub success: bool,
    pub error_count: usize,
    /// Combined compiler output.
    pub diagnostics: String,
}

impl JavacInvocation {
    pub fn new(javac: impl Into<PathBuf>) -> Self {
        Self {
            javac: javac.into(),
            output_dir: None,
            classpath: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn javac(&self) -> &Path {
        &self.javac
    }

    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn classpath<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.classpath = entries.into_iter().collect();
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Compiles `files`. A compiler that ran and reported errors is an
    /// unsuccessful outcome, not an `Err`.
    pub fn run(&self, files: &[PathBuf]) -> Result<CompileOutcome, BuildError> {
        if files.is_empty() {
            return Ok(CompileOutcome {
                success: true,
                error_count: 0,
                diagnostics: String::new(),
            });
        }

        let mut cmd = Command::new(&self.javac);
        if let Some(output_dir) = &self.output_dir {
            fs::create_dir_all(output_dir)?;
            cmd.arg("-d").arg(output_dir);
        }
        if !self.classpath.is_empty() {
            let joined = std::env::join_paths(&self.classpath)
                .map_err(|error| BuildError::ConfigError(error.to_string()))?;
            cmd.arg("-cp").arg(joined);
        }
        cmd.args(&self.options);
        cmd.args(files);

        debug!(
            javac = %self.javac.display(),
            files = files.len(),
            classpath = self.classpath.len(),
            "running javac"
        );

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| BuildError::CliSpawnError {
                command: self.javac.display().to_string(),
                source,
            })?;

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));

        let reported = parse_error_count(&diagnostics);
        let success = output.status.success() && reported.unwrap_or(0) == 0;
        let error_count = match reported {
            Some(count) => count,
            None if success => 0,
            None => 1,
        };

        if success {
            debug!(javac = %self.javac.display(), "javac finished");
        } else {
            warn!(
                javac = %self.javac.display(),
                status = ?output.status.code(),
                error_count,
                "javac reported errors"
            );
        }

        Ok(CompileOutcome {
            success,
            error_count,
            diagnostics,
        })
    }

    /// `javac -version` output, e.g. `javac 21.0.2`.
    pub fn version(&self) -> Result<String, BuildError> {
        let output = Command::new(&self.javac)
            .arg("-version")
            .output()
            .map_err(|_| BuildError::JdkNotFound("javac command not found".to_string()))?;

        if !output.status.success() {
            return Err(BuildError::JdkNotFound("javac not available".to_string()));
        }
        // Old compilers print the version on stderr.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            stdout.into_owned()
        };
        Ok(text.trim().to_string())
    }
}

/// Count from javac's trailing `N error`/`N errors` line.
fn parse_error_count(output: &str) -> Option<usize> {
    output.lines().rev().find_map(|line| {
        let mut words = line.split_whitespace();
        let count = words.next()?.parse::<usize>().ok()?;
        match (words.next(), words.next()) {
            (Some("error" | "errors"), None) => Some(count),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A.java:1: error: ';' expected\n1 error\n", Some(1); "single")]
    #[test_case("x\ny\n12 errors\n3 warnings\n", Some(12); "with warnings after")]
    #[test_case("Note: uses unchecked operations\n", None; "no count")]
    #[test_case("2 errors found in total\n", None; "not the summary line")]
    fn error_count_parsing(output: &str, expected: Option<usize>) {
        assert_eq!(parse_error_count(output), expected);
    }

    #[test]
    fn no_files_is_a_successful_noop() {
        let outcome = JavacInvocation::new("/definitely/not/javac")
            .run(&[])
            .expect("noop");
        assert!(outcome.success);
        assert_eq!(outcome.error_count, 0);
    }

    #[test]
    fn missing_compiler_is_a_spawn_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = JavacInvocation::new(dir.path().join("javac"))
            .output_dir(dir.path().join("out"))
            .run(&[dir.path().join("A.java")])
            .expect_err("spawn should fail");
        assert!(matches!(error, BuildError::CliSpawnError { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_compiler_without_count_reports_one_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let script = dir.path().join("javac");
        fs::write(&script, "#!/bin/sh\necho 'boom' 1>&2\nexit 2\n").expect("write script");
        let mut permissions = fs::metadata(&script).expect("metadata").permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&script, permissions).expect("set permissions");

        let outcome = JavacInvocation::new(&script)
            .output_dir(dir.path().join("out"))
            .classpath([dir.path().join("lib")])
            .run(&[dir.path().join("A.java")])
            .expect("compiler ran");
        assert!(!outcome.success);
        assert_eq!(outcome.error_count, 1);
        assert!(outcome.diagnostics.contains("boom"));
        assert!(dir.path().join("out").is_dir());
    }
}
