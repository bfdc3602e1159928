use super::context::SessionContext;
use super::index::{fingerprint, CompiledSymbol};
use crate::JavacError;
use jv_build::metadata::{parse_class, ClassInfo};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

/// Puts `output_dir` on the classpath and enters every classfile below it
/// that is new or changed. Returns how many classes were entered.
pub(crate) fn synchronize_output(ctx: &SessionContext, output_dir: &Path) -> Result<usize, JavacError> {
    ctx.classpath.borrow_mut().append_root(output_dir)?;
    ctx.index.borrow_mut().missing.clear();
    if !output_dir.is_dir() {
        debug!(output = %output_dir.display(), "no compiler output to synchronize");
        return Ok(0);
    }

    let mut files = Vec::new();
    collect_class_files(output_dir, &mut files)?;

    let mut entered = 0;
    for file in files {
        let Some(internal_name) = internal_name_of(output_dir, &file) else {
            continue;
        };
        let bytes = fs::read(&file).map_err(|source| JavacError::Io {
            path: file.clone(),
            source,
        })?;
        let hash = fingerprint(&bytes);

        let mut index = ctx.index.borrow_mut();
        let unchanged = index
            .compiled_by_internal
            .get(&internal_name)
            .is_some_and(|symbol| symbol.fingerprint == hash);
        if unchanged {
            trace!(class = %internal_name, "classfile unchanged");
            continue;
        }
        if index.remove_compiled(&internal_name).is_some() {
            debug!(class = %internal_name, "dropping stale compiled class");
        }

        let info = match parse_class(&bytes) {
            Ok(info) => info,
            Err(error) => {
                warn!(file = %file.display(), %error, "unreadable classfile in output; using empty modifiers");
                ClassInfo::degraded(internal_name.as_str())
            }
        };
        index.insert_compiled(Rc::new(CompiledSymbol::new(info, file, &bytes)));
        entered += 1;
    }

    info!(output = %output_dir.display(), entered, "synchronized compiler output");
    Ok(entered)
}

/// `out/pack/A$B.class` to `pack/A$B`; descriptors of modules and packages are skipped.
fn internal_name_of(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let internal_name = segments.join("/");
    let simple_name = segments.last()?;
    if *simple_name == "module-info" || *simple_name == "package-info" {
        return None;
    }
    Some(internal_name)
}

fn collect_class_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), JavacError> {
    let io_error = |source| JavacError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()
        .map_err(io_error)?;
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_class_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "class") {
            files.push(path);
        }
    }
    Ok(())
}
