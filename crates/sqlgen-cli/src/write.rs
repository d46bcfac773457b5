use sqlgen::GeneratedFile;
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    pub dry_run: bool,
    pub check: bool,
}

#[derive(Debug, Default)]
pub struct WriteSummary {
    pub changed: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
}

/// Write files whose content differs from what is on disk.
///
/// `dry_run` only reports; `check` fails when anything would change.
pub fn apply_generated_files(
    files: &[GeneratedFile],
    opts: WriteOptions,
) -> anyhow::Result<WriteSummary> {
    let mut summary = WriteSummary::default();

    let changed: Vec<&GeneratedFile> = files
        .iter()
        .filter(|f| std::fs::read_to_string(&f.path).ok().as_deref() != Some(f.content.as_str()))
        .collect();
    summary.changed = changed.iter().map(|f| f.path.clone()).collect();

    if opts.dry_run {
        for p in &summary.changed {
            println!("would write {}", p.display());
        }
        return Ok(summary);
    }

    if opts.check {
        if !summary.changed.is_empty() {
            let list = summary
                .changed
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::bail!("generated files are out of date: {list}");
        }
        return Ok(summary);
    }

    for f in changed {
        write_atomic(&f.path, &f.content)?;
        tracing::debug!(target: "sqlgen", path = %f.path.display(), bytes = f.content.len(), "wrote output");
        println!("wrote {}", f.path.display());
        summary.written.push(f.path.clone());
    }

    Ok(summary)
}

/// Write through a temp file in the target directory, then rename over `path`.
fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| anyhow::anyhow!("failed to create temp file in {}: {e}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("failed to replace {}: {}", path.display(), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file(path: PathBuf, content: &str) -> GeneratedFile {
        GeneratedFile {
            path,
            content: content.to_string(),
        }
    }

    const WRITE: WriteOptions = WriteOptions {
        dry_run: false,
        check: false,
    };

    #[test]
    fn writes_only_changed_files() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a_sqlgen.rs");
        let b = tmp.path().join("b_sqlgen.rs");
        fs::write(&b, "same").unwrap();

        let summary =
            apply_generated_files(&[file(a.clone(), "new"), file(b.clone(), "same")], WRITE).unwrap();
        assert_eq!(summary.changed, vec![a.clone()]);
        assert_eq!(summary.written, vec![a.clone()]);
        assert_eq!(fs::read_to_string(&a).unwrap(), "new");

        let again = apply_generated_files(&[file(a.clone(), "new")], WRITE).unwrap();
        assert!(again.written.is_empty());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a_sqlgen.rs");

        let summary = apply_generated_files(
            &[file(a.clone(), "new")],
            WriteOptions {
                dry_run: true,
                check: false,
            },
        )
        .unwrap();
        assert_eq!(summary.changed, vec![a.clone()]);
        assert!(summary.written.is_empty());
        assert!(!a.exists());
    }

    #[test]
    fn check_fails_on_stale_output() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a_sqlgen.rs");
        fs::write(&a, "old").unwrap();
        let check = WriteOptions {
            dry_run: false,
            check: true,
        };

        let err = apply_generated_files(&[file(a.clone(), "new")], check).unwrap_err();
        assert!(err.to_string().contains("out of date"));
        assert_eq!(fs::read_to_string(&a).unwrap(), "old");

        assert!(apply_generated_files(&[file(a.clone(), "old")], check).is_ok());
    }
}
