use crate::cli::GenArgs;
use crate::config::ProjectConfig;
use crate::write::{WriteOptions, apply_generated_files};
use anyhow::Context as _;
use sqlgen::ExecContext;
use sqlgen::context::{FILE_ENV, PACKAGE_ENV};

pub fn run(args: GenArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(args.config.clone())?;
    let ctx = resolve_context(&args, |key| std::env::var(key).ok())?;

    let generated = sqlgen::run(project.gen_config(), &ctx, project.output_suffix())
        .with_context(|| format!("gen failed for {}", ctx.file.display()))?;

    let summary = apply_generated_files(
        &[generated],
        WriteOptions {
            dry_run: args.dry_run,
            check: args.check,
        },
    )?;
    tracing::debug!(
        target: "sqlgen",
        config = ?project.config_path,
        changed = summary.changed.len(),
        written = summary.written.len(),
        "gen finished"
    );

    Ok(())
}

/// Command-line values win over the environment.
fn resolve_context(
    args: &GenArgs,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ExecContext> {
    let ctx = ExecContext::from_lookup(|key| match key {
        PACKAGE_ENV => args.package.clone().or_else(|| env(key)),
        FILE_ENV => args
            .file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| env(key)),
        _ => env(key),
    })?;
    Ok(ctx)
}
