//! Pipeline entry points.

use crate::config::GenConfig;
use crate::context::ExecContext;
use crate::decl::ScannedPackage;
use crate::directive::Directives;
use crate::emit::render_file;
use crate::error::{GenError, GenResult};
use crate::model::build_models;
use crate::query::build_queries;
use crate::scan::scan_package;
use crate::sql::{Operation, package_operations};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Rendered output and where it belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Run the generator for the file named by `ctx`.
///
/// Scans the file's directory, checks it is the package `ctx` names, and
/// renders the output for `<stem><suffix>`. Nothing is written.
pub fn run(config: &GenConfig, ctx: &ExecContext, suffix: &str) -> GenResult<GeneratedFile> {
    if !ctx.file.is_file() {
        return Err(GenError::environment(format!(
            "source file {} does not exist",
            ctx.file.display()
        )));
    }
    let package = scan_package(ctx.package_dir(), &config.annotations.attribute)?;
    ctx.check_package(&package.name)?;

    let content = generate(config, &package, &ctx.file_name())?;
    Ok(GeneratedFile {
        path: ctx.output_path(suffix),
        content,
    })
}

/// Render the data-access code for a scanned package.
///
/// `source_name` only appears in the generated header.
pub fn generate(config: &GenConfig, package: &ScannedPackage, source_name: &str) -> GenResult<String> {
    let sigils = config.directives.all();
    let directives = Directives::extract(package.decls(), &sigils);

    let model_matches: Vec<_> = directives.for_sigil(&config.directives.model).collect();
    if model_matches.is_empty() {
        return Err(GenError::invalid_file(
            &package.name,
            format!("no `{}` declarations found", config.directives.model),
        ));
    }
    let models = build_models(model_matches, &config.annotations.model)?;
    let queries = build_queries(
        directives.for_sigil(&config.directives.query),
        &models,
        &config.annotations.query,
    )?;

    let ops = package_operations(&models, &queries);
    check_unique_names(&ops)?;

    tracing::debug!(
        target: "sqlgen",
        package = %package.name,
        models = models.len(),
        queries = queries.len(),
        functions = ops.len(),
        "generated package"
    );
    Ok(render_file(source_name, &models, &queries, &ops))
}

fn check_unique_names(ops: &[Operation]) -> GenResult<()> {
    let mut seen: BTreeMap<&str, &Operation> = BTreeMap::new();
    for op in ops {
        if let Some(prev) = seen.insert(&op.fn_name, op) {
            let field = op.source.field.as_deref().unwrap_or("*");
            let prev_field = prev.source.field.as_deref().unwrap_or("*");
            return Err(GenError::invalid_model(
                &op.source.decl,
                field,
                format!(
                    "function `{}` is already generated for {}.{prev_field}",
                    op.fn_name, prev.source.decl
                ),
            ));
        }
    }
    Ok(())
}
