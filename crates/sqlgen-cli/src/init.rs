use crate::cli::InitArgs;
use std::path::Path;

const TEMPLATE: &str = r#"
version = "1"

# Doc-comment prefixes that mark a struct as a model or a query:
#   /// sqlgen:model users [primary_column]
#   /// sqlgen:query User
[directives]
model = "sqlgen:model"
query = "sqlgen:query"

# Field annotations: #[sqlgen(model = "id,BIGINT", query = "id;getoneeq,id")]
# `#[derive(sqlgen_derive::Sqlgen)]` registers the `sqlgen` attribute; another
# attribute name needs its own registration in the annotated crate.
[annotations]
attribute = "sqlgen"
model = "model"
query = "query"

# Output is written beside the source file as <stem><suffix>.
[output]
suffix = "_sqlgen.rs"
"#;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)?;
    println!("wrote {}", args.config.display());
    Ok(())
}

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE.trim_start_matches('\n'))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    #[test]
    fn template_is_a_valid_default_config() {
        let file = ConfigFile::parse(TEMPLATE, |_| None).unwrap();
        assert_eq!(file.generator, sqlgen::GenConfig::default());
        assert_eq!(file.output.suffix, "_sqlgen.rs");
    }

    #[test]
    fn writes_once_and_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tools").join("sqlgen.toml");

        write_template(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("version = \"1\"\n"));

        let err = write_template(&path).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
    }
}
