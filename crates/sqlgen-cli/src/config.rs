use serde::Deserialize;
use sqlgen::config::{DEFAULT_OUTPUT_SUFFIX, GenConfig};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "sqlgen.toml";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// `None` when running on defaults without a config file.
    pub config_path: Option<PathBuf>,
    pub file: ConfigFile,
}

impl ProjectConfig {
    /// Load `path`, which must exist, or `sqlgen.toml` when it exists.
    pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => PathBuf::from(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!(target: "sqlgen", "no {DEFAULT_CONFIG_FILE}; using defaults");
                return Ok(Self {
                    config_path: None,
                    file: ConfigFile::default(),
                });
            }
        };

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;
        let file = ConfigFile::parse(&raw, |key| std::env::var(key).ok()).map_err(|e| {
            anyhow::anyhow!("invalid config file {}: {e:#}", config_path.display())
        })?;

        tracing::debug!(target: "sqlgen", path = %config_path.display(), "loaded config");
        Ok(Self {
            config_path: Some(config_path),
            file,
        })
    }

    pub fn gen_config(&self) -> &GenConfig {
        &self.file.generator
    }

    pub fn output_suffix(&self) -> &str {
        &self.file.output.suffix
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    /// `[directives]` and `[annotations]`.
    #[serde(flatten)]
    pub generator: GenConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            generator: GenConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl ConfigFile {
    /// Parse, expand `${VAR}` references through `lookup`, and validate.
    pub fn parse(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env(&lookup)?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let g = &mut self.generator;
        for v in [
            &mut g.directives.model,
            &mut g.directives.query,
            &mut g.annotations.attribute,
            &mut g.annotations.model,
            &mut g.annotations.query,
            &mut self.output.suffix,
        ] {
            *v = expand_env_vars(v, lookup)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        self.generator.validate().map_err(anyhow::Error::msg)?;

        let suffix = &self.output.suffix;
        if !suffix.ends_with(".rs") || suffix.contains(['/', '\\']) {
            anyhow::bail!("output.suffix must be a file name suffix ending in .rs: {suffix:?}");
        }
        if suffix == ".rs" {
            anyhow::bail!("output.suffix must not be just \".rs\"; it would overwrite the source");
        }
        Ok(())
    }
}

fn expand_env_vars(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            anyhow::bail!("unterminated env var reference: ${{{after}");
        };
        let key = &after[..end];
        if key.is_empty() {
            anyhow::bail!("invalid env var reference: ${{}}");
        }
        let v = lookup(key)
            .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
        out.push_str(&v);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
