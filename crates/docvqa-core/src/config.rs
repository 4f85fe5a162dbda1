use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use url::Url;

use crate::error::{DocvqaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorProvider {
    #[default]
    Llm,
    DocumentAi,
}

impl ExtractorProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorProvider::Llm => "llm",
            ExtractorProvider::DocumentAi => "document_ai",
        }
    }
}

impl fmt::Display for ExtractorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProvider {
    #[default]
    LocalJson,
    Neo4j,
}

impl StorageProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageProvider::LocalJson => "local_json",
            StorageProvider::Neo4j => "neo4j",
        }
    }
}

impl fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAiConfig {
    pub project_id: String,
    pub location: String,
    pub processor_id: String,
    /// OAuth bearer token sent with every process call.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Overrides `https://{location}-documentai.googleapis.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub provider: ExtractorProvider,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default, alias = "documentAI")]
    pub document_ai: Option<DocumentAiConfig>,
}

impl ExtractorConfig {
    pub fn llm_config(&self) -> Result<&LlmConfig> {
        self.llm.as_ref().ok_or_else(|| {
            DocvqaError::Config(
                "LLM extractor selected but 'llm' configuration is missing".to_string(),
            )
        })
    }

    pub fn document_ai_config(&self) -> Result<&DocumentAiConfig> {
        self.document_ai.as_ref().ok_or_else(|| {
            DocvqaError::Config(
                "Document AI extractor selected but 'document_ai' configuration is missing"
                    .to_string(),
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalJsonConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for LocalJsonConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Recorded on the run node so several pipelines can share one database.
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    #[serde(default)]
    pub local_json: Option<LocalJsonConfig>,
    #[serde(default)]
    pub neo4j: Option<Neo4jConfig>,
}

impl StorageConfig {
    /// The local JSON section, falling back to defaults when it was omitted.
    pub fn local_json_config(&self) -> LocalJsonConfig {
        self.local_json.clone().unwrap_or_default()
    }

    pub fn neo4j_config(&self) -> Result<&Neo4jConfig> {
        self.neo4j.as_ref().ok_or_else(|| {
            DocvqaError::Config(
                "Neo4j storage selected but 'neo4j' configuration is missing".to_string(),
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Level name understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_seconds")]
    pub retry_backoff_seconds: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_seconds: default_retry_backoff_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_timeout_seconds() -> f64 {
    60.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("artifacts/results")
}

fn default_collection() -> String {
    "docvqa_runs".to_string()
}

fn default_batch_size() -> usize {
    20
}

fn default_concurrency() -> usize {
    1
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_seconds() -> f64 {
    2.0
}

// ── Layered loading ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum EnvValue {
    Text,
    Lower,
    Upper,
    Integer,
    Float,
    Path,
}

/// Environment variables and the config path each one overrides.
const ENV_OVERRIDES: &[(&str, &[&str], EnvValue)] = &[
    ("DOCVQA_DATASET_PATH", &["dataset", "path"], EnvValue::Path),
    ("DOCVQA_DATASET_LIMIT", &["dataset", "limit"], EnvValue::Integer),
    ("DOCVQA_EXTRACTOR_PROVIDER", &["extractor", "provider"], EnvValue::Lower),
    ("DOCVQA_LLM_PROVIDER", &["extractor", "llm", "provider"], EnvValue::Text),
    ("DOCVQA_LLM_API_BASE", &["extractor", "llm", "api_base"], EnvValue::Text),
    ("DOCVQA_LLM_API_KEY", &["extractor", "llm", "api_key"], EnvValue::Text),
    ("DOCVQA_LLM_MODEL", &["extractor", "llm", "model"], EnvValue::Text),
    ("DOCVQA_LLM_TEMPERATURE", &["extractor", "llm", "temperature"], EnvValue::Float),
    (
        "DOCVQA_LLM_MAX_OUTPUT_TOKENS",
        &["extractor", "llm", "max_output_tokens"],
        EnvValue::Integer,
    ),
    (
        "DOCVQA_LLM_TIMEOUT_SECONDS",
        &["extractor", "llm", "timeout_seconds"],
        EnvValue::Float,
    ),
    (
        "DOCVQA_DOCUMENT_AI_PROJECT_ID",
        &["extractor", "document_ai", "project_id"],
        EnvValue::Text,
    ),
    (
        "DOCVQA_DOCUMENT_AI_LOCATION",
        &["extractor", "document_ai", "location"],
        EnvValue::Text,
    ),
    (
        "DOCVQA_DOCUMENT_AI_PROCESSOR_ID",
        &["extractor", "document_ai", "processor_id"],
        EnvValue::Text,
    ),
    (
        "DOCVQA_DOCUMENT_AI_ACCESS_TOKEN",
        &["extractor", "document_ai", "access_token"],
        EnvValue::Text,
    ),
    (
        "DOCVQA_DOCUMENT_AI_ENDPOINT",
        &["extractor", "document_ai", "endpoint"],
        EnvValue::Text,
    ),
    (
        "DOCVQA_DOCUMENT_AI_TIMEOUT_SECONDS",
        &["extractor", "document_ai", "timeout_seconds"],
        EnvValue::Float,
    ),
    ("DOCVQA_STORAGE_PROVIDER", &["storage", "provider"], EnvValue::Lower),
    ("DOCVQA_NEO4J_URI", &["storage", "neo4j", "uri"], EnvValue::Text),
    ("DOCVQA_NEO4J_USER", &["storage", "neo4j", "user"], EnvValue::Text),
    ("DOCVQA_NEO4J_PASSWORD", &["storage", "neo4j", "password"], EnvValue::Text),
    ("DOCVQA_NEO4J_COLLECTION", &["storage", "neo4j", "collection"], EnvValue::Text),
    ("DOCVQA_NEO4J_BATCH_SIZE", &["storage", "neo4j", "batch_size"], EnvValue::Integer),
    (
        "DOCVQA_LOCAL_JSON_OUTPUT_DIR",
        &["storage", "local_json", "output_dir"],
        EnvValue::Path,
    ),
    ("DOCVQA_PIPELINE_CONCURRENCY", &["pipeline", "concurrency"], EnvValue::Integer),
    (
        "DOCVQA_PIPELINE_RETRY_ATTEMPTS",
        &["pipeline", "retry_attempts"],
        EnvValue::Integer,
    ),
    (
        "DOCVQA_PIPELINE_RETRY_BACKOFF_SECONDS",
        &["pipeline", "retry_backoff_seconds"],
        EnvValue::Float,
    ),
    ("DOCVQA_LOG_LEVEL", &["logging", "level"], EnvValue::Upper),
];

/// Values supplied on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dataset_path: Option<PathBuf>,
    pub limit: Option<usize>,
    pub extractor_provider: Option<ExtractorProvider>,
    pub storage_provider: Option<StorageProvider>,
}

impl ConfigOverrides {
    pub fn apply(&self, root: &mut Value) -> Result<()> {
        if let Some(path) = &self.dataset_path {
            set_path(
                root,
                &["dataset", "path"],
                Value::String(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(limit) = self.limit {
            set_path(root, &["dataset", "limit"], Value::Number((limit as u64).into()));
        }
        if let Some(provider) = self.extractor_provider {
            set_path(root, &["extractor", "provider"], Value::String(provider.as_str().into()));
        }
        if let Some(provider) = self.storage_provider {
            set_path(root, &["storage", "provider"], Value::String(provider.as_str().into()));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Resolve configuration from `.env`, an optional YAML/JSON file,
    /// `DOCVQA_*` environment variables and command-line overrides, in that
    /// order of increasing precedence.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut root = match path {
            Some(path) => read_config_file(path)?,
            None => Value::Mapping(Mapping::new()),
        };
        apply_env_overrides(&mut root, |key| std::env::var(key).ok())?;
        overrides.apply(&mut root)?;

        let config = Self::from_value(root)?;
        tracing::debug!(
            extractor = %config.extractor.provider,
            storage = %config.storage.provider,
            concurrency = config.pipeline.concurrency,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_value(root: Value) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_value(root)
            .map_err(|e| DocvqaError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_value(parse_root(yaml)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset.limit == Some(0) {
            return Err(invalid("dataset.limit must be at least 1"));
        }

        match self.extractor.provider {
            ExtractorProvider::Llm => {
                let llm = self.extractor.llm_config()?;
                Url::parse(&llm.api_base).map_err(|e| {
                    invalid(&format!("extractor.llm.api_base is not a valid URL: {e}"))
                })?;
                if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
                    return Err(invalid("extractor.llm.temperature must be within 0.0..=2.0"));
                }
                if llm.max_output_tokens == 0 {
                    return Err(invalid("extractor.llm.max_output_tokens must be positive"));
                }
                check_seconds("extractor.llm.timeout_seconds", llm.timeout_seconds, 0.0, MAX_TIMEOUT_SECONDS)?;
            }
            ExtractorProvider::DocumentAi => {
                let document_ai = self.extractor.document_ai_config()?;
                if let Some(endpoint) = &document_ai.endpoint {
                    Url::parse(endpoint).map_err(|e| {
                        invalid(&format!("extractor.document_ai.endpoint is not a valid URL: {e}"))
                    })?;
                }
                check_seconds(
                    "extractor.document_ai.timeout_seconds",
                    document_ai.timeout_seconds,
                    0.0,
                    MAX_TIMEOUT_SECONDS,
                )?;
            }
        }

        if self.storage.provider == StorageProvider::Neo4j {
            let neo4j = self.storage.neo4j_config()?;
            if !(1..=500).contains(&neo4j.batch_size) {
                return Err(invalid("storage.neo4j.batch_size must be within 1..=500"));
            }
        }

        if !(1..=16).contains(&self.pipeline.concurrency) {
            return Err(invalid("pipeline.concurrency must be within 1..=16"));
        }
        if self.pipeline.retry_attempts > 5 {
            return Err(invalid("pipeline.retry_attempts must be at most 5"));
        }
        let backoff = self.pipeline.retry_backoff_seconds;
        if !backoff.is_finite() || !(0.1..=MAX_BACKOFF_SECONDS).contains(&backoff) {
            return Err(invalid(&format!(
                "pipeline.retry_backoff_seconds must be within 0.1..={MAX_BACKOFF_SECONDS}"
            )));
        }

        Ok(())
    }
}

const MAX_TIMEOUT_SECONDS: f64 = 3600.0;
const MAX_BACKOFF_SECONDS: f64 = 600.0;

/// Durations must be finite, above `min` and at most `max`.
fn check_seconds(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value > min && value <= max {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be within ({min}, {max}] seconds, got {value}")))
    }
}

fn invalid(message: &str) -> DocvqaError {
    DocvqaError::Config(message.to_string())
}

fn read_config_file(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(DocvqaError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    let raw = std::fs::read_to_string(path)?;
    parse_root(&raw)
}

fn parse_root(raw: &str) -> Result<Value> {
    let root: Value = serde_yaml::from_str(raw)
        .map_err(|e| DocvqaError::Config(format!("Failed to parse configuration: {e}")))?;
    match root {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        Value::Mapping(_) => Ok(root),
        _ => Err(invalid(
            "Configuration file must define a mapping at the top level",
        )),
    }
}

/// Merge `DOCVQA_*` variables into `root`. Unset and empty variables are
/// ignored.
pub fn apply_env_overrides<F>(root: &mut Value, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(var).filter(|v| !v.is_empty()) else {
            continue;
        };
        let value = convert_env_value(var, &raw, *kind)?;
        set_path(root, path, value);
    }
    Ok(())
}

fn convert_env_value(var: &str, raw: &str, kind: EnvValue) -> Result<Value> {
    let value = match kind {
        EnvValue::Text => Value::String(raw.to_string()),
        EnvValue::Lower => Value::String(raw.to_lowercase()),
        EnvValue::Upper => Value::String(raw.to_uppercase()),
        EnvValue::Integer => {
            let parsed: i64 = raw.trim().parse().map_err(|_| {
                DocvqaError::Config(format!("{var} must be an integer, got {raw:?}"))
            })?;
            Value::Number(parsed.into())
        }
        EnvValue::Float => {
            let parsed: f64 = raw.trim().parse().map_err(|_| {
                DocvqaError::Config(format!("{var} must be a number, got {raw:?}"))
            })?;
            Value::Number(parsed.into())
        }
        EnvValue::Path => Value::String(expand_home(raw).to_string_lossy().into_owned()),
    };
    Ok(value)
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(raw)
}

fn set_path(root: &mut Value, path: &[&str], value: Value) {
    let mut cursor = root;
    for key in path {
        if !cursor.is_mapping() {
            *cursor = Value::Mapping(Mapping::new());
        }
        cursor = &mut cursor[*key];
    }
    *cursor = value;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const BASE_YAML: &str = r#"
dataset:
  path: assets/samples
extractor:
  provider: llm
  llm:
    api_base: https://example.com/v1/chat/completions
    api_key: test-key
    model: gpt-test
storage:
  provider: local_json
"#;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_yaml_str(BASE_YAML).unwrap();

        assert_eq!(config.dataset.path, PathBuf::from("assets/samples"));
        assert_eq!(config.dataset.limit, None);
        assert_eq!(config.extractor.provider, ExtractorProvider::Llm);
        let llm = config.extractor.llm_config().unwrap();
        assert_eq!(llm.provider, "openai");
        assert_eq!(llm.max_output_tokens, 1024);
        assert_eq!(config.storage.provider, StorageProvider::LocalJson);
        assert_eq!(
            config.storage.local_json_config().output_dir,
            PathBuf::from("artifacts/results")
        );
        assert_eq!(config.pipeline.concurrency, 1);
        assert_eq!(config.pipeline.retry_attempts, 3);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_env_override_wins_over_file() {
        let mut root = parse_root(BASE_YAML).unwrap();
        apply_env_overrides(
            &mut root,
            lookup_from(&[
                ("DOCVQA_DATASET_LIMIT", "5"),
                ("DOCVQA_PIPELINE_CONCURRENCY", "4"),
                ("DOCVQA_LOG_LEVEL", "debug"),
                ("DOCVQA_LLM_MODEL", ""),
            ]),
        )
        .unwrap();
        let config = AppConfig::from_value(root).unwrap();

        assert_eq!(config.dataset.limit, Some(5));
        assert_eq!(config.pipeline.concurrency, 4);
        assert_eq!(config.logging.level, LogLevel::Debug);
        // Empty values are ignored.
        assert_eq!(config.extractor.llm_config().unwrap().model, "gpt-test");
    }

    #[test]
    fn test_cli_override_wins_over_env() {
        let mut root = parse_root(BASE_YAML).unwrap();
        apply_env_overrides(&mut root, lookup_from(&[("DOCVQA_DATASET_LIMIT", "5")])).unwrap();
        let overrides = ConfigOverrides {
            dataset_path: Some(PathBuf::from("/data/docvqa")),
            limit: Some(2),
            ..Default::default()
        };
        overrides.apply(&mut root).unwrap();
        let config = AppConfig::from_value(root).unwrap();

        assert_eq!(config.dataset.limit, Some(2));
        assert_eq!(config.dataset.path, PathBuf::from("/data/docvqa"));
    }

    #[test]
    fn test_env_builds_missing_sections() {
        let mut root = Value::Mapping(Mapping::new());
        apply_env_overrides(
            &mut root,
            lookup_from(&[
                ("DOCVQA_DATASET_PATH", "/tmp/docs"),
                ("DOCVQA_EXTRACTOR_PROVIDER", "DOCUMENT_AI"),
                ("DOCVQA_DOCUMENT_AI_PROJECT_ID", "proj"),
                ("DOCVQA_DOCUMENT_AI_LOCATION", "us"),
                ("DOCVQA_DOCUMENT_AI_PROCESSOR_ID", "abc123"),
            ]),
        )
        .unwrap();
        let config = AppConfig::from_value(root).unwrap();

        assert_eq!(config.extractor.provider, ExtractorProvider::DocumentAi);
        let document_ai = config.extractor.document_ai_config().unwrap();
        assert_eq!(document_ai.project_id, "proj");
        assert_eq!(document_ai.timeout_seconds, 60.0);
    }

    #[test]
    fn test_invalid_integer_env_rejected() {
        let mut root = parse_root(BASE_YAML).unwrap();
        let err = apply_env_overrides(
            &mut root,
            lookup_from(&[("DOCVQA_DATASET_LIMIT", "many")]),
        )
        .unwrap_err();
        assert!(matches!(err, DocvqaError::Config(_)));
    }

    #[test]
    fn test_missing_provider_section_rejected() {
        let yaml = r#"
dataset:
  path: assets
extractor:
  provider: document_ai
"#;
        let err = AppConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("document_ai"));
    }

    #[test]
    fn test_neo4j_requires_section() {
        let yaml = format!("{BASE_YAML}\n  neo4j: null\n");
        let mut root = parse_root(&yaml).unwrap();
        set_path(&mut root, &["storage", "provider"], Value::String("neo4j".into()));
        let err = AppConfig::from_value(root).unwrap_err();
        assert!(err.to_string().contains("neo4j"));
    }

    #[test]
    fn test_document_ai_alias_accepted() {
        let yaml = r#"
dataset:
  path: assets
extractor:
  provider: document_ai
  documentAI:
    project_id: proj
    location: eu
    processor_id: p1
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.extractor.document_ai_config().unwrap().location, "eu");
    }

    #[test]
    fn test_concurrency_bounds_enforced() {
        let mut root = parse_root(BASE_YAML).unwrap();
        set_path(&mut root, &["pipeline", "concurrency"], Value::Number(17.into()));
        assert!(AppConfig::from_value(root).is_err());

        let mut root = parse_root(BASE_YAML).unwrap();
        set_path(&mut root, &["pipeline", "concurrency"], Value::Number(0.into()));
        assert!(AppConfig::from_value(root).is_err());
    }

    #[test]
    fn test_retry_bounds_enforced() {
        let mut root = parse_root(BASE_YAML).unwrap();
        set_path(&mut root, &["pipeline", "retry_backoff_seconds"], Value::Number(0.05.into()));
        assert!(AppConfig::from_value(root).is_err());
    }

    #[test]
    fn test_non_finite_durations_rejected() {
        for (key, value) in [
            ("retry_backoff_seconds", ".inf"),
            ("retry_backoff_seconds", ".nan"),
            ("retry_backoff_seconds", "1e12"),
        ] {
            let yaml = format!("{BASE_YAML}pipeline:\n  {key}: {value}\n");
            assert!(AppConfig::from_yaml_str(&yaml).is_err(), "{key}: {value} accepted");
        }

        for value in [".nan", ".inf", "-.inf"] {
            let yaml = BASE_YAML.replace("model: gpt-test", &format!("model: gpt-test\n    timeout_seconds: {value}"));
            assert!(AppConfig::from_yaml_str(&yaml).is_err(), "timeout {value} accepted");
        }

        let yaml = BASE_YAML.replace("model: gpt-test", "model: gpt-test\n    temperature: .nan");
        assert!(AppConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_non_finite_env_floats_rejected() {
        for (var, value) in [
            ("DOCVQA_PIPELINE_RETRY_BACKOFF_SECONDS", "inf"),
            ("DOCVQA_LLM_TIMEOUT_SECONDS", "NaN"),
        ] {
            let mut root = parse_root(BASE_YAML).unwrap();
            apply_env_overrides(&mut root, lookup_from(&[(var, value)])).unwrap();
            assert!(AppConfig::from_value(root).is_err(), "{var}={value} accepted");
        }
    }

    #[test]
    fn test_non_mapping_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();

        let err = AppConfig::load(Some(&path), &ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(
            Some(&dir.path().join("absent.yaml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_log_level_filter_names() {
        assert_eq!(LogLevel::Warning.as_filter(), "warn");
        assert_eq!(LogLevel::Debug.as_filter(), "debug");
    }
}
