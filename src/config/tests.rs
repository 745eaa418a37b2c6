#![cfg(test)]

use crate::config::config::{Config, ConfigError};
use crate::pipeline::PipelineError;

const DEMO_CONFIG: &str = include_str!("../../config/promptflow.toml");

/// Parse a TOML string into a `Config` and run the project's validation logic.
fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let cfg: Config = toml::from_str(toml_str).expect("TOML parse error");
    cfg.validate()?;
    Ok(cfg)
}

#[test]
fn test_basic_config() {
    let toml = r#"
        [app]
        id = "config-test"
        log_level = "debug"

        [backend]
        base_url = "http://127.0.0.1:11434"
        model = "llama3.2"

        [pipelines.bio]
        inputs = ["name"]

        [[pipelines.bio.steps]]
        template = "Tell me about celebrity {name}"
        output_key = "person"
    "#;

    let config = load_config_from_str(toml).expect("config should parse and validate");

    assert_eq!(config.app.id, "config-test");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.backend.model, "llama3.2");
    assert_eq!(config.retrieval.chunk_size, 800);
    assert!(!config.logging.log_to_file);

    let pipeline = config.build_pipeline("bio").unwrap();
    assert_eq!(pipeline.declared_inputs(), &["name".to_string()]);
    assert_eq!(pipeline.declared_outputs(), &["person".to_string()]);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = load_config_from_str("").expect("defaults are valid");
    assert_eq!(config.app.id, "promptflow");
    assert_eq!(config.backend.base_url, "http://localhost:11434");
    assert!(config.pipelines.is_empty());
}

#[test]
fn test_demo_config_builds_every_pipeline() {
    let config = load_config_from_str(DEMO_CONFIG).expect("demo config is valid");
    let pipelines = config.build_pipelines().unwrap();

    assert_eq!(
        pipelines.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["biography", "celebrity", "documenter", "story"]
    );

    let story = &pipelines["story"];
    assert_eq!(story.steps().len(), 2);
    assert_eq!(story.steps()[0].options().temperature, Some(0.7));

    let bio = &pipelines["biography"];
    assert_eq!(bio.steps()[0].inputs(), &["name".to_string()]);
    assert_eq!(
        bio.steps()[0].template().partials().get("tone").map(String::as_str),
        Some("informative")
    );

    let celebrity = &pipelines["celebrity"];
    assert_eq!(celebrity.steps().len(), 4);
    assert_eq!(
        celebrity.memory_keys(),
        vec!["chat_history", "description_history", "best_memory"]
    );
    assert_eq!(celebrity.declared_outputs().len(), 4);
}

#[test]
fn test_pipeline_with_forward_reference_fails_validation() {
    let toml = r#"
        [pipelines.broken]
        inputs = ["name"]

        [[pipelines.broken.steps]]
        template = "Tell me about {name}"
        output_key = "person"

        [[pipelines.broken.steps]]
        template = "Summarise {missing_var}"
        inputs = ["missing_var"]
        output_key = "summary"
    "#;

    match load_config_from_str(toml) {
        Err(ConfigError::Pipeline { name, source }) => {
            assert_eq!(name, "broken");
            assert!(matches!(source, PipelineError::TemplateMismatch { .. }));
        }
        other => panic!("expected pipeline error, got {other:?}"),
    }
}

#[test]
fn test_multi_output_step_with_separator() {
    let toml = r#"
        [pipelines.doc]
        inputs = ["code"]

        [[pipelines.doc.steps]]
        template = "Explain, then write a docstring, separated by ---:\n{code}"
        output_keys = ["explanation", "docstring"]
        separator = "---"
    "#;
    let config = load_config_from_str(toml).unwrap();
    let pipeline = config.build_pipeline("doc").unwrap();
    assert_eq!(
        pipeline.declared_outputs(),
        &["explanation".to_string(), "docstring".to_string()]
    );
}

#[test]
fn test_invalid_sections() {
    let err = load_config_from_str("[app]\nid = \"  \"\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidAppId));

    let err = load_config_from_str("[retrieval]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRetrieval(_)));

    let err = load_config_from_str("[backend]\nbase_url = \"\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBackend(_)));
}

#[test]
fn test_unknown_pipeline() {
    let config = load_config_from_str("").unwrap();
    assert!(matches!(
        config.build_pipeline("nope"),
        Err(ConfigError::UnknownPipeline(name)) if name == "nope"
    ));
}

#[test]
fn test_from_file_reports_path() {
    let err = Config::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.toml"));
}

#[test]
fn test_from_file_reads_temp_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("promptflow.toml");
    std::fs::write(&path, DEMO_CONFIG).unwrap();

    let config = Config::from_file(&path).expect("loads from disk");
    assert_eq!(config.app.id, "promptflow-demo");
}
