use super::*;
use crate::backend::{BackendError, ScriptedBackend};
use crate::template::TemplateError;
use std::sync::Arc;

/// Helper to build the celebrity search pipeline (name -> person -> dob -> description)
fn celebrity_pipeline() -> Pipeline {
    Pipeline::builder("celebrity")
        .input("name")
        .step(
            Step::builder("Tell me about celebrity {name}")
                .output_key("person")
                .memory_key("chat_history")
                .build()
                .unwrap(),
        )
        .step(
            Step::builder("When was {person} born?")
                .output_key("dob")
                .memory_key("chat_history")
                .build()
                .unwrap(),
        )
        .step(
            Step::builder("Mention 5 major events that happened around {dob} in the world")
                .output_key("description")
                .memory_key("description_history")
                .build()
                .unwrap(),
        )
        .outputs(["person", "dob", "description"])
        .build()
        .unwrap()
}

fn executor_with(backend: Arc<ScriptedBackend>) -> PipelineExecutor {
    PipelineExecutor::new(backend)
}

#[test]
fn test_step_inputs_default_to_placeholders() {
    let step = Step::new("Write a story about {topic} in {genre}", "story_text").unwrap();
    assert_eq!(step.inputs(), &["topic".to_string(), "genre".to_string()]);
    assert_eq!(step.name(), "story_text");
    assert_eq!(step.output_keys(), &["story_text".to_string()]);
}

#[test]
fn test_step_declared_inputs_must_match_template() {
    let err = Step::builder("When was {person} born?")
        .inputs(["person", "extra"])
        .output_key("dob")
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::TemplateMismatch { ref step, .. } if step == "dob"));

    let err = Step::builder("Explain {language} code: {code}")
        .inputs(["code"])
        .output_key("explanation")
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::TemplateMismatch { .. }));
    assert!(err.is_construction_error());
}

#[test]
fn test_step_rejects_malformed_template() {
    let err = Step::new("Tell me about {name", "person").unwrap_err();
    assert_eq!(
        err,
        PipelineError::InvalidTemplate {
            step: "person".to_string(),
            source: TemplateError::UnclosedPlaceholder(14),
        }
    );
}

#[test]
fn test_step_partial_removes_input() {
    let step = Step::builder("Biography of {name} in this {tone} way.")
        .partial("tone", "informative")
        .inputs(["name"])
        .output_key("person")
        .build()
        .unwrap();
    assert_eq!(step.inputs(), &["name".to_string()]);
}

#[test]
fn test_multi_output_needs_parser() {
    let err = Step::builder("Explain and document {code}")
        .output_keys(["explanation", "docstring"])
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidStep { .. }));

    let step = Step::builder("Explain and document {code}")
        .output_keys(["explanation", "docstring"])
        .parser(OutputParser::Delimited("---".to_string()))
        .build();
    assert!(step.is_ok());
}

#[test]
fn test_step_rejects_duplicate_output_keys() {
    let err = Step::builder("x {a}")
        .output_keys(["b", "b"])
        .parser(OutputParser::Delimited("|".to_string()))
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateBinding { step: Some(_), ref variable } if variable == "b"));
}

#[test]
fn test_forward_reference_is_template_mismatch() {
    let err = Pipeline::builder("forward")
        .input("name")
        .step(Step::new("When was {person} born?", "dob").unwrap())
        .step(Step::new("Tell me about {name}", "person").unwrap())
        .build()
        .unwrap_err();
    match err {
        PipelineError::TemplateMismatch { step, detail } => {
            assert_eq!(step, "dob");
            assert!(detail.contains("later step"), "detail: {}", detail);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_self_reference_is_rejected() {
    let err = Pipeline::builder("loop")
        .input("seed")
        .step(Step::new("Continue {story}", "story").unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(err, PipelineError::TemplateMismatch { .. }));
}

#[test]
fn test_output_rebinding_input_is_duplicate() {
    let err = Pipeline::builder("rebind")
        .input("topic")
        .step(Step::new("Rephrase {topic}", "topic").unwrap())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::DuplicateBinding {
            step: Some("topic".to_string()),
            variable: "topic".to_string(),
        }
    );
}

#[test]
fn test_duplicate_declared_inputs() {
    let err = Pipeline::builder("dup")
        .inputs(["name", "name"])
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::DuplicateBinding {
            step: None,
            variable: "name".to_string(),
        }
    );
}

#[test]
fn test_undeclared_output() {
    let err = Pipeline::builder("empty")
        .input("name")
        .output("person")
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::UndeclaredOutput {
            variable: "person".to_string()
        }
    );
}

#[test]
fn test_default_outputs_are_step_outputs() {
    let pipeline = Pipeline::builder("story")
        .inputs(["topic", "genre"])
        .step(Step::new("Write a story about {topic} in {genre}", "story_text").unwrap())
        .step(Step::new("Titles for: {story_text}", "titles").unwrap())
        .build()
        .unwrap();
    assert_eq!(
        pipeline.declared_outputs(),
        &["story_text".to_string(), "titles".to_string()]
    );
    assert_eq!(pipeline.description(), "Unnamed pipeline");
}

#[test]
fn test_memory_keys_listed_once() {
    let pipeline = celebrity_pipeline();
    assert_eq!(pipeline.memory_keys(), vec!["chat_history", "description_history"]);
}

#[tokio::test]
async fn test_memory_transcripts_recorded() {
    let backend = Arc::new(ScriptedBackend::with_replies(["BIO", "1815", "EVENTS"]));
    let executor = executor_with(backend.clone());
    let pipeline = celebrity_pipeline();

    let out = executor
        .run(&pipeline, Bindings::new().with("name", "Ada Lovelace"))
        .await
        .unwrap();

    let chat = out.transcript("chat_history");
    assert_eq!(chat.len(), 2);
    assert_eq!(chat[0].prompt, "Tell me about celebrity Ada Lovelace");
    assert_eq!(chat[0].response, "BIO");
    assert_eq!(chat[1].prompt, "When was BIO born?");
    assert_eq!(out.transcript("description_history")[0].response, "EVENTS");

    // The executor keeps the last run's transcripts for later queries
    assert_eq!(executor.transcript("chat_history"), chat.to_vec());
}

#[tokio::test]
async fn test_failed_run_clears_previous_transcripts() {
    let backend = Arc::new(ScriptedBackend::with_replies(["BIO", "1815", "EVENTS"]));
    let executor = executor_with(backend.clone());
    let pipeline = celebrity_pipeline();

    executor
        .run(&pipeline, Bindings::new().with("name", "Ada"))
        .await
        .unwrap();

    backend.push_error(BackendError::new(Some(500), "boom"));
    let err = executor
        .run(&pipeline, Bindings::new().with("name", "Grace"))
        .await
        .unwrap_err();
    assert!(err.is_backend_error());
    assert!(executor.transcript("chat_history").is_empty());
    assert!(executor.transcript("description_history").is_empty());
}

#[tokio::test]
async fn test_step_options_reach_backend() {
    let backend = Arc::new(ScriptedBackend::constant("ok"));
    let executor = executor_with(backend.clone());
    let pipeline = Pipeline::builder("story")
        .input("topic")
        .step(
            Step::builder("Story about {topic}")
                .output_key("story")
                .temperature(0.7)
                .stop("THE END")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    executor
        .run(&pipeline, Bindings::new().with("topic", "robots"))
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].options.temperature, Some(0.7));
    assert_eq!(calls[0].options.stop, vec!["THE END".to_string()]);
}

#[tokio::test]
async fn test_delimited_output_binds_fields() {
    let backend = Arc::new(ScriptedBackend::with_replies(["An adder.\n---\n\"\"\"Add a and b.\"\"\""]));
    let executor = executor_with(backend);
    let pipeline = Pipeline::builder("documenter")
        .inputs(["language", "code"])
        .step(
            Step::builder("Explain and document this {language} code:\n{code}")
                .name("document")
                .output_keys(["explanation", "docstring"])
                .parser(OutputParser::Delimited("---".to_string()))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let out = executor
        .run(
            &pipeline,
            Bindings::new()
                .with("language", "Python")
                .with("code", "def add(a, b):\n    return a + b"),
        )
        .await
        .unwrap();
    assert_eq!(out.get("explanation"), Some("An adder."));
    assert_eq!(out.get("docstring"), Some("\"\"\"Add a and b.\"\"\""));
}

#[tokio::test]
async fn test_delimited_output_wrong_field_count() {
    let backend = Arc::new(ScriptedBackend::with_replies(["no separator here"]));
    let executor = executor_with(backend);
    let pipeline = Pipeline::builder("documenter")
        .input("code")
        .step(
            Step::builder("Document {code}")
                .name("document")
                .output_keys(["explanation", "docstring"])
                .parser(OutputParser::Delimited("---".to_string()))
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let err = executor
        .run(&pipeline, Bindings::new().with("code", "x = 1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::OutputParse {
            step: "document".to_string(),
            expected: 2,
            found: 1,
        }
    );
}

#[tokio::test]
async fn test_unexpected_input_is_binding_mismatch() {
    let backend = Arc::new(ScriptedBackend::constant("ok"));
    let executor = executor_with(backend.clone());
    let pipeline = celebrity_pipeline();

    let err = executor
        .run(
            &pipeline,
            Bindings::new().with("name", "Ada").with("tone", "witty"),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::BindingMismatch {
            missing: vec![],
            unexpected: vec!["tone".to_string()],
            duplicated: vec![],
        }
    );
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_empty_pipeline_returns_filtered_inputs() {
    let backend = Arc::new(ScriptedBackend::new());
    let executor = executor_with(backend.clone());
    let pipeline = Pipeline::builder("noop")
        .inputs(["a", "b"])
        .output("b")
        .build()
        .unwrap();

    let out = executor
        .run(&pipeline, Bindings::new().with("a", "1").with("b", "2"))
        .await
        .unwrap();
    assert_eq!(out.outputs, Bindings::new().with("b", "2"));
    assert!(out.transcripts.is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_whitespace_prompt_passes_through() {
    let backend = Arc::new(ScriptedBackend::constant("ok"));
    let executor = executor_with(backend.clone());
    let pipeline = Pipeline::builder("blank")
        .input("pad")
        .step(Step::new("{pad}", "out").unwrap())
        .build()
        .unwrap();

    executor
        .run(&pipeline, Bindings::new().with("pad", "   "))
        .await
        .unwrap();
    assert_eq!(backend.prompts(), vec!["   ".to_string()]);
}
