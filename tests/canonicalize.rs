//! End-to-end pipeline tests
//!
//! Exercises the full Load → Validate → Resolve → Serialize run against
//! real files, using environment snapshots instead of process environment
//! mutation so runs stay deterministic.

use confnorm::{
    pipeline, EnvSnapshot, PipelineError, PipelineOptions, Schema, Source, UnknownKeyPolicy,
};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_source(content: &str, suffix: &str) -> (NamedTempFile, Source) {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    let source = Source::Path(file.path().to_path_buf());
    (file, source)
}

fn run_text(
    source: &Source,
    env: &EnvSnapshot,
    opts: &PipelineOptions,
) -> Result<String, PipelineError> {
    pipeline::run_to_output(source, &Schema::builtin(), env, opts).map(|o| o.text)
}

#[test]
fn test_region_retries_scenario() {
    // region comes from the REGION variable, retries falls back to its
    // default of 3.
    let (_file, source) = write_source(
        "service = \"checkout\"\nregion = \"${REGION}\"\n",
        ".toml",
    );
    let env = EnvSnapshot::from_pairs([("REGION", "us-east-1")]);

    let text = run_text(&source, &env, &PipelineOptions::default()).unwrap();

    assert!(text.contains("\"region\":\"us-east-1\""));
    assert!(text.contains("\"retries\":3"));
}

#[test]
fn test_missing_region_fails_validation_and_writes_nothing() {
    let (_file, source) = write_source("service = \"checkout\"\n", ".toml");
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("out.json");

    let err = pipeline::run(
        &source,
        &confnorm::OutputTarget::Path(out_path.clone()),
        &Schema::builtin(),
        &EnvSnapshot::default(),
        &PipelineOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), 30);
    assert!(err.to_string().contains("region"));
    assert!(!out_path.exists());
}

#[test]
fn test_wrong_kind_reports_expected_and_actual() {
    let (_file, source) = write_source(
        "service = \"checkout\"\nregion = \"r\"\nretries = \"lots\"\n",
        ".toml",
    );

    let err = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Validation(_)));
    let msg = err.to_string();
    assert!(msg.contains("retries"));
    assert!(msg.contains("expected number"));
    assert!(msg.contains("got string"));
}

#[test]
fn test_output_is_idempotent_under_reprocessing() {
    let (_file, source) = write_source(
        "service = \"checkout\"\nregion = \"${REGION}\"\ndebug = true\nendpoints = [\"https://a\"]\n",
        ".toml",
    );
    let env = EnvSnapshot::from_pairs([("REGION", "eu-central-1")]);

    let first = run_text(&source, &env, &PipelineOptions::default()).unwrap();

    // Feed the canonical output back through the whole pipeline.
    let (_file2, canonical_source) = write_source(&first, ".json");
    let second = run_text(&canonical_source, &env, &PipelineOptions::default()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_resolution_is_deterministic_across_runs() {
    let content = "service = \"checkout\"\nregion = \"${REGION}\"\nlog_level = \"${LOG_LEVEL}\"\n";
    let env = EnvSnapshot::from_pairs([("REGION", "us-west-2"), ("LOG_LEVEL", "warn")]);

    let (_a, source_a) = write_source(content, ".toml");
    let (_b, source_b) = write_source(content, ".toml");

    let first = run_text(&source_a, &env, &PipelineOptions::default()).unwrap();
    let second = run_text(&source_b, &env, &PipelineOptions::default()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_key_order_in_input_does_not_matter() {
    let env = EnvSnapshot::default();
    let (_a, forward) = write_source("service = \"s\"\nregion = \"r\"\nretries = 7\n", ".toml");
    let (_b, reversed) = write_source("retries = 7\nregion = \"r\"\nservice = \"s\"\n", ".toml");

    assert_eq!(
        run_text(&forward, &env, &PipelineOptions::default()).unwrap(),
        run_text(&reversed, &env, &PipelineOptions::default()).unwrap()
    );
}

#[test]
fn test_json_input_accepted() {
    let (_file, source) = write_source(
        "{\"service\": \"checkout\", \"region\": \"ap-south-1\", \"limits\": {\"timeout_seconds\": 5}}",
        ".json",
    );

    let text = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap();

    assert!(text.contains("\"timeout_seconds\":5"));
    // Sibling default still fills in.
    assert!(text.contains("\"max_body_bytes\":1048576"));
}

#[test]
fn test_unknown_keys_dropped_by_default() {
    let (_file, source) = write_source(
        "service = \"s\"\nregion = \"r\"\nmystery = \"value\"\n",
        ".toml",
    );

    let text = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap();
    assert!(!text.contains("mystery"));
}

#[test]
fn test_unknown_keys_rejected_under_deny_policy() {
    let (_file, source) = write_source(
        "service = \"s\"\nregion = \"r\"\nmystery = \"value\"\n",
        ".toml",
    );
    let opts = PipelineOptions {
        unknown_keys: UnknownKeyPolicy::Deny,
        ..PipelineOptions::default()
    };

    let err = run_text(&source, &EnvSnapshot::default(), &opts).unwrap_err();

    assert_eq!(err.exit_code(), 30);
    assert!(err.to_string().contains("unknown field: mystery"));
}

#[test]
fn test_unresolved_placeholder_is_a_resolution_failure() {
    let (_file, source) = write_source(
        "service = \"s\"\nregion = \"${REGION}\"\n",
        ".toml",
    );

    let err = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Resolution(_)));
    assert_eq!(err.exit_code(), 40);
    assert!(err.to_string().contains("REGION"));
}

#[test]
fn test_missing_input_file_is_a_load_failure() {
    let source = Source::Path(PathBuf::from("/definitely/not/here.toml"));

    let err = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Load(_)));
    assert_eq!(err.exit_code(), 10);
}

#[test]
fn test_malformed_input_is_a_parse_failure() {
    let (_file, source) = write_source("{\"service\": \"s\",}", ".json");

    let err = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Parse(_)));
    assert_eq!(err.exit_code(), 20);
}

#[test]
fn test_full_document_canonical_shape() {
    let (_file, source) = write_source(
        "service = \"checkout\"\nregion = \"us-east-1\"\n",
        ".toml",
    );

    let text = run_text(&source, &EnvSnapshot::default(), &PipelineOptions::default()).unwrap();

    // Every schema field with a default materializes; keys are sorted.
    assert_eq!(
        text,
        "{\"debug\":false,\"endpoints\":[],\"limits\":{\"max_body_bytes\":1048576,\
         \"timeout_seconds\":30},\"log_level\":\"info\",\"region\":\"us-east-1\",\
         \"retries\":3,\"service\":\"checkout\"}\n"
    );
}
