//! Config save/load roundtrip integration tests.

use parley_core::config::{Config, LogFormat};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parley.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.gateway.port, config.gateway.port);
    assert_eq!(loaded.provider.model, config.provider.model);
    assert_eq!(loaded.context.max_tokens, config.context.max_tokens);
    assert_eq!(loaded.context.keep_recent, config.context.keep_recent);
    assert_eq!(loaded.summarizer.timeout_secs, config.summarizer.timeout_secs);
    assert_eq!(loaded.sessions.max_sessions, config.sessions.max_sessions);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parley.json5");

    let mut config = Config::default();
    config.gateway.port = 9090;
    config.context.max_tokens = 1500;
    config.logging.format = LogFormat::Json;
    config.persona.system_prompt = Some("You are Aliya.".to_string());
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.gateway.port, 9090);
    assert_eq!(loaded.context.max_tokens, 1500);
    assert_eq!(loaded.logging.format, LogFormat::Json);
    assert_eq!(loaded.persona_prompt().unwrap().as_deref(), Some("You are Aliya."));
}

#[test]
fn test_handwritten_json5_with_persona_file() {
    let dir = TempDir::new().unwrap();
    let persona = dir.path().join("persona.txt");
    std::fs::write(&persona, "  You are Keir, a ship's navigator.\n").unwrap();

    let path = dir.path().join("parley.json5");
    std::fs::write(
        &path,
        format!(
            r#"{{
                // trailing commas and comments are fine
                provider: {{ model: 'deepseek-chat', timeout_secs: 30, }},
                summarizer: {{ timeout_secs: 10, language: 'English' }},
                persona: {{ system_prompt_file: {:?} }},
            }}"#,
            persona
        ),
    )
    .unwrap();

    let loaded = Config::load(&path).unwrap();
    assert!(loaded.validate().is_ok());
    assert_eq!(loaded.summarizer.language, "English");
    assert_eq!(
        loaded.persona_prompt().unwrap().as_deref(),
        Some("You are Keir, a ship's navigator.")
    );
}

#[test]
fn test_config_load_nonexistent() {
    assert!(Config::load(Path::new("/nonexistent/parley.json5")).is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
}
