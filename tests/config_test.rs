use std::fs;

use calypso::config::Settings;
use tempfile::TempDir;

#[test]
fn test_load_config_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("calypso.toml");

    let calypso_toml = r#"
[server]
host = "127.0.0.1"
port = 3000

[llm]
model = "gemini-2.5-pro"
temperature = 0.2

[limits]
max_turns = 8
max_refinements = 3
"#;
    fs::write(&path, calypso_toml)?;

    let settings = Settings::from_file(&path)?;
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.llm.model, "gemini-2.5-pro");
    assert_eq!(settings.llm.temperature, Some(0.2));
    assert_eq!(settings.limits.max_turns, 8);
    assert_eq!(settings.limits.max_refinements, 3);
    // Sections absent from the file keep their defaults
    assert_eq!(settings.limits.phase2_results, 15);
    assert_eq!(settings.amadeus.api_key_env, "AMADEUS_API_KEY");
    Ok(())
}

#[test]
fn test_missing_config_file_uses_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("does-not-exist.toml");

    let settings = Settings::from_file(&path)?;
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8081);
    assert_eq!(settings.llm.api_key_env, "GEMINI_API_KEY");
    Ok(())
}
