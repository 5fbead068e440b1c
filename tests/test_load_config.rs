use std::fs::write;
use tempfile::NamedTempFile;

use wiki_mirror::load_config::load_config;

#[test]
fn load_config_parses_roots_and_keywords() {
    let config_yaml = r#"
sync:
  roots:
    - page_id: "2191300228"
      folder_name: "01. Business audit"
    - page_id: "469843465"
      folder_name: "99. FAQ"
  excluded_title_keywords:
    - "2023"
    - "2024"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.roots.len(), 2);
    assert_eq!(config.roots[0].page_id, "2191300228");
    assert_eq!(config.roots[0].folder_name, "01. Business audit");
    assert_eq!(config.roots[1].folder_name, "99. FAQ");
    assert_eq!(config.excluded_title_keywords, vec!["2023", "2024"]);
}

#[test]
fn load_config_defaults_keywords_to_empty() {
    let config_yaml = r#"
sync:
  roots:
    - page_id: "R1"
      folder_name: "Docs"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");
    assert!(config.excluded_title_keywords.is_empty());
}

#[test]
fn load_config_errors_for_missing_file() {
    let err = load_config("/definitely/not/a/config.yaml").unwrap_err();
    assert!(err.to_string().contains("read config file"));
}

#[test]
fn load_config_errors_for_invalid_yaml() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn load_config_rejects_empty_root_list() {
    let config_yaml = r#"
sync:
  roots: []
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("at least one root"));
}
