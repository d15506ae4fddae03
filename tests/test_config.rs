use docpreview::config::{Config, CONFIG_ENV};
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_config_defaults_match_preview_script() {
    let cfg = Config::default();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8000");
    assert_eq!(cfg.root, PathBuf::from("www"));
    assert_eq!(cfg.index_files, vec!["index.html", "index.htm"]);
    assert!(cfg.directory_listing);
    assert!(cfg.mime_types.is_empty());
}

// Environment variables are process-wide, so every env-driven case lives in
// this one test.
#[test]
fn test_config_env_overrides() {
    unsafe {
        std::env::remove_var(CONFIG_ENV);
        std::env::remove_var("LISTEN");
        std::env::remove_var("DOC_ROOT");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:8000");
    assert_eq!(cfg.root, PathBuf::from("www"));

    unsafe {
        std::env::set_var("LISTEN", "127.0.0.1:9100");
        std::env::set_var("DOC_ROOT", "build/html");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:9100");
    assert_eq!(cfg.root, PathBuf::from("build/html"));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "listen_addr: 127.0.0.1:7000\ndirectory_listing: false").unwrap();
    unsafe {
        std::env::set_var(CONFIG_ENV, file.path());
        std::env::remove_var("LISTEN");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.listen_addr, "127.0.0.1:7000");
    assert!(!cfg.directory_listing);
    // env still wins over the file
    assert_eq!(cfg.root, PathBuf::from("build/html"));

    unsafe {
        std::env::set_var(CONFIG_ENV, "/nonexistent/docpreview.yaml");
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var(CONFIG_ENV);
        std::env::remove_var("DOC_ROOT");
    }
}

#[test]
fn test_config_yaml_partial_keeps_defaults() {
    let cfg = Config::from_yaml("root: site\n").unwrap();
    assert_eq!(cfg.root, PathBuf::from("site"));
    assert_eq!(cfg.listen_addr, "127.0.0.1:8000");
}

#[test]
fn test_config_yaml_rejects_unknown_types() {
    assert!(Config::from_yaml("directory_listing: maybe\n").is_err());
}

#[test]
fn test_config_mime_types_are_registered_after_wasm() {
    let cfg = Config::from_yaml(
        "mime_types:\n  .data: application/x-emscripten-data\n  wasm: application/x-custom-wasm\n",
    )
    .unwrap();

    let registry = cfg.mime_registry().unwrap();
    assert_eq!(registry.lookup(".data"), "application/x-emscripten-data");
    assert_eq!(registry.lookup(".wasm"), "application/x-custom-wasm");
}

#[test]
fn test_config_empty_mime_type_is_rejected() {
    let cfg = Config::from_yaml("mime_types:\n  .data: \"\"\n").unwrap();
    assert!(cfg.mime_registry().is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
    assert_eq!(cfg1.root, cfg2.root);
}
