use docpreview::http::mime::{FALLBACK_CONTENT_TYPE, MimeRegistry};
use std::path::Path;

#[test]
fn test_preview_registry_maps_wasm() {
    let registry = MimeRegistry::preview();
    assert_eq!(registry.lookup(".wasm"), "application/wasm");
    assert_eq!(registry.lookup("wasm"), "application/wasm");
    assert_eq!(registry.lookup_path(Path::new("pkg/module.wasm")), "application/wasm");
}

#[test]
fn test_default_registry_is_preview() {
    let registry = MimeRegistry::default();
    assert_eq!(registry.lookup(".wasm"), "application/wasm");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_override_wins_regardless_of_default() {
    let overrides = [
        (".wasm", "application/x-test-wasm"),
        (".html", "text/x-test-html"),
        (".json", "text/plain"),
    ];

    let mut registry = MimeRegistry::preview();
    for (ext, content_type) in overrides {
        registry.register(ext, content_type).unwrap();
    }

    for (ext, content_type) in overrides {
        assert_eq!(registry.lookup(ext), content_type);
    }
}

#[test]
fn test_register_overwrites_previous_entry() {
    let mut registry = MimeRegistry::with_defaults();
    registry.register(".map", "application/json").unwrap();
    registry.register(".map", "application/x-sourcemap").unwrap();
    assert_eq!(registry.lookup(".map"), "application/x-sourcemap");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_unregistered_extension_never_empty() {
    let registry = MimeRegistry::preview();
    for ext in [".zzzz", ".not-a-real-ext", ".", ""] {
        let content_type = registry.lookup(ext);
        assert!(!content_type.is_empty());
    }
    assert_eq!(registry.lookup(".zzzz"), FALLBACK_CONTENT_TYPE);
}

#[test]
fn test_uppercase_extension_uses_defaults() {
    let registry = MimeRegistry::preview();
    assert_eq!(registry.lookup(".WASM"), "application/wasm");
    assert_eq!(registry.lookup_path(Path::new("LOGO.PNG")), "image/png");
}
