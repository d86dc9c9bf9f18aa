use std::collections::HashMap;

use libhttp::config::{Config, ReaderConfig};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.reader.read_buffer_size, 4096);
    assert_eq!(cfg.reader, ReaderConfig::default());
    assert!(cfg.static_files.is_none());
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml(
        r#"
server:
  listen_addr: "0.0.0.0:3000"
reader:
  max_body_size: 16
static_files:
  root: ./public
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.reader.max_body_size, 16);
    assert_eq!(cfg.reader.read_buffer_size, 4096);
    let static_files = cfg.static_files.unwrap();
    assert_eq!(static_files.root.to_str(), Some("./public"));
    assert_eq!(static_files.index, "index.html");
}

#[test]
fn test_config_partial_yaml_uses_defaults() {
    let cfg = Config::from_yaml("reader:\n  read_buffer_size: 512\n").unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.reader.read_buffer_size, 512);
}

#[test]
fn test_config_rejects_bad_yaml() {
    assert!(Config::from_yaml("reader: [1, 2").is_err());
    assert!(Config::from_yaml("reader:\n  read_buffer_size: lots\n").is_err());
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_config_env_override() {
    let env = vars(&[("LISTEN", "0.0.0.0:5000")]);

    let cfg = Config::load_with(|key| env.get(key).cloned()).unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5000");
    assert_eq!(cfg.reader, ReaderConfig::default());
}

#[test]
fn test_config_without_env_uses_defaults() {
    let cfg = Config::load_with(|_| None).unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
    assert!(cfg.static_files.is_none());
}

#[test]
fn test_config_file_from_env() {
    let path = std::env::temp_dir().join(format!("libhttp-config-{}.yaml", std::process::id()));
    std::fs::write(&path, "server:\n  listen_addr: \"0.0.0.0:7000\"\nreader:\n  max_body_size: 32\n").unwrap();
    let env = vars(&[
        ("LIBHTTP_CONFIG", path.to_str().unwrap()),
        ("LISTEN", "127.0.0.1:9000"),
    ]);

    let cfg = Config::load_with(|key| env.get(key).cloned()).unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.reader.max_body_size, 32);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_config_missing_file_is_an_error() {
    let err = Config::load_with(|key| {
        (key == "LIBHTTP_CONFIG").then(|| "/nonexistent/libhttp.yaml".to_string())
    })
    .unwrap_err();

    assert!(err.to_string().contains("/nonexistent/libhttp.yaml"));
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.server.listen_addr, cfg2.server.listen_addr);
}
