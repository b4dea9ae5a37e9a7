use metatemplate_cli::{Config, Settings, build_cmd, index_cmd, parse_assignment, preview_cmd};
use metatemplate_compiler::{CompileOptions, ComponentOptions, CssStrategy, FormatId, Language};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CARD_HTML: &str = r#"<div class="card {{ isOpen?: card--open }}"><mt-variable key="children">Body</mt-variable></div>"#;
const CARD_CSS: &str = ".card { color: red; }\n";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

fn settings(out_dir: &Path, formats: &[FormatId]) -> Settings {
    Settings {
        formats: formats.to_vec(),
        out_dir: out_dir.to_path_buf(),
        compile: CompileOptions::default(),
    }
}

#[test_log::test]
fn build_writes_every_format_and_indexes() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(src.path(), "card.html", CARD_HTML);
    write(src.path(), "card.css", CARD_CSS);

    build_cmd(&[src.path().to_path_buf()], &settings(out.path(), &FormatId::ALL)).unwrap();

    for relative in [
        "mustache/card.mustache",
        "twig-embed/card.twig",
        "react-ts-styled-components/card.tsx",
        "react-ts-styled-components/index.tsx",
        "react-ts/card.tsx",
        "react-ts/index.tsx",
        "react-ts/indexNotLazy.tsx",
        "react-js/card.js",
        "react-js/index.js",
        "css/card.css",
    ] {
        assert!(out.path().join(relative).is_file(), "missing {relative}");
    }

    let mustache = fs::read_to_string(out.path().join("mustache/card.mustache")).unwrap();
    assert!(mustache.contains(r#"<div class="card{{#isOpen}} card--open{{/isOpen}}">{{{children}}}</div>"#));

    let lazy = fs::read_to_string(out.path().join("react-ts/index.tsx")).unwrap();
    assert!(lazy.contains("export const Card = () => import(\"./card\");\n"));
    assert_eq!(fs::read_to_string(out.path().join("css/card.css")).unwrap(), CARD_CSS);
}

#[test_log::test]
fn failed_template_does_not_stop_the_others() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(src.path(), "broken.html", "<mt-if>x</mt-if>");
    write(src.path(), "card.html", CARD_HTML);

    let err = build_cmd(&[src.path().to_path_buf()], &settings(out.path(), &[FormatId::Mustache])).unwrap_err();

    assert_eq!(err.to_string(), "1 of 2 template(s) failed to compile");
    assert!(out.path().join("mustache/card.mustache").is_file());
    assert!(!out.path().join("mustache/broken.mustache").exists());
}

#[test_log::test]
fn index_picks_up_existing_components() {
    let out = TempDir::new().unwrap();
    let dir = out.path().join("react-js");
    fs::create_dir_all(&dir).unwrap();
    write(&dir, "flex-container.js", "");
    write(&dir, "Button.js", "");
    write(&dir, "index.js", "stale");
    write(&dir, "notes.txt", "");

    index_cmd(out.path(), &[FormatId::ReactJs, FormatId::Mustache], &CompileOptions::default()).unwrap();

    let eager = fs::read_to_string(dir.join("indexNotLazy.js")).unwrap();
    assert!(eager.contains("export { default as button } from \"./Button\";\n"));
    assert!(eager.contains("export { default as flexContainer } from \"./flex-container\";\n"));
    assert!(!eager.contains("notes"));
    let lazy = fs::read_to_string(dir.join("index.js")).unwrap();
    assert!(!lazy.contains("stale"));
    assert!(!out.path().join("mustache").exists());
}

#[test]
fn config_file_is_read() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "metatemplate.toml",
        r#"
formats = ["mustache", "react-js"]
out_dir = "dist"

[react]
language = "javascript"
css = "none"
"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(
        config,
        Config {
            formats: vec!["mustache".into(), "react-js".into()],
            out_dir: Some(PathBuf::from("dist")),
            react: Some(ComponentOptions {
                language: Language::JavaScript,
                css: CssStrategy::None,
            }),
        }
    );
}

#[test]
fn config_rejects_unknown_keys_and_missing_files() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "metatemplate.toml", "colour = true\n");
    assert!(Config::load(Some(&path)).is_err());
    assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn flags_override_config() {
    let config = Config {
        formats: vec!["mustache".into()],
        out_dir: Some(PathBuf::from("dist")),
        react: None,
    };

    let from_config = Settings::resolve(&config, &[], None).unwrap();
    assert_eq!(from_config.formats, vec![FormatId::Mustache]);
    assert_eq!(from_config.out_dir, PathBuf::from("dist"));

    let from_flags = Settings::resolve(&config, &["react-ts".into(), "react-ts".into()], Some(Path::new("out"))).unwrap();
    assert_eq!(from_flags.formats, vec![FormatId::ReactTs]);
    assert_eq!(from_flags.out_dir, PathBuf::from("out"));

    let defaults = Settings::resolve(&Config::default(), &[], None).unwrap();
    assert_eq!(defaults.formats, FormatId::ALL.to_vec());
    assert!(Settings::resolve(&config, &["jinja".into()], None).is_err());
}

#[test]
fn preview_applies_assignments() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "card.html", CARD_HTML);
    let values_file = write(dir.path(), "values.json", r#"{"children": "From file", "isOpen": "true"}"#);

    let html = preview_cmd(
        &input,
        Some(&values_file),
        &[parse_assignment("children=Hello").unwrap()],
    )
    .unwrap();
    assert_eq!(html, r#"<div class="card card--open">Hello</div>"#);
}

#[test]
fn assignments_need_a_key() {
    assert_eq!(
        parse_assignment("level=error=1").unwrap(),
        ("level".to_string(), "error=1".to_string())
    );
    assert_eq!(parse_assignment("empty=").unwrap(), ("empty".to_string(), String::new()));
    assert!(parse_assignment("=x").is_err());
    assert!(parse_assignment("novalue").is_err());
}
