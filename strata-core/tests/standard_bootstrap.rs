use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_core::host::{self, ConfigPropertySource, Environment, MapPropertySource};
use strata_core::provider::{
    APPLICATION_TEST_YAML_ORDINAL, APPLICATION_YAML_ORDINAL, DOTENV_ORDINAL,
    META_INF_PROPERTIES_ORDINAL,
};
use strata_core::{build_standard, BootstrapContext, Config, ConfigHandle, Error};

fn demo_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/basic")
}

fn isolated(dir: &Path) -> BootstrapContext {
    BootstrapContext::new(dir).with_environment(BTreeMap::new())
}

fn demo_config() -> Config {
    build_standard(&isolated(&demo_dir())).expect("demo tree builds")
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write file");
}

#[test]
fn dotenv_outranks_packaged_properties() {
    let config = demo_config();
    assert_eq!(config.get_value::<i32>("demo.mode.enabled").expect("int"), 12345);

    let value = config
        .get_config_value("demo.mode.enabled")
        .expect("lookup")
        .expect("present");
    assert_eq!(value.source_ordinal(), DOTENV_ORDINAL);
}

#[test]
fn properties_value_reads_as_int_and_string() {
    let config = demo_config();
    assert_eq!(config.get_value::<i32>("example.key1").expect("int"), 123);
    assert_eq!(config.get_value::<String>("example.key1").expect("string"), "123");

    let value = config
        .get_config_value("example.key1")
        .expect("lookup")
        .expect("present");
    assert_eq!(value.source_ordinal(), META_INF_PROPERTIES_ORDINAL);
}

#[test]
fn yaml_booleans_and_expressions_resolve() {
    let config = demo_config();
    assert!(config.get_value::<bool>("vaadin.launch-browser").expect("bool"));
    assert!(config.get_value::<bool>("yaml.here").expect("bool"));
    assert_eq!(
        config.get_value::<String>("greeting.message").expect("message"),
        "Hello, strata!"
    );
    assert_eq!(
        config.get_values::<u16>("server.ports").expect("ports"),
        vec![8080, 8443]
    );
    assert_eq!(config.get_value::<u16>("server.ports[1]").expect("port"), 8443);
}

#[test]
fn unknown_keys_are_tolerated() {
    let config = demo_config();
    let error = config.get_value::<String>("foo.bar.baz").expect_err("absent");
    assert!(matches!(error, Error::MissingKey { .. }));
    assert_eq!(config.get_raw_value("foo.bar.baz"), None);
    assert_eq!(
        config.get_optional_value::<String>("foo.bar.baz").expect("lookup"),
        None
    );
}

#[test]
fn profile_from_context_switches_values() {
    let context = isolated(&demo_dir()).with_profiles(vec!["dev".to_owned()]);
    let config = build_standard(&context).expect("build");
    assert_eq!(
        config.get_value::<String>("greeting.message").expect("message"),
        "Hello, developer!"
    );
}

#[test]
fn profile_property_can_come_from_system_properties() {
    let context = isolated(&demo_dir()).with_system_property("strata.config.profile", "dev");
    let config = build_standard(&context).expect("build");
    assert_eq!(config.profiles(), ["dev".to_owned()]);
    assert!(config.property_names().contains("greeting.target"));
    assert_eq!(
        config.get_value::<String>("greeting.target").expect("target"),
        "developer"
    );
}

#[test]
fn yaml_wins_over_yml_in_the_same_slot() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "application.yaml", "pick: yaml\n");
    write(dir.path(), "application.yml", "pick: yml\n");

    let config = build_standard(&isolated(dir.path())).expect("build");
    let value = config.get_config_value("pick").expect("lookup").expect("present");
    assert_eq!(value.value(), "yaml");
    assert_eq!(value.source_ordinal(), APPLICATION_YAML_ORDINAL);
    assert_eq!(
        config
            .sources()
            .iter()
            .filter(|source| source.ordinal() == APPLICATION_YAML_ORDINAL)
            .count(),
        1
    );
}

#[test]
fn test_profile_yaml_outranks_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "application-test.yml", "db:\n  url: test-db\n");
    write(dir.path(), "config/application.yaml", "db:\n  url: deploy-db\n");

    let context = BootstrapContext::new(dir.path())
        .with_environment(BTreeMap::from([("DB_URL".to_owned(), "env-db".to_owned())]));
    let config = build_standard(&context).expect("build");

    let value = config.get_config_value("db.url").expect("lookup").expect("present");
    assert_eq!(value.value(), "test-db");
    assert_eq!(value.source_ordinal(), APPLICATION_TEST_YAML_ORDINAL);
}

#[test]
fn dotenv_expressions_are_expanded_by_the_resolver() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "application.yaml", "greeting:\n  target: world\n");
    write(
        dir.path(),
        ".env",
        "GREETING_LINE=${greeting.target}\nQUOTED_LINE=\"hello ${greeting.target}\"\nSPACED_LINE=hello ${greeting.target}\n",
    );

    let config = build_standard(&isolated(dir.path())).expect("build");
    assert_eq!(
        config.get_raw_value("greeting.line").as_deref(),
        Some("${greeting.target}")
    );
    assert_eq!(config.get_value::<String>("greeting.line").expect("line"), "world");
    assert_eq!(config.get_value::<String>("quoted.line").expect("quoted"), "hello world");
    assert_eq!(config.get_value::<String>("spaced.line").expect("spaced"), "hello world");

    let value = config.get_config_value("greeting.line").expect("lookup").expect("present");
    assert_eq!(value.source_ordinal(), DOTENV_ORDINAL);
}

#[test]
fn malformed_file_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "application.properties", "key=value\nbroken=\\u12\n");

    let error = build_standard(&isolated(dir.path())).expect_err("bad escape");
    assert!(matches!(error, Error::SourceLoadError { .. }));
    assert!(error.is_fatal());
}

#[test]
fn cyclic_references_fail_without_hanging() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "application.properties",
        "a.key=${b.key}\nb.key=${a.key}\nok=fine\n",
    );

    let config = build_standard(&isolated(dir.path())).expect("build");
    let error = config.get_value::<String>("a.key").expect_err("cycle");
    assert_eq!(error.to_string(), "circular expression: a.key -> b.key -> a.key");
    // the failure does not poison other lookups
    assert_eq!(config.get_value::<String>("ok").expect("ok"), "fine");
}

#[test]
fn extended_converters_are_registered() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "application.properties",
        "app.locale=ru-RU\napp.charset=utf-8\napp.date-format=dd.MM.yyyy\n",
    );

    let config = build_standard(&isolated(dir.path())).expect("build");
    let locale = config
        .get_value::<strata_core::convert::Locale>("app.locale")
        .expect("locale");
    assert_eq!(locale.to_language_tag(), "ru-RU");
    assert_eq!(
        config
            .get_value::<strata_core::convert::Charset>("app.charset")
            .expect("charset"),
        strata_core::convert::Charset::Utf8
    );
    let pattern = config
        .get_value::<strata_core::convert::DateTimePattern>("app.date-format")
        .expect("pattern");
    assert_eq!(pattern.strftime(), "%d.%m.%Y");
}

#[test]
fn host_environment_sees_expanded_values_at_lowest_precedence() {
    let config = Arc::new(demo_config());
    let mut environment = Environment::new();
    environment.add_first(Arc::new(MapPropertySource::new(
        "applicationConfig",
        BTreeMap::from([("example.key1".to_owned(), "host".to_owned())]),
    )));

    assert!(host::register(&mut environment, Arc::clone(&config)));
    assert!(!host::register(&mut environment, config));
    assert_eq!(
        environment.source_names(),
        vec!["applicationConfig", ConfigPropertySource::NAME]
    );

    assert_eq!(environment.get_property("example.key1").as_deref(), Some("host"));
    assert_eq!(
        environment.get_property("greeting.message").as_deref(),
        Some("Hello, strata!")
    );
    assert!(environment.property_names().contains("yaml.here"));
}

#[test]
fn refresh_picks_up_changed_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "application.yaml", "answer: 1\n");
    let context = isolated(dir.path());

    let handle = ConfigHandle::new(build_standard(&context).expect("build"));
    write(dir.path(), "application.yaml", "answer: 2\n");
    handle.refresh(|| build_standard(&context)).expect("refresh");
    assert_eq!(handle.current().get_value::<i32>("answer").expect("int"), 2);

    write(dir.path(), "application.yaml", "answer: [unclosed\n");
    handle
        .refresh(|| build_standard(&context))
        .expect_err("broken file");
    assert_eq!(handle.current().get_value::<i32>("answer").expect("int"), 2);
}
