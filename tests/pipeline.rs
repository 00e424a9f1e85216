// tests/pipeline.rs

use entry::{
    core::{
        config_loader,
        context::CommandContext,
        matcher,
        pipeline::{Pipeline, Resolution, ResolveError},
        script::RhaiEngine,
        templater,
    },
    models::Config,
    system::executor::Executor,
};

fn config_from(toml_text: &str) -> Config {
    toml::from_str(toml_text).unwrap()
}

fn resolve_dry(config: &Config, target: &str) -> (Result<Resolution, ResolveError>, String) {
    let mut executor = Executor::new(Vec::new(), true);
    let engine = RhaiEngine::new();
    let result = Pipeline::new(config, &mut executor, &engine).resolve(target);
    (result, String::from_utf8(executor.into_output()).unwrap())
}

#[test]
fn text_rule_renders_file_in_dry_run() {
    let config = config_from(
        r#"
[[rules]]
extensions = ["txt"]
command = "cat {{.File}}"
"#,
    );
    let (result, output) = resolve_dry(&config, "a.txt");
    assert_eq!(result.unwrap(), Resolution::Rules { handled: 1 });
    assert_eq!(output, "cat a.txt\n");
}

#[test]
fn fallthrough_chain_stops_after_first_terminal_rule() {
    let config = config_from(
        r#"
[[rules]]
extensions = ["md"]
command = "vim {{.File}}"
fallthrough = true

[[rules]]
extensions = ["md"]
command = "echo {{.File}}"

[[rules]]
extensions = ["md"]
command = "never {{.File}}"
"#,
    );
    let (result, output) = resolve_dry(&config, "x.md");
    assert_eq!(result.unwrap(), Resolution::Rules { handled: 2 });
    assert_eq!(output, "vim x.md\necho x.md\n");
}

#[test]
fn match_all_ignores_fallthrough_but_match_does_not() {
    let config = config_from(
        r#"
[[rules]]
name = "First"
extensions = ["md"]
command = "a"

[[rules]]
name = "Second"
regex = '\.md$'
command = "b"
"#,
    );
    let engine = RhaiEngine::new();
    let first: Vec<_> = matcher::match_rules(&config.rules, "x.md", &engine)
        .unwrap()
        .iter()
        .map(|s| s.rule.label().to_string())
        .collect();
    let all: Vec<_> = matcher::match_all(&config.rules, "x.md", &engine)
        .unwrap()
        .iter()
        .map(|s| s.rule.label().to_string())
        .collect();
    assert_eq!(first, vec!["First"]);
    assert_eq!(all, vec!["First", "Second"]);
}

#[test]
fn existing_file_without_rule_or_default_uses_system_opener() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let target = file.path().to_string_lossy().into_owned();
    let (result, output) = resolve_dry(&Config::default(), &target);
    assert_eq!(result.unwrap(), Resolution::SystemOpener);
    let line = output.trim_end();
    assert!(line.ends_with(&target), "unexpected opener line: {line}");
    assert_ne!(line, target);
}

#[test]
fn missing_non_url_target_is_unresolved_not_an_error() {
    let (result, output) = resolve_dry(&Config::default(), "no-such-file-or-command-xyz");
    assert_eq!(result.unwrap(), Resolution::Unresolved);
    assert!(output.is_empty());
}

#[test]
fn scheme_rule_handles_urls_only() {
    let config = config_from(
        r#"
[[rules]]
scheme = "https"
command = "browser {{.File}}"
background = true

[[rules]]
regex = "example"
command = "fallback {{.File}}"
"#,
    );
    let (_, output) = resolve_dry(&config, "https://example.com/page");
    assert_eq!(output, "browser https://example.com/page (background)\n");

    let (_, output) = resolve_dry(&config, "example.txt");
    assert_eq!(output, "fallback example.txt\n");
}

#[test]
fn script_can_choose_the_command_from_bindings() {
    let config = config_from(
        r#"
[[rules]]
extensions = ["log"]
script = '''
if name.starts_with("error") { "less +G " + base } else { false }
'''

[[rules]]
extensions = ["log"]
command = "tail {{.File}}"
"#,
    );
    let (_, output) = resolve_dry(&config, "/var/log/error.log");
    assert_eq!(output, "less +G error.log\n");
}

#[test]
fn rejecting_script_rule_does_not_hide_later_rules() {
    let config = config_from(
        r#"
[[rules]]
name = "scripted"
script = "false"
command = "never {{.File}}"

[[rules]]
extensions = ["txt"]
command = "cat {{.File}}"
"#,
    );
    let (result, output) = resolve_dry(&config, "a.txt");
    assert_eq!(result.unwrap(), Resolution::Rules { handled: 1 });
    assert_eq!(output, "cat a.txt\n");

    let engine = RhaiEngine::new();
    let matched = matcher::match_rules(&config.rules, "a.txt", &engine).unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].command(), "cat {{.File}}");
}

#[cfg(unix)]
#[test]
fn failing_rule_aborts_the_chain_with_its_error() {
    let config = config_from(
        r#"
[[rules]]
extensions = ["md"]
command = "echo one"
fallthrough = true

[[rules]]
extensions = ["md"]
command = "exit 4"
fallthrough = true

[[rules]]
extensions = ["md"]
command = "echo three"
"#,
    );
    let mut executor = Executor::new(Vec::new(), false);
    let engine = RhaiEngine::new();
    let result = Pipeline::new(&config, &mut executor, &engine).resolve("x.md");
    let output = String::from_utf8(executor.into_output()).unwrap();

    assert!(matches!(
        &result,
        Err(ResolveError::Execution(e)) if e.exit_code() == Some(4)
    ));
    assert_eq!(output, "one\n");
}

#[test]
fn context_and_templates_split_multi_dot_names() {
    let ctx = CommandContext::from_target("/tmp/foo.bar.txt");
    let rendered = templater::render("{{.Dir}} {{.Base}} {{.Name}} {{.Ext}}", &ctx).unwrap();
    assert_eq!(rendered, "/tmp foo.bar.txt foo.bar .txt");
}

#[test]
fn starter_config_survives_a_disk_round_trip_and_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    config_loader::init_config(&path).unwrap();
    let config = config_loader::load_config(&path).unwrap();
    config_loader::validate_config(&config).unwrap();

    let (result, output) = resolve_dry(&config, "notes.md");
    assert_eq!(result.unwrap(), Resolution::Rules { handled: 1 });
    assert!(output.ends_with("notes.md\n"));
}
