//! End-to-end tests for the patchr binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// patchr command isolated from any user or project config
fn patchr(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("patchr").expect("binary should build");
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir).env_remove("RUST_LOG");
    cmd
}

const MAIN_GO: &str = r#"package main

func NewApp() *cobra.Command {
	c := cobra.Command{
		// patchr:replace Use:   "{{ Name }}",
		Use:   "patchr",
		Short: "patchr",
	}
	// patchr:skip-start
	c.Flags().Bool("debug", false, "internal only")
	// patchr:skip-end
	return &c
}"#;

#[test]
fn test_help() {
    let temp = TempDir::new().unwrap();
    patchr(temp.path())
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("comment directives"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_missing_target_fails() {
    let temp = TempDir::new().unwrap();
    patchr(temp.path()).assert().failure();
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    patchr(temp.path())
        .args(["version", "--detail"])
        .assert()
        .success()
        .stdout(predicate::str::contains("patchr version:"))
        .stdout(predicate::str::contains("license:"));
}

#[test]
fn test_apply_file_with_yaml_values() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("main.go"), MAIN_GO).unwrap();
    fs::write(temp.path().join("values.yaml"), "Name: mytool\n").unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "-v", "values.yaml", "main.go"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Patched 1 file(s)"));

    let patched = fs::read_to_string(temp.path().join("main.go")).unwrap();
    assert!(patched.contains("\t\tUse:   \"mytool\",\n"));
    assert!(!patched.contains("patchr:"));
    assert!(!patched.contains("debug"));
    assert!(patched.ends_with("}\n"));
}

#[test]
fn test_dry_run_directory_leaves_files() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.sql"), "-- patchr:add -- owner: {{input \"name\"}}\nSELECT 1;\n").unwrap();
    fs::write(src.join("b.sh"), "# patchr:remove\necho old\necho {{literal}}\n").unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "-d", "-i", "name=John", "src"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.sql === start ===\n-- owner: John\nSELECT 1;\n"))
        .stdout(predicate::str::contains("b.sh === start ===\necho {{literal}}\n"))
        .stdout(predicate::str::contains("b.sh === end ==="))
        .stdout(predicate::str::contains("Patched").not());

    assert_eq!(
        fs::read_to_string(src.join("b.sh")).unwrap(),
        "# patchr:remove\necho old\necho {{literal}}\n"
    );
}

#[test]
fn test_json_values_and_template_block() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("values.json"), r#"{"Enabled": false, "Port": 8080}"#).unwrap();
    fs::write(
        temp.path().join("config.yml"),
        "\
port: 80
# patchr:remove
port: 80
# patchr:template-start
# port: {{Port}}
# {{#if Enabled}}
# feature: on
# {{/if}}
# patchr:template-end
",
    )
    .unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "--values", "values.json", "config.yml"])
        .assert()
        .success();

    let patched = fs::read_to_string(temp.path().join("config.yml")).unwrap();
    assert!(patched.starts_with("port: 80\nport: 8080\n"));
    assert!(!patched.contains("feature"));
}

#[test]
fn test_non_interactive_missing_input_fails() {
    let temp = TempDir::new().unwrap();
    let original = "// patchr:add {{input \"author\"}}\n";
    fs::write(temp.path().join("a.go"), original).unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "a.go"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("author"));

    assert_eq!(fs::read_to_string(temp.path().join("a.go")).unwrap(), original);
}

#[test]
fn test_unmatched_end_directive_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.go"), "x\n// patchr:template-end\n").unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "a.go"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("patchr:template-end"));
}

#[test]
fn test_unsupported_file_type_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.md"), "# notes\n").unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "notes.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type"));
}

#[test]
fn test_comment_prefix_flag() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.md"), "<!-- patchr:add hello -->\n").unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "--comment-prefix", "<!--", "notes.md"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(temp.path().join("notes.md")).unwrap(), "hello -->\n");
}

#[test]
fn test_config_file_prefixes_and_inputs() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("patchr.yml"),
        "non_interactive: true\ncomment_prefixes:\n  .tf: \"#\"\ninputs:\n  region: eu-west-1\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("main.tf"),
        "# patchr:replace region = \"{{input \"region\"}}\"\nregion = \"us-east-1\"\n",
    )
    .unwrap();

    patchr(temp.path())
        .args(["-c", "patchr.yml", "main.tf"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("main.tf")).unwrap(),
        "region = \"eu-west-1\"\n"
    );
}

#[test]
fn test_cli_input_overrides_config_input() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".patchr.yml"), "inputs:\n  who: config\n").unwrap();
    fs::write(temp.path().join("a.go"), "// patchr:add {{input \"who\"}}\n").unwrap();

    patchr(temp.path())
        .args(["--non-interactive", "-i", "who=flag", "a.go"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(temp.path().join("a.go")).unwrap(), "flag\n");
}
