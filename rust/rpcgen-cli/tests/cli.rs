use std::fs;
use std::path::Path;

use rpcgen_cli::{Project, generate, output, summary};
use rpcgen_codegen::{REMOTE_URL_PLACEHOLDER, Target, TargetLanguage};

const GREETER: &str = r#"export class Greeter {
  async greet(name: string): Promise<string> {
    return `hello ${name}`;
  }

  async nightly(): Promise<void> {}
}
"#;

fn project(dir: &Path, config: &str) -> Project {
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::write(dir.join("src/greeter.ts"), GREETER).unwrap();
    fs::write(dir.join("rpcgen.yaml"), config).unwrap();
    Project::load(&dir.join("rpcgen.yaml")).unwrap()
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

const CONFIG: &str = r#"
name: greeter-app
classes:
  - path: src/greeter.ts
    methods:
      - name: nightly
        type: cron
        cronString: "0 0 * * *"
sdk:
  - language: typescript
    path: sdk/ts
"#;

#[test]
fn generates_configured_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project(tmp.path(), CONFIG);

    let report = generate(&project, &[], None).unwrap();
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.written.len(), 1);

    let out = tmp.path().join("sdk/ts");
    assert_eq!(listing(&out), ["greeter.sdk.ts", "remote.ts"]);
    let client = fs::read_to_string(out.join("greeter.sdk.ts")).unwrap();
    assert!(client.contains("greet"), "{client}");
    assert!(!client.contains("nightly"), "{client}");
    assert!(client.contains(REMOTE_URL_PLACEHOLDER));
}

#[test]
fn regenerating_removes_stale_files() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("sdk");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("stale.ts"), "// left over").unwrap();

    let project = project(tmp.path(), "name: app\nclasses:\n  - path: src/greeter.ts\n");
    let targets = [Target::new(TargetLanguage::TypeScript, out.to_string_lossy())];
    let report = generate(&project, &targets, None).unwrap();
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    assert_eq!(listing(&out), ["greeter.sdk.ts", "remote.ts"]);
    let siblings = listing(tmp.path());
    assert!(siblings.iter().all(|n| !n.contains("rpcgen-")), "{siblings:?}");
}

#[test]
fn missing_source_files_fail_without_blocking_the_rest() {
    let tmp = tempfile::tempdir().unwrap();
    let config = r#"
name: app
classes:
  - path: src/greeter.ts
  - path: src/gone.ts
sdk:
  - language: py
    path: sdk/py
"#;
    let project = project(tmp.path(), config);

    let report = generate(&project, &[], None).unwrap();
    assert_eq!(report.failures.len(), 1);
    let message = format!("{:#}", report.failures[0]);
    assert!(message.contains("src/gone.ts"), "{message}");
    assert!(tmp.path().join("sdk/py/greeter.py").exists());
}

#[test]
fn unsupported_languages_fail_without_blocking_the_rest() {
    let tmp = tempfile::tempdir().unwrap();
    let config = r#"
name: app
classes:
  - path: src/greeter.ts
sdk:
  - language: cobol
    path: sdk/cobol
  - language: typescript
    path: sdk/ts
"#;
    let project = project(tmp.path(), config);

    let report = generate(&project, &[], None).unwrap();
    assert_eq!(report.failures.len(), 1);
    let message = format!("{:#}", report.failures[0]);
    assert!(message.contains("cobol"), "{message}");
    assert_eq!(report.written.len(), 1);
    assert!(tmp.path().join("sdk/ts/greeter.sdk.ts").exists());
    assert!(!tmp.path().join("sdk/cobol").exists());
}

#[test]
fn summary_lists_every_method_with_its_kind() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project(tmp.path(), CONFIG);

    let json = summary(&project).unwrap();
    assert!(json.contains("\"Greeter\""), "{json}");
    assert!(json.contains("\"greet\""), "{json}");
    assert!(json.contains("\"nightly\""), "{json}");
    assert!(json.contains("\"cron\""), "{json}");
    assert!(json.contains("\"0 0 * * *\""), "{json}");

    let path = tmp.path().join("summary.json");
    generate(&project, &[], Some(&path)).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), json);
}

#[test]
fn link_fills_in_the_remote_url() {
    let tmp = tempfile::tempdir().unwrap();
    let project = project(tmp.path(), CONFIG);
    generate(&project, &[], None).unwrap();

    let out = tmp.path().join("sdk/ts");
    let changed = output::link_dir(&out, "https://api.example.com").unwrap();
    assert_eq!(changed, [out.join("greeter.sdk.ts")]);

    let client = fs::read_to_string(out.join("greeter.sdk.ts")).unwrap();
    assert!(client.contains("https://api.example.com"));
    assert!(!client.contains(REMOTE_URL_PLACEHOLDER));
    assert!(output::link_dir(&out, "https://other").unwrap().is_empty());
}

#[test]
fn cron_without_schedule_is_a_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("rpcgen.yaml"),
        "name: app\nclasses:\n  - path: src/greeter.ts\n    type: cron\n",
    )
    .unwrap();
    let err = Project::load(&tmp.path().join("rpcgen.yaml")).unwrap_err();
    assert!(format!("{err:#}").contains("cronString"), "{err:#}");
}
