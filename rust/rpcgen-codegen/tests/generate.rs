use std::collections::BTreeMap;

use rpcgen_codegen::{
    AstSummary, GeneratedFile, Metadata, REMOTE_URL_PLACEHOLDER, Target, TargetLanguage, generate,
    generate_target, link,
};
use rpcgen_parse::{BuildRequest, MemoryLoader, build_programs};
use rpcgen_types::{ClassExposure, Error, ExposureConfig, ExposureKind, Program};

fn programs(loader: &MemoryLoader, paths: &[&str], exposure: &ExposureConfig) -> Vec<Program> {
    let requests: Vec<BuildRequest> = paths
        .iter()
        .map(|p| BuildRequest::new(loader.source(p).expect("source missing")))
        .collect();
    build_programs(&requests, loader, exposure)
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

fn files(programs: &[Program], language: TargetLanguage) -> BTreeMap<String, GeneratedFile> {
    generate_target(programs, language, &Metadata::default())
        .unwrap()
        .into_iter()
        .map(|f| (f.path.clone(), f))
        .collect()
}

fn content<'a>(files: &'a BTreeMap<String, GeneratedFile>, path: &str) -> &'a str {
    match files.get(path) {
        Some(f) => &f.content,
        None => panic!("no {path} among {:?}", files.keys().collect::<Vec<_>>()),
    }
}

fn paths(files: &BTreeMap<String, GeneratedFile>) -> Vec<&str> {
    files.keys().map(String::as_str).collect()
}

fn greeter() -> MemoryLoader {
    MemoryLoader::new().with(
        "greeter.ts",
        r#"
export class Greeter {
  async greet(name: string, times: number = 1): Promise<string> {
    return name.repeat(times);
  }
}
"#,
    )
}

// ============================================================================
// Greeter: one client, one runtime, no models
// ============================================================================

#[test]
fn greeter_typescript() {
    let programs = programs(&greeter(), &["greeter.ts"], &ExposureConfig::default());
    let files = files(&programs, TargetLanguage::TypeScript);

    assert_eq!(paths(&files), ["greeter.sdk.ts", "remote.ts"]);
    let client = &files["greeter.sdk.ts"];
    assert_eq!(client.owner_class.as_deref(), Some("Greeter"));
    assert!(client.content.contains(
        "static async greet(name: string, times: number = 1): Promise<string> {"
    ));
    assert!(client.content.contains("Greeter.remote.call(\"Greeter.greet\", name, times)"));
    assert!(client.content.contains(REMOTE_URL_PLACEHOLDER));
    assert_eq!(files["remote.ts"].owner_class, None);
}

#[test]
fn greeter_in_every_language() {
    let programs = programs(&greeter(), &["greeter.ts"], &ExposureConfig::default());
    let expected = [
        (TargetLanguage::JavaScript, "greeter.sdk.js", "static async greet(name, times = 1) {"),
        (TargetLanguage::Python, "greeter.py", "def greet(name: str, times: float = 1) -> str:"),
        (
            TargetLanguage::Swift,
            "greeter.sdk.swift",
            "public static func greet(name: String, times: Double = 1) async throws -> String {",
        ),
        (
            TargetLanguage::Dart,
            "greeter.dart",
            "static Future<String> greet(String name, [double times = 1]) async {",
        ),
        (
            TargetLanguage::Kotlin,
            "greeter.kt",
            "suspend fun greet(name: String, times: Double = 1.0): String =",
        ),
        (
            TargetLanguage::Go,
            "greeter_client.go",
            "func (c *Greeter) Greet(name string, times *float64) (string, error) {",
        ),
    ];
    for (language, client, signature) in expected {
        let files = files(&programs, language);
        let emitter = language.emitter();
        let runtime = emitter.runtime_path();

        let others: Vec<&str> = paths(&files)
            .into_iter()
            .filter(|p| *p != client && *p != runtime && !p.ends_with("__init__.py"))
            .collect();
        assert!(others.is_empty(), "{language}: unexpected files {others:?}");

        let client = content(&files, client);
        assert!(client.contains(signature), "{language}:\n{client}");
        assert!(client.contains("\"Greeter.greet\""), "{language}:\n{client}");
        assert!(client.contains(REMOTE_URL_PLACEHOLDER), "{language}");
    }
}

#[test]
fn linking_fills_in_the_url() {
    let programs = programs(&greeter(), &["greeter.ts"], &ExposureConfig::default());
    let files = files(&programs, TargetLanguage::TypeScript);
    let linked = link(content(&files, "greeter.sdk.ts"), "https://api.example.com/rpc");
    assert!(linked.contains("new Remote(\"https://api.example.com/rpc\")"));
    assert!(!linked.contains(REMOTE_URL_PLACEHOLDER));
}

// ============================================================================
// Models owned by other files
// ============================================================================

fn with_user_model() -> MemoryLoader {
    MemoryLoader::new()
        .with(
            "greeter.ts",
            r#"
import { User } from "./src/models/user";

export class Greeter {
  async whoami(): Promise<User> {
    return { id: 1, name: "a" };
  }
  async rename(user: User, name: string): Promise<void> {}
}
"#,
        )
        .with(
            "src/models/user.ts",
            r#"
import { Role } from "./role";

export type User = {
  id: number;
  name: string;
  role?: Role;
  friends: User[];
};
"#,
        )
        .with(
            "src/models/role.ts",
            r#"
export enum Role {
  Admin = "admin",
  Guest = "guest",
}
"#,
        )
}

#[test]
fn record_from_another_file_gets_a_model_file() {
    let programs = programs(&with_user_model(), &["greeter.ts"], &ExposureConfig::default());
    let files = files(&programs, TargetLanguage::TypeScript);

    assert_eq!(
        paths(&files),
        ["greeter.sdk.ts", "remote.ts", "src/models/role.ts", "src/models/user.ts"]
    );

    let client = content(&files, "greeter.sdk.ts");
    assert_eq!(client.matches("from \"./src/models/user\"").count(), 1);
    assert!(client.contains("import { User } from \"./src/models/user\";"));
    assert!(!client.contains("export type User"));
    assert!(client.contains("static async whoami(): Promise<User> {"));

    let user = content(&files, "src/models/user.ts");
    assert!(user.contains("import { Role } from \"./role\";"));
    assert!(
        user.contains("export type User = {\n  id: number;\n  name: string;\n  role?: Role;\n  friends: User[];\n};")
    );
    assert!(content(&files, "src/models/role.ts").contains("  Admin = \"admin\","));
}

#[test]
fn model_imports_follow_output_layout() {
    let programs = programs(&with_user_model(), &["greeter.ts"], &ExposureConfig::default());

    let py = files(&programs, TargetLanguage::Python);
    for package in ["__init__.py", "src/__init__.py", "src/models/__init__.py"] {
        assert!(py.contains_key(package), "missing {package}");
    }
    let client = content(&py, "greeter.py");
    assert!(client.contains("from .remote import Remote"));
    assert!(client.contains("from .src.models.user import User"));
    assert!(
        client.contains("return (User.from_mapping(response) if isinstance(response, Mapping) else response)")
    );
    let user = content(&py, "src/models/user.py");
    assert!(user.contains("from .role import Role"));
    assert!(user.contains("self.role = (Role(role) if role is not None else None)"));

    let dart = files(&programs, TargetLanguage::Dart);
    let client = content(&dart, "greeter.dart");
    assert!(client.contains("import 'remote.dart';"));
    assert!(client.contains("import 'src/models/user.dart';"));
    assert!(client.contains("return User.fromJson(response as Map<String, dynamic>);"));
    let user = content(&dart, "src/models/user.dart");
    assert!(user.contains("import 'role.dart';"));
    assert!(user.contains("role: json[\"role\"] == null ? null : decodeRole(json[\"role\"]),"));

    // One module per output directory: nothing to import.
    let swift = files(&programs, TargetLanguage::Swift);
    assert!(!content(&swift, "greeter.sdk.swift").contains("import User"));
    assert!(
        content(&swift, "src/models/role.swift").contains("public enum Role: String, Codable {")
    );
}

#[test]
fn javascript_documents_declarations_inline() {
    let programs = programs(&with_user_model(), &["greeter.ts"], &ExposureConfig::default());
    let files = files(&programs, TargetLanguage::JavaScript);

    assert_eq!(paths(&files), ["greeter.sdk.js", "remote.js"]);
    let client = content(&files, "greeter.sdk.js");
    assert!(client.contains(" * @typedef {Object} User\n"));
    assert!(client.contains(" * @property {Role} [role]\n"));
    assert!(client.contains(" * @typedef {(\"admin\"|\"guest\")} Role\n"));
    assert!(client.contains("   * @returns {Promise<User>}\n"));
    assert!(client.contains("static async rename(user, name) {"));
}

#[test]
fn go_models_share_one_flat_package() {
    let programs = programs(&with_user_model(), &["greeter.ts"], &ExposureConfig::default());
    let go = files(&programs, TargetLanguage::Go);

    assert_eq!(
        paths(&go),
        ["greeter_client.go", "remote.go", "src_models_role_types.go", "src_models_user_types.go"]
    );
    for file in go.values() {
        assert!(file.content.contains("package rpcgen\n"), "{}", file.path);
        assert!(!file.content.contains("import \"./"), "{}", file.path);
    }
    let client = content(&go, "greeter_client.go");
    assert!(client.contains("func (c *Greeter) Whoami() (User, error) {"), "{client}");
    assert!(client.contains("return call[User](c.remote, \"Greeter.whoami\")"), "{client}");
    assert!(
        client.contains("func (c *Greeter) Rename(user User, name string) error {"),
        "{client}"
    );
    assert!(client.contains("return callVoid(c.remote, \"Greeter.rename\", user, name)"));

    let user = content(&go, "src_models_user_types.go");
    assert!(user.contains("\tRole *Role `json:\"role,omitempty\"`\n"), "{user}");
    assert!(user.contains("\tFriends []User `json:\"friends\"`\n"), "{user}");
    let role = content(&go, "src_models_role_types.go");
    assert!(role.contains("type Role string\n\nconst (\n\tRoleAdmin Role = \"admin\"\n"));
}

fn two_users() -> MemoryLoader {
    MemoryLoader::new()
        .with("src/a.ts", "export type User = { id: number };\n")
        .with("src/b.ts", "export type User = { name: string };\n")
        .with(
            "directory.ts",
            r#"
import { User } from "./src/a";
import { User as Member } from "./src/b";

export class Directory {
  async find(id: number): Promise<User> {
    return { id };
  }
  async member(name: string): Promise<Member> {
    return { name };
  }
}
"#,
        )
}

#[test]
fn same_name_in_two_modules_is_qualified() {
    let single = programs(&with_user_model(), &["greeter.ts"], &ExposureConfig::default());
    let programs = programs(&two_users(), &["directory.ts"], &ExposureConfig::default());

    let ts = files(&programs, TargetLanguage::TypeScript);
    assert_eq!(paths(&ts), ["directory.sdk.ts", "remote.ts", "src/a.ts", "src/b.ts"]);
    let client = content(&ts, "directory.sdk.ts");
    assert!(client.contains("import { SrcAUser } from \"./src/a\";"), "{client}");
    assert!(client.contains("import { SrcBUser } from \"./src/b\";"), "{client}");
    assert!(!client.contains("import { User }"), "{client}");
    assert!(client.contains("static async find(id: number): Promise<SrcAUser> {"));
    assert!(client.contains("static async member(name: string): Promise<SrcBUser> {"));
    assert!(content(&ts, "src/a.ts").contains("export type SrcAUser = {\n  id: number;\n};"));
    assert!(content(&ts, "src/b.ts").contains("export type SrcBUser = {\n  name: string;\n};"));

    let py = files(&programs, TargetLanguage::Python);
    let client = content(&py, "directory.py");
    assert!(client.contains("from .src.a import SrcAUser"), "{client}");
    assert!(client.contains("from .src.b import SrcBUser"), "{client}");

    let go = files(&programs, TargetLanguage::Go);
    assert!(content(&go, "src_a_types.go").contains("type SrcAUser struct {"));
    assert!(content(&go, "src_b_types.go").contains("type SrcBUser struct {"));

    // Names declared once keep their spelling.
    let ts = files(&single, TargetLanguage::TypeScript);
    assert!(content(&ts, "greeter.sdk.ts").contains("import { User } from \"./src/models/user\";"));
}

// ============================================================================
// Documentation
// ============================================================================

fn documented() -> MemoryLoader {
    MemoryLoader::new().with(
        "people.ts",
        r#"
/** Keeps track of people. */
export class People {
  /**
   * Finds someone.
   * @param id their number
   */
  async find(id: number): Promise<Person> {
    return { id };
  }
}

/** Somebody. */
export type Person = { id: number };
"#,
    )
}

#[test]
fn doc_comments_reach_every_language() {
    let programs = programs(&documented(), &["people.ts"], &ExposureConfig::default());
    let expected = [
        (
            TargetLanguage::TypeScript,
            "people.sdk.ts",
            [
                "/**\n * Keeps track of people.\n */\nexport class People {",
                "  /**\n   * Finds someone.\n   * @param id their number\n   */\n  static async find(",
                "/**\n * Somebody.\n */\nexport type Person = {",
            ],
        ),
        (
            TargetLanguage::JavaScript,
            "people.sdk.js",
            [
                "/**\n * Keeps track of people.\n */\nexport class People {",
                "  /**\n   * Finds someone.\n   * @param id their number\n   *\n   * @param {number} id\n",
                "/**\n * Somebody.\n * @typedef {Object} Person\n",
            ],
        ),
        (
            TargetLanguage::Python,
            "people.py",
            [
                "class People:\n    \"\"\"\n    Keeps track of people.\n    \"\"\"\n",
                "-> Person:\n        \"\"\"\n        Finds someone.\n        @param id their number\n        \"\"\"\n",
                "# Somebody.\nclass Person:",
            ],
        ),
        (
            TargetLanguage::Swift,
            "people.sdk.swift",
            [
                "/// Keeps track of people.\npublic final class People {",
                "    /// Finds someone.\n    /// @param id their number\n    public static func find(",
                "/// Somebody.\npublic final class Person: Codable {",
            ],
        ),
        (
            TargetLanguage::Dart,
            "people.dart",
            [
                "/// Keeps track of people.\nclass People {",
                "  /// Finds someone.\n  /// @param id their number\n  static Future<Person> find(",
                "/// Somebody.\nclass Person {",
            ],
        ),
        (
            TargetLanguage::Kotlin,
            "people.kt",
            [
                "/**\n * Keeps track of people.\n */\nclass People {",
                "        /**\n         * Finds someone.\n         * @param id their number\n         */\n        suspend fun find(",
                "/**\n * Somebody.\n */\ndata class Person(",
            ],
        ),
        (
            TargetLanguage::Go,
            "people_client.go",
            [
                "// Keeps track of people.\ntype People struct {",
                "// Finds someone.\n// @param id their number\nfunc (c *People) Find(",
                "// Somebody.\ntype Person struct {",
            ],
        ),
    ];
    for (language, client, snippets) in expected {
        let files = files(&programs, language);
        let client = content(&files, client);
        for snippet in snippets {
            assert!(client.contains(snippet), "{language}: no {snippet:?} in\n{client}");
        }
    }
}

// ============================================================================
// Exposure
// ============================================================================

fn admin_and_report() -> MemoryLoader {
    MemoryLoader::new()
        .with(
            "src/admin.ts",
            r#"
export type Audit = { at: Date; who: string };
export type Secret = { token: string };

export class Admin {
  async audit(): Promise<Audit> {
    return { at: new Date(), who: "root" };
  }
  async secret(): Promise<Secret> {
    return { token: "x" };
  }
}
"#,
        )
        .with(
            "src/report.ts",
            r#"
import { Audit } from "./admin";

export class Report {
  async last(): Promise<Audit> {
    return { at: new Date(), who: "root" };
  }
  async rebuild(): Promise<void> {}
}
"#,
        )
}

fn admin_and_report_exposure() -> ExposureConfig {
    let mut exposure = ExposureConfig::default();
    exposure.insert(
        "Admin",
        ClassExposure {
            kind: ExposureKind::Http,
            ..ClassExposure::default()
        },
    );
    let mut report = ClassExposure::default();
    report.methods.insert(
        "rebuild".into(),
        ExposureKind::Cron {
            schedule: "0 3 * * *".into(),
        },
    );
    exposure.insert("Report", report);
    exposure
}

#[test]
fn unexposed_classes_get_no_client_but_keep_used_declarations() {
    let programs = programs(
        &admin_and_report(),
        &["src/admin.ts", "src/report.ts"],
        &admin_and_report_exposure(),
    );
    let files = files(&programs, TargetLanguage::TypeScript);

    assert_eq!(paths(&files), ["remote.ts", "report.sdk.ts", "src/admin.ts"]);

    let report = content(&files, "report.sdk.ts");
    assert!(report.contains("static async last(): Promise<Audit>"));
    assert!(!report.contains("rebuild"));
    assert!(report.contains("import { Audit } from \"./src/admin\";"));

    // Only reachable declarations are emitted.
    let model = content(&files, "src/admin.ts");
    assert!(model.contains("export type Audit = {"));
    assert!(!model.contains("Secret"));
    assert_eq!(files["src/admin.ts"].owner_class, None);
}

#[test]
fn summary_lists_every_method_with_its_kind() {
    let programs = programs(
        &admin_and_report(),
        &["src/admin.ts", "src/report.ts"],
        &admin_and_report_exposure(),
    );
    let summary = AstSummary::from_programs(&programs);
    let methods: Vec<(&str, &str, &str)> = summary
        .classes
        .iter()
        .flat_map(|c| c.methods.iter().map(move |m| (c.name.as_str(), m.name.as_str(), m.kind)))
        .collect();
    assert_eq!(
        methods,
        [
            ("Admin", "audit", "http"),
            ("Admin", "secret", "http"),
            ("Report", "last", "jsonrpc"),
            ("Report", "rebuild", "cron"),
        ]
    );
    assert_eq!(summary.classes[1].methods[0].return_type, "Promise<Audit>");
    assert_eq!(summary.classes[1].methods[1].schedule.as_deref(), Some("0 3 * * *"));
}

// ============================================================================
// Naming and ordering
// ============================================================================

fn keywords() -> MemoryLoader {
    MemoryLoader::new().with(
        "keywords.ts",
        r#"
export type Options = {
  from: string;
  is?: boolean;
  object: number;
};

export class Keywords {
  async send(from: string, when: boolean, lambda: string, opts?: Options): Promise<void> {}
}
"#,
    )
}

#[test]
fn reserved_parameter_names_are_renamed_consistently() {
    let programs = programs(&keywords(), &["keywords.ts"], &ExposureConfig::default());

    let py = files(&programs, TargetLanguage::Python);
    let client = content(&py, "keywords.py");
    assert!(client.contains(
        "def send(from_: str, when: bool, lambda_: str, opts: Options | None = None) -> None:"
    ));
    assert!(
        client.contains("Keywords.remote.call(\"Keywords.send\", [from_, when, lambda_, opts])")
    );
    assert!(client.contains("from_=data[\"from\"],"));
    assert!(client.contains("is_=data.get(\"is\"),"));

    let kt = files(&programs, TargetLanguage::Kotlin);
    let client = content(&kt, "keywords.kt");
    assert!(client.contains(
        "suspend fun send(from: String, when_: Boolean, lambda: String, opts: Options? = null) {"
    ));
    assert!(
        client.contains("remote.callVoid(\"Keywords.send\", listOf(from, when_, lambda, opts))")
    );
    assert!(client.contains("@SerializedName(\"is\") val is_: Boolean? = null,"));
    assert!(client.contains("@SerializedName(\"object\") val object_: Double,"));

    let swift = files(&programs, TargetLanguage::Swift);
    let client = content(&swift, "keywords.sdk.swift");
    assert!(client.contains("public var is_: Bool?"));
    assert!(client.contains("case is_ = \"is\""));
}

#[test]
fn optional_properties_come_last_in_constructors() {
    let loader = MemoryLoader::new().with(
        "profiles.ts",
        r#"
export type Profile = {
  nick?: string;
  id: number;
  bio?: string;
  name: string;
};

export class Profiles {
  async get(id: number): Promise<Profile> {
    return { id, name: "a" };
  }
}
"#,
    );
    let programs = programs(&loader, &["profiles.ts"], &ExposureConfig::default());

    let py = files(&programs, TargetLanguage::Python);
    assert!(content(&py, "profiles.py").contains(
        "def __init__(self, id: float, name: str, nick: str | None = None, bio: str | None = None) -> None:"
    ));

    let swift = files(&programs, TargetLanguage::Swift);
    assert!(content(&swift, "profiles.sdk.swift").contains(
        "public init(id: Double, name: String, nick: String? = nil, bio: String? = nil) {"
    ));

    let dart = files(&programs, TargetLanguage::Dart);
    assert!(
        content(&dart, "profiles.dart")
            .contains("Profile({required this.id, required this.name, this.nick, this.bio});")
    );

    let kt = files(&programs, TargetLanguage::Kotlin);
    assert!(content(&kt, "profiles.kt").contains(
        "data class Profile(\n    val id: Double,\n    val name: String,\n    val nick: String? = null,\n    val bio: String? = null,\n)"
    ));
}

// ============================================================================
// Batch behavior
// ============================================================================

#[test]
fn generation_is_deterministic() {
    let loader = with_user_model().with(
        "src/admin.ts",
        r#"
import { User } from "./models/user";

export class Admin {
  async users(filter?: string): Promise<User[]> {
    return [];
  }
}
"#,
    );
    let targets: Vec<Target> = TargetLanguage::ALL
        .iter()
        .map(|&l| Target::new(l, format!("sdk/{l}")))
        .collect();

    let run = || {
        let programs =
            programs(&loader, &["greeter.ts", "src/admin.ts"], &ExposureConfig::default());
        generate(&programs, &targets, &Metadata::default())
            .into_iter()
            .map(|out| (out.target, out.result.unwrap()))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn repeated_targets_share_one_runtime() {
    let programs = programs(&greeter(), &["greeter.ts"], &ExposureConfig::default());
    let targets = [
        Target::new(TargetLanguage::TypeScript, "sdk/ts"),
        Target::new(TargetLanguage::Python, "sdk/py"),
        Target::new(TargetLanguage::TypeScript, "sdk/ts"),
    ];
    let outputs = generate(&programs, &targets, &Metadata::default());

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].target, targets[0]);
    assert_eq!(outputs[1].target, targets[1]);
    let ts = outputs[0].result.as_ref().unwrap();
    assert_eq!(ts.iter().filter(|f| f.path == "remote.ts").count(), 1);
}

#[test]
fn mixed_enums_fail_the_target() {
    let loader = MemoryLoader::new().with(
        "mixed.ts",
        r#"
export enum Mixed {
  A = "a",
  B = 1,
}

export class Picker {
  async pick(): Promise<Mixed> {
    return Mixed.A;
  }
}
"#,
    );
    let programs = programs(&loader, &["mixed.ts"], &ExposureConfig::default());
    for language in TargetLanguage::ALL {
        match generate_target(&programs, language, &Metadata::default()) {
            Err(Error::HeterogeneousEnum { name }) => assert_eq!(name, "Mixed"),
            other => panic!("{language}: expected HeterogeneousEnum, got {other:?}"),
        }
    }
}

#[test]
fn kotlin_files_share_the_project_package() {
    let programs = programs(&greeter(), &["greeter.ts"], &ExposureConfig::default());
    let metadata = Metadata {
        name: "Acme Shop".into(),
        version: "2.0.0".into(),
    };
    let files = generate_target(&programs, TargetLanguage::Kotlin, &metadata).unwrap();
    for file in &files {
        assert!(file.content.contains("package com.acmeshop.sdk\n"), "{}", file.path);
    }
    let runtime = files.iter().find(|f| f.path == "remote.kt").unwrap();
    assert!(runtime.content.contains("Runtime for Acme Shop 2.0.0."));
}
