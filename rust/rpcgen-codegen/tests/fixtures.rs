//! Runs every parser fixture service through every target language. Each
//! target must succeed, produce exactly one runtime file and produce the same
//! bytes on a second run.

use std::path::Path;

use rpcgen_codegen::{Metadata, REMOTE_URL_PLACEHOLDER, TargetLanguage, generate_target};
use rpcgen_parse::{FsLoader, SourceFile, build_program};
use rpcgen_types::{ExposureConfig, Program};

const ROOT: &str = "../rpcgen-parse/tests/fixtures";

fn build(path: &Path) -> datatest_stable::Result<Program> {
    let text = std::fs::read_to_string(path)?.replace("\r\n", "\n");
    let relative = path
        .strip_prefix(ROOT)
        .map_err(|_| format!("{} is outside {ROOT}", path.display()))?;
    let relative = relative.to_string_lossy().replace('\\', "/");

    let loader = FsLoader::new(ROOT);
    let source = SourceFile::new(relative, text);
    build_program(&source, &loader, &ExposureConfig::default(), None)
        .map_err(|e| format!("failed to build {}: {e}", path.display()).into())
}

fn generate_fixture(path: &Path) -> datatest_stable::Result<()> {
    let programs = [build(path)?];
    let metadata = Metadata::default();

    for language in TargetLanguage::ALL {
        let first = generate_target(&programs, language, &metadata)
            .map_err(|e| format!("{language}: {e}"))?;
        let second = generate_target(&programs, language, &metadata)
            .map_err(|e| format!("{language}: {e}"))?;
        if first != second {
            return Err(format!("{language}: output differs between runs").into());
        }

        let runtime = language.emitter().runtime_path();
        let runtimes = first.iter().filter(|f| f.path == runtime).count();
        if runtimes != 1 {
            return Err(format!("{language}: {runtimes} runtime files").into());
        }

        for file in &first {
            if file.content.trim().is_empty() {
                return Err(format!("{language}: {} is empty", file.path).into());
            }
            if file.owner_class.is_some() && !file.content.contains(REMOTE_URL_PLACEHOLDER) {
                return Err(format!("{language}: {} has no URL placeholder", file.path).into());
            }
        }
    }
    Ok(())
}

datatest_stable::harness! {
    { test = generate_fixture, root = "../rpcgen-parse/tests/fixtures", pattern = r"\.service\.ts$" },
}
