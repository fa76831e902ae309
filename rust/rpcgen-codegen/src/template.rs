use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use rpcgen_types::{Error, Result};
use serde::Serialize;

use crate::targets::TargetLanguage;

/// Renders one template against a fully built view.
///
/// Templates are plain text: no auto-escaping, and a missing variable is an
/// error rather than an empty string.
pub(crate) fn render<S: Serialize>(
    language: TargetLanguage,
    name: &'static str,
    source: &'static str,
    view: S,
) -> Result<String> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let fail = |e: minijinja::Error| Error::Render {
        target: language.to_string(),
        message: format!("{name}: {e}"),
    };
    env.add_template(name, source).map_err(fail)?;
    env.get_template(name).map_err(fail)?.render(view).map_err(fail)
}
