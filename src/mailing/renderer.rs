//! Template compilation and rendering on top of minijinja

use std::borrow::Cow;
use std::fmt;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment};

use super::types::{MailingError, MailingResult, TemplateSet, TemplateSyntax};

/// Compiled form of a [`TemplateSet`].
///
/// Templates are parsed once when built; rendering only evaluates them.
pub struct TemplateRenderer {
    env: Environment<'static>,
    names: Vec<String>,
}

impl fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("templates", &self.names)
            .finish()
    }
}

impl TemplateRenderer {
    /// Compile every template in the set using the given delimiter syntax
    pub fn compile(templates: &TemplateSet, syntax: TemplateSyntax) -> MailingResult<Self> {
        let mut env = Environment::new();

        if let Some(config) = syntax_config(syntax)? {
            env.set_syntax(config);
        }

        // Mail bodies are emitted as-is; escaping is up to the caller
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        for (name, source) in templates.iter() {
            env.add_template_owned(name.clone(), normalize_source(source, syntax).into_owned())
                .map_err(|err| MailingError::TemplateSyntax {
                    name: name.clone(),
                    source: err,
                })?;
        }

        Ok(Self {
            env,
            names: templates.names(),
        })
    }

    /// Render a compiled template against a serializable context
    pub fn render<S: serde::Serialize>(&self, name: &str, values: S) -> MailingResult<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|_| MailingError::TemplateNotFound(name.to_string()))?;

        template.render(values).map_err(|source| MailingError::Render {
            name: name.to_string(),
            source,
        })
    }
}

/// Output is never escaped, so the raw `<%-` tag is the same as `<%=`.
fn normalize_source(source: &str, syntax: TemplateSyntax) -> Cow<'_, str> {
    match syntax {
        TemplateSyntax::Ejs if source.contains("<%-") => Cow::Owned(source.replace("<%-", "<%=")),
        _ => Cow::Borrowed(source),
    }
}

fn syntax_config(syntax: TemplateSyntax) -> MailingResult<Option<SyntaxConfig>> {
    match syntax {
        TemplateSyntax::Jinja => Ok(None),
        TemplateSyntax::Ejs => SyntaxConfig::builder()
            .block_delimiters("<%", "%>")
            .variable_delimiters("<%=", "%>")
            .comment_delimiters("<%#", "%>")
            .build()
            .map(Some)
            .map_err(MailingError::InvalidSyntax),
    }
}
