//! Prompt rendering with Handlebars.
//!
//! Two templates are registered: `system` and `user`. Both are rendered
//! against the same data:
//! - `context`: the loaded context document
//! - `search_space`: `{count, compositions, description}`
//! - `format_instructions`: the expected reply layout
//!
//! The `json` helper pretty-prints any value. The final prompt is the
//! system part, a `---` separator, then the user part.

use crate::collaborators::PromptBuilder;
use catalyst_core::{CatalystError, SearchSpace};
use catalyst_parse::ReplyFormat;
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde_json::{json, Value};
use std::path::Path;

const SYSTEM: &str = "system";
const USER: &str = "user";
const SEPARATOR: &str = "\n\n---\n\n";

handlebars_helper!(json_helper: |value: Json| serde_json::to_string_pretty(value).unwrap_or_default());

pub struct TemplatePrompt {
    handlebars: Handlebars<'static>,
    format: ReplyFormat,
}

impl TemplatePrompt {
    pub fn from_strings(system: &str, user: &str) -> Result<Self, CatalystError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // prompts are plain text, not HTML
        handlebars.register_escape_fn(no_escape);
        handlebars.register_helper("json", Box::new(json_helper));

        for (name, template) in [(SYSTEM, system), (USER, user)] {
            handlebars
                .register_template_string(name, template)
                .map_err(|e| CatalystError::TemplateError(format!("{}: {}", name, e)))?;
        }

        Ok(Self {
            handlebars,
            format: ReplyFormat::Analysis,
        })
    }

    pub fn from_files(system: &Path, user: &Path) -> Result<Self, CatalystError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path)
                .map_err(|e| CatalystError::TemplateError(format!("{}: {}", path.display(), e)))
        };
        Self::from_strings(&read(system)?, &read(user)?)
    }

    /// Reply layout injected as `format_instructions` (default: analysis)
    pub fn with_format(mut self, format: ReplyFormat) -> Self {
        self.format = format;
        self
    }

    fn render(&self, name: &str, data: &Value) -> Result<String, CatalystError> {
        self.handlebars
            .render(name, data)
            .map_err(|e| CatalystError::TemplateError(format!("{}: {}", name, e)))
    }
}

impl PromptBuilder for TemplatePrompt {
    fn build_prompt(&self, context: &Value, search_space: &SearchSpace) -> Result<String, CatalystError> {
        let data = json!({
            "context": context,
            "search_space": search_space,
            "format_instructions": self.format.instructions(),
        });
        let system = self.render(SYSTEM, &data)?;
        let user = self.render(USER, &data)?;
        Ok(format!("{}{}{}", system.trim_end(), SEPARATOR, user.trim_end()))
    }
}
