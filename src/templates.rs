//! Template rendering collaborator.
//!
//! Wraps a `minijinja::Environment` loaded once from a template directory at
//! startup. Every file under the directory is registered under its relative
//! path, so `render("blog/detail.html", ctx)` works for nested layouts and
//! `{% include %}`/`{% extends %}` resolve between them.

use crate::error::TemplateError;
use minijinja::Environment;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Load every template file under `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        let base = dir.as_ref().to_path_buf();
        let mut count = 0usize;
        let mut stack = vec![base.clone()];
        while let Some(current) = stack.pop() {
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                let name = template_name(&base, &path);
                let source = fs::read_to_string(&path)?;
                env.add_template_owned(name.clone(), source)
                    .map_err(|source| TemplateError::Engine { name, source })?;
                count += 1;
            }
        }
        info!(dir = %base.display(), templates = count, "Template environment loaded");
        Ok(Self { env })
    }

    /// Render `name` with the given context.
    pub fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        let template = self.env.get_template(name).map_err(|source| {
            TemplateError::Engine {
                name: name.to_string(),
                source,
            }
        })?;
        template.render(context).map_err(|source| TemplateError::Engine {
            name: name.to_string(),
            source,
        })
    }
}

fn template_name(base: &PathBuf, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
