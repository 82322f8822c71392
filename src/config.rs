use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toml::Table;

fn default_enabled() -> bool {
    true
}

/// Administrative toggle for the typeset stage. When disabled, both page
/// hooks are no-ops and no per-build state is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesetConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        TypesetConfig { enabled: true }
    }
}

/// Markdown pipeline configuration as supplied by the host build: a set of
/// extension names plus a per-extension option table.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub extension_configs: BTreeMap<String, Table>,
}

impl MarkdownConfig {
    /// Derived copy for headline re-rendering. The toc extension's
    /// `anchorlink` and `permalink` options are forced off so that headings
    /// render with bare inner content; injected link markup would otherwise
    /// corrupt the downstream (id, title, level) extraction. All other
    /// extensions and options are left untouched.
    pub fn headline_variant(&self) -> MarkdownConfig {
        let mut derived = self.clone();
        let toc = derived
            .extension_configs
            .entry("toc".to_string())
            .or_default();
        toc.insert("anchorlink".to_string(), toml::Value::Boolean(false));
        toc.insert("permalink".to_string(), toml::Value::Boolean(false));
        derived
    }
}
