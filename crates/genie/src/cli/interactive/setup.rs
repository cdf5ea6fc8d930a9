//! Provider key setup: detection, input, and optional persistence.

use console::Style;
use dialoguer::{Password, Select};
use genie_core::config::{ProviderConfig, ProviderKind};
use genie_core::llm::resolve_env_var;
use genie_core::Config;
use std::path::Path;
use toml_edit::{value, ArrayOfTables, DocumentMut, Item, Table};

use super::theme::genie_theme;

/// Whether an entry's key resolves (inline, or from a set environment variable).
pub(crate) fn has_usable_key(provider: &ProviderConfig) -> bool {
    resolve_env_var(&provider.api_key).is_some()
}

/// Make sure at least one enabled provider can authenticate.
///
/// When none can, asks the seller for a key and offers to save it. Returns
/// `false` if they cancel.
pub fn ensure_provider_key(config: &mut Config) -> anyhow::Result<bool> {
    if config.enabled_providers().any(has_usable_key) {
        return Ok(true);
    }

    let theme = genie_theme();
    let dim = Style::new().for_stderr().dim();
    let warn = Style::new().for_stderr().yellow();

    let mut kinds: Vec<ProviderKind> = Vec::new();
    for provider in config.enabled_providers() {
        if !kinds.contains(&provider.kind) {
            kinds.push(provider.kind);
        }
    }
    if kinds.is_empty() {
        eprintln!(
            "  {}",
            warn.apply_to("No providers are enabled. Edit the [[providers]] section of your config.")
        );
        return Ok(false);
    }

    let env_vars: Vec<&str> = kinds.iter().map(|k| k.env_var()).collect();
    eprintln!(
        "  {}",
        warn.apply_to(format!("No API key found ({} not set).", env_vars.join(", ")))
    );

    let labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
    let Some(choice) = Select::with_theme(&theme)
        .with_prompt("Which provider do you have a key for?")
        .items(&labels)
        .default(0)
        .interact_opt()?
    else {
        return Ok(false);
    };
    let kind = kinds[choice];

    let key: String = match Password::with_theme(&theme)
        .with_prompt(format!("Enter your {} API key", kind.label()))
        .allow_empty_password(true)
        .interact()
    {
        Ok(k) if !k.trim().is_empty() => k.trim().to_string(),
        _ => return Ok(false),
    };

    let save_options = &["Yes, save to config file", "No, use for this session only"];
    let save_choice = Select::with_theme(&theme)
        .with_prompt("Save this key for future sessions?")
        .items(save_options)
        .default(0)
        .interact_opt()?;

    match save_choice {
        Some(0) => {
            let path = Config::default_path();
            match save_key_to_path(&path, kind, &key) {
                Ok(()) => eprintln!(
                    "  {}",
                    dim.apply_to(format!("Key saved to {}", path.display()))
                ),
                Err(e) => {
                    eprintln!("  {}", warn.apply_to(format!("Could not save to config: {e}")));
                    eprintln!("  Using key for this session only.");
                }
            }
        }
        Some(1) => {}
        _ => return Ok(false),
    }

    for provider in config.providers.iter_mut().filter(|p| p.kind == kind) {
        provider.api_key = key.clone();
    }
    Ok(true)
}

/// Write `key` into the config file at `path`, preserving existing comments.
pub(crate) fn save_key_to_path(path: &Path, kind: ProviderKind, key: &str) -> anyhow::Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content.parse()?;
    set_provider_key(&mut doc, kind, key)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())?;
    Ok(())
}

/// Set `api_key` on every `[[providers]]` entry of `kind`.
///
/// A document without a providers array gets the default chain written out
/// first, since a partial array would replace the whole default chain.
pub(crate) fn set_provider_key(
    doc: &mut DocumentMut,
    kind: ProviderKind,
    key: &str,
) -> anyhow::Result<()> {
    if !doc.contains_key("providers") {
        let mut chain = ArrayOfTables::new();
        for provider in ProviderConfig::default_chain() {
            chain.push(provider_table(&provider));
        }
        doc["providers"] = Item::ArrayOfTables(chain);
    }

    let Some(chain) = doc["providers"].as_array_of_tables_mut() else {
        anyhow::bail!("`providers` in the config file is not a [[providers]] array");
    };

    let kind_name = kind.to_string();
    let mut updated = false;
    for table in chain.iter_mut() {
        if table.get("kind").and_then(|k| k.as_str()) == Some(kind_name.as_str()) {
            table["api_key"] = value(key);
            updated = true;
        }
    }

    if !updated {
        let mut provider = ProviderConfig::default_chain()
            .into_iter()
            .find(|p| p.kind == kind)
            .unwrap_or_else(|| ProviderConfig::new(kind, ""));
        provider.api_key = key.to_string();
        chain.push(provider_table(&provider));
    }
    Ok(())
}

fn provider_table(provider: &ProviderConfig) -> Table {
    let mut table = Table::new();
    table["kind"] = value(provider.kind.to_string());
    table["model"] = value(provider.model.as_str());
    table["api_key"] = value(provider.api_key.as_str());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── has_usable_key ──────────────────────────────────────────────────

    #[test]
    fn usable_key_inline() {
        let provider = ProviderConfig {
            api_key: "xai-key".to_string(),
            ..ProviderConfig::new(ProviderKind::Grok, "grok-2-vision-1212")
        };
        assert!(has_usable_key(&provider));
    }

    #[test]
    fn usable_key_unset_env_reference() {
        let provider = ProviderConfig {
            api_key: "${GENIE_TEST_SURELY_UNSET_VAR}".to_string(),
            ..ProviderConfig::new(ProviderKind::Gemini, "gemini-2.5-flash")
        };
        assert!(!has_usable_key(&provider));
    }

    // ── set_provider_key ────────────────────────────────────────────────

    #[test]
    fn set_key_on_empty_document_writes_full_chain() {
        let mut doc = DocumentMut::new();
        set_provider_key(&mut doc, ProviderKind::Groq, "gsk_123").unwrap();

        let config = Config::from_toml(&doc.to_string()).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[0].api_key, "${GEMINI_API_KEY}");
        assert_eq!(config.providers[1].kind, ProviderKind::Groq);
        assert_eq!(config.providers[1].api_key, "gsk_123");
    }

    #[test]
    fn set_key_preserves_comments_and_other_entries() {
        let mut doc: DocumentMut = r#"# my settings
[inference]
max_attempts = 5 # be patient

[[providers]]
kind = "gemini"
model = "gemini-2.5-pro"
api_key = "${GEMINI_API_KEY}"
"#
        .parse()
        .unwrap();
        set_provider_key(&mut doc, ProviderKind::Gemini, "AIza-abc").unwrap();

        let text = doc.to_string();
        assert!(text.contains("# my settings"));
        assert!(text.contains("# be patient"));
        let config = Config::from_toml(&text).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].model, "gemini-2.5-pro");
        assert_eq!(config.providers[0].api_key, "AIza-abc");
    }

    #[test]
    fn set_key_appends_missing_kind() {
        let mut doc: DocumentMut = r#"[[providers]]
kind = "gemini"
model = "gemini-2.5-flash"
api_key = "${GEMINI_API_KEY}"
"#
        .parse()
        .unwrap();
        set_provider_key(&mut doc, ProviderKind::Grok, "xai-1").unwrap();

        let config = Config::from_toml(&doc.to_string()).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[1].kind, ProviderKind::Grok);
        assert_eq!(config.providers[1].model, "grok-2-vision-1212");
    }

    #[test]
    fn set_key_rejects_inline_array() {
        let mut doc: DocumentMut = "providers = []\n".parse().unwrap();
        assert!(set_provider_key(&mut doc, ProviderKind::Groq, "k").is_err());
    }

    #[test]
    fn save_key_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        save_key_to_path(&path, ProviderKind::Gemini, "AIza-xyz").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.providers[0].api_key, "AIza-xyz");
    }
}
