//! Ordered substitution rules built from a [`PatchConfig`].
//!
//! Rule order carries meaning: broad literal substitutions come first, targeted
//! structural rewrites next, and the native-library restoration rules last so
//! they repair anything the earlier rules damaged.

use regex::{NoExpand, Regex};
use std::borrow::Cow;

use crate::config::PatchConfig;
use crate::error::{Error, Result};

/// Name passed to `System.loadLibrary` for the bundled native library.
pub const NATIVE_LIBRARY: &str = "rustdesk";
/// Shared object filename of the bundled native library.
pub const NATIVE_LIBRARY_FILE: &str = "librustdesk.so";
/// Brand token that has historically leaked into native library references.
pub const FALLBACK_BRAND: &str = "todddesk";
/// Display name of the upstream app, as it appears in UI strings and resource ids.
pub const UPSTREAM_APP_NAME: &str = "RustDesk";

const LOG_TAG_PATTERN: &str = r#""input\s+service""#;
const LOG_TAG_REPLACEMENT: &str = r#""Todd service""#;

/// Replacement text for a rule.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Inserted verbatim; `$` has no special meaning.
    Literal(String),
    /// Expanded against the pattern's capture groups (`${1}`).
    Template(String),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub label: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl Rule {
    pub fn new(label: &'static str, pattern: &str, replacement: Replacement) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            Error::internal_unexpected(format!("invalid pattern for rule '{}': {}", label, e))
        })?;
        Ok(Self {
            label,
            pattern,
            replacement,
        })
    }

    /// Exact-text substitution.
    pub fn literal(label: &'static str, from: &str, to: &str) -> Result<Self> {
        Self::new(
            label,
            &regex::escape(from),
            Replacement::Literal(to.to_string()),
        )
    }

    /// Substitution that only matches `word` as a complete identifier.
    pub fn word(label: &'static str, word: &str, to: &str) -> Result<Self> {
        Self::new(
            label,
            &format!(r"\b{}\b", regex::escape(word)),
            Replacement::Literal(to.to_string()),
        )
    }

    /// Apply the rule to `text`, borrowing when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.replacement {
            Replacement::Literal(to) => self.pattern.replace_all(text, NoExpand(to.as_str())),
            Replacement::Template(to) => self.pattern.replace_all(text, to.as_str()),
        }
    }
}

/// Apply every rule in order.
pub fn apply_rules(rules: &[Rule], text: &str) -> String {
    let mut current = text.to_string();
    for rule in rules {
        let next = match rule.apply(&current) {
            Cow::Borrowed(_) => None,
            Cow::Owned(replaced) => Some(replaced),
        };
        if let Some(next) = next {
            current = next;
        }
    }
    current
}

/// Escape `$` so a configured value survives template expansion untouched.
fn escape_template(value: &str) -> String {
    value.replace('$', "$$")
}

/// Rewrite the body of `<string name="NAME">...</string>`, spanning lines.
fn string_resource(label: &'static str, name: &str, value: &str) -> Result<Rule> {
    Rule::new(
        label,
        &format!(
            r#"(?s)(<string\s+name="{}">).*?(</string>)"#,
            regex::escape(name)
        ),
        Replacement::Template(format!("${{1}}{}${{2}}", escape_template(value))),
    )
}

/// Build the ordered rule list for one rebrand run.
pub fn build_rules(cfg: &PatchConfig) -> Result<Vec<Rule>> {
    let mut rules = Vec::new();

    // Package and display name are distinctive enough to replace everywhere.
    // The scheme is not: it is a substring of the native library name.
    rules.push(Rule::literal("package", &cfg.old_package, &cfg.new_package)?);
    rules.push(Rule::literal("app-name", &cfg.old_app_name, &cfg.new_app_name)?);

    rules.push(string_resource(
        "accessibility-description",
        "accessibility_service_description",
        &cfg.accessibility_desc,
    )?);
    rules.push(string_resource("app-name-resource", "app_name", &cfg.new_app_name)?);

    rules.push(Rule::literal(
        "service-attribute",
        &format!(r#"android:name=".{}""#, cfg.old_service),
        &format!(r#"android:name=".{}""#, cfg.new_service),
    )?);
    rules.push(Rule::word("service-class", &cfg.old_service, &cfg.new_service)?);

    // UI phrases and the generated show-button id are keyed on the upstream
    // brand, whatever the configured old app name is.
    // Longer phrases first: "Service Channel" must win over "Service".
    let new = &cfg.new_app_name;
    let phrases = [
        ("Input", format!("{} Input", new)),
        ("Service Channel", format!("{} Service Channel", new)),
        ("Service", format!("{} Service", new)),
    ];
    for (qualifier, to) in &phrases {
        let from = format!("{} {}", UPSTREAM_APP_NAME, qualifier);
        rules.push(Rule::literal("ui-phrase", &from, to)?);
    }
    rules.push(Rule::literal(
        "ui-phrase",
        &format!("Show {}", UPSTREAM_APP_NAME),
        &format!("Show {}", new),
    )?);

    rules.push(Rule::new(
        "log-tag",
        LOG_TAG_PATTERN,
        Replacement::Literal(LOG_TAG_REPLACEMENT.to_string()),
    )?);
    rules.push(Rule::word(
        "show-resource-id",
        &format!("idShow{}", UPSTREAM_APP_NAME),
        &format!("idShow{}", new),
    )?);

    rules.push(Rule::literal(
        "scheme-attribute",
        &format!(r#"android:scheme="{}""#, cfg.old_scheme),
        &format!(r#"android:scheme="{}""#, cfg.new_scheme),
    )?);
    rules.push(Rule::literal(
        "scheme-uri",
        &format!("{}://", cfg.old_scheme),
        &format!("{}://", cfg.new_scheme),
    )?);

    rules.extend(native_library_guards(cfg)?);

    Ok(rules)
}

/// `text` after the unconditional package and app-name substitutions.
fn after_global_rules(cfg: &PatchConfig, text: &str) -> String {
    text.replace(&cfg.old_package, &cfg.new_package)
        .replace(&cfg.old_app_name, &cfg.new_app_name)
}

/// Restoration rules for the native library name. Always last.
fn native_library_guards(cfg: &PatchConfig) -> Result<Vec<Rule>> {
    let mut names: Vec<String> = vec![
        cfg.old_scheme.clone(),
        cfg.new_scheme.clone(),
        cfg.old_app_name.clone(),
        cfg.new_app_name.clone(),
        NATIVE_LIBRARY.to_string(),
        FALLBACK_BRAND.to_string(),
        after_global_rules(cfg, NATIVE_LIBRARY),
    ];
    names.sort_unstable();
    names.dedup();
    let alternatives: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();

    let mut guards = vec![Rule::new(
        "native-load-call",
        &format!(
            r#"System\.loadLibrary\("(?:{})"\)"#,
            alternatives.join("|")
        ),
        Replacement::Literal(format!(r#"System.loadLibrary("{}")"#, NATIVE_LIBRARY)),
    )?];

    let mut leaked: Vec<String> = [cfg.new_scheme.as_str(), cfg.new_app_name.as_str(), FALLBACK_BRAND]
        .iter()
        .map(|name| format!("lib{}.so", name))
        .collect();
    leaked.push(after_global_rules(cfg, NATIVE_LIBRARY_FILE));
    leaked.sort_unstable();
    leaked.dedup();
    for file in leaked {
        if file == NATIVE_LIBRARY_FILE {
            continue;
        }
        guards.push(Rule::literal("native-library-file", &file, NATIVE_LIBRARY_FILE)?);
    }

    Ok(guards)
}
