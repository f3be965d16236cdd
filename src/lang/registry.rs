//! Adapter registry: language name and file extension lookup.
//!
//! A process-wide singleton maps canonical names, aliases and file
//! extensions to [`LanguageAdapter`] implementations. Aliases exist
//! because several surface names share one grammar: "javascript" and
//! "typescript" both resolve to the TypeScript adapter.

use std::path::Path;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::adapter::LanguageAdapter;
use crate::lang::{c, go, java, python, rust_lang, typescript};

static REGISTRY: Lazy<AdapterRegistry> = Lazy::new(AdapterRegistry::with_builtin_languages);

pub type BoxedAdapter = Box<dyn LanguageAdapter>;

/// Get the global registry singleton.
pub fn global() -> &'static AdapterRegistry {
    &REGISTRY
}

/// Maps language names, aliases and file extensions to adapters.
pub struct AdapterRegistry {
    by_name: FxHashMap<&'static str, BoxedAdapter>,
    by_ext: FxHashMap<&'static str, &'static str>,
    aliases: FxHashMap<&'static str, &'static str>,
}

impl AdapterRegistry {
    fn with_builtin_languages() -> Self {
        let mut registry = Self {
            by_name: FxHashMap::default(),
            by_ext: FxHashMap::default(),
            aliases: FxHashMap::default(),
        };

        registry.register(Box::new(python::Python));
        // TSX first so .tsx/.jsx stay claimed by the TSX grammar once
        // plain TypeScript registers the remaining extensions.
        registry.register(Box::new(typescript::TypeScript::tsx()));
        registry.register(Box::new(typescript::TypeScript::new()));
        registry.register(Box::new(go::Go));
        registry.register(Box::new(rust_lang::RustLang));
        registry.register(Box::new(java::Java));
        registry.register(Box::new(c::C));

        registry.register_alias("javascript", "typescript");
        registry.register_alias("js", "typescript");
        registry.register_alias("ts", "typescript");
        registry.register_alias("jsx", "tsx");
        registry.register_alias("py", "python");
        registry.register_alias("golang", "go");
        registry.register_alias("rs", "rust");

        registry
    }

    fn register(&mut self, adapter: BoxedAdapter) {
        let name = adapter.name();
        for ext in adapter.extensions() {
            self.by_ext.insert(*ext, name);
        }
        self.by_name.insert(name, adapter);
    }

    fn register_alias(&mut self, alias: &'static str, target: &'static str) {
        self.aliases.insert(alias, target);
    }

    /// Look up an adapter by canonical name or alias.
    pub fn get_by_name(&self, name: &str) -> Option<&dyn LanguageAdapter> {
        let canonical = self.aliases.get(name).copied().unwrap_or(name);
        self.by_name.get(canonical).map(|b| b.as_ref())
    }

    /// Look up an adapter by file extension, dot included (".py").
    pub fn get_by_extension(&self, ext: &str) -> Option<&dyn LanguageAdapter> {
        self.by_ext.get(ext).and_then(|name| self.get_by_name(name))
    }

    /// Auto-detect the language of a path from its extension.
    pub fn detect_language(&self, path: &Path) -> Option<&dyn LanguageAdapter> {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| format!(".{ext}"))
            .and_then(|ext| self.get_by_extension(&ext))
    }

    /// Canonical language names, aliases excluded.
    pub fn supported_languages(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.aliases.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_resolve() {
        let registry = global();
        for name in ["python", "typescript", "tsx", "go", "rust", "java", "c"] {
            assert!(registry.get_by_name(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_adapters() {
        let registry = global();
        assert_eq!(registry.get_by_name("javascript").unwrap().name(), "typescript");
        assert_eq!(registry.get_by_name("js").unwrap().name(), "typescript");
        assert_eq!(registry.get_by_name("jsx").unwrap().name(), "tsx");
        assert_eq!(registry.get_by_name("py").unwrap().name(), "python");
        assert_eq!(registry.get_by_name("rs").unwrap().name(), "rust");
    }

    #[test]
    fn extension_lookup() {
        let registry = global();
        assert_eq!(registry.get_by_extension(".py").unwrap().name(), "python");
        assert_eq!(registry.get_by_extension(".js").unwrap().name(), "typescript");
        assert_eq!(registry.get_by_extension(".jsx").unwrap().name(), "tsx");
        assert_eq!(registry.get_by_extension(".go").unwrap().name(), "go");
        assert!(registry.get_by_extension(".cob").is_none());
    }

    #[test]
    fn detect_language_from_path() {
        let registry = global();
        let adapter = registry.detect_language(Path::new("src/deep/module.rs"));
        assert_eq!(adapter.unwrap().name(), "rust");
        assert!(registry.detect_language(Path::new("README")).is_none());
    }

    #[test]
    fn supported_languages_excludes_aliases() {
        let names = global().supported_languages();
        assert!(names.contains(&"python"));
        assert!(!names.contains(&"js"));
        assert!(global().is_supported("js"));
        assert!(!global().is_supported("cobol"));
    }
}
