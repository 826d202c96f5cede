//! Host-side lookup of converter providers by markup name.
//!
//! Names and aliases are matched case-insensitively, so front matter that says
//! `markup: RST` or a file with a `.rest` extension both land on the same
//! provider.

use crate::config::ProviderConfig;
use crate::converter::{Converter, DocumentContext, Provider, ProviderProvider};
use crate::error::ConverterError;
use crate::helper;
use crate::rst::{self, RstProvider};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Providers keyed by lowercase format name.
#[derive(Default, Clone)]
pub struct ConverterRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
    aliases: HashMap<String, String>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in format whose helper is usable here.
    ///
    /// Formats whose external dependency is missing are left out so the host
    /// never offers them. The probe looks for the programs `cfg` names, which
    /// are the ones the converter will run.
    pub fn with_defaults(cfg: ProviderConfig) -> Result<Self, ConverterError> {
        let mut registry = Self::new();
        if helper::locate(&cfg.helper.programs).is_some() {
            registry.with_provider_provider(&RstProvider::new(), cfg, rst::ALIASES)?;
        } else {
            info!(
                "None of [{}] found on PATH; reStructuredText support disabled",
                cfg.helper.programs.join(", ")
            );
        }
        Ok(registry)
    }

    /// Build a provider from `pp` and register it with `aliases`.
    pub fn with_provider_provider(
        &mut self,
        pp: &dyn ProviderProvider,
        cfg: ProviderConfig,
        aliases: &[&str],
    ) -> Result<&mut Self, ConverterError> {
        let provider = pp.new_provider(cfg)?;
        let name = provider.name().to_string();
        self.register(provider);
        for alias in aliases {
            self.register_alias(*alias, &name);
        }
        Ok(self)
    }

    /// Register `provider` under its own name, replacing any previous holder.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let key = provider.name().to_lowercase();
        if self.providers.insert(key.clone(), provider).is_some() {
            warn!("Replacing converter already registered as '{}'", key);
        }
    }

    /// Make `alias` resolve to the provider registered as `name`.
    pub fn register_alias(&mut self, alias: impl AsRef<str>, name: impl AsRef<str>) {
        self.aliases
            .insert(alias.as_ref().to_lowercase(), name.as_ref().to_lowercase());
    }

    /// Look a provider up by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let key = name.trim().to_lowercase();
        let key = self.aliases.get(&key).unwrap_or(&key);
        self.providers.get(key).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered format names, sorted. Aliases are not included.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Resolve `name` and create a converter for `ctx` in one step.
    pub fn converter_for(
        &self,
        name: &str,
        ctx: DocumentContext,
    ) -> Result<Box<dyn Converter>, ConverterError> {
        let provider = self.get(name).ok_or_else(|| ConverterError::UnknownFormat {
            name: name.to_string(),
            known: self.names().join(", "),
        })?;
        provider.new_converter_for(ctx)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("providers", &self.names())
            .field("aliases", &self.aliases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConvertResult, FnProvider, Identity, RenderContext};
    use crate::helper::HelperOutcome;

    struct Upper;

    impl Converter for Upper {
        fn convert(&self, ctx: &RenderContext<'_>) -> Result<ConvertResult, ConverterError> {
            Ok(ctx.src.to_ascii_uppercase().into())
        }

        fn supports(&self, _feature: &Identity) -> bool {
            false
        }
    }

    fn upper(name: &str) -> Arc<dyn Provider> {
        Arc::new(FnProvider::new(name, |_| Ok(Box::new(Upper) as Box<dyn Converter>)))
    }

    fn stub_rst() -> RstProvider {
        RstProvider::with_helper(|src: &[u8]| HelperOutcome::Success(src.to_vec()))
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut r = ConverterRegistry::new();
        r.register(upper("Shout"));
        assert!(r.contains("shout"));
        assert!(r.contains("SHOUT"));
        assert!(r.contains(" shout "));
        assert_eq!(r.names(), vec!["shout"]);
    }

    #[test]
    fn rst_aliases_resolve() {
        let mut r = ConverterRegistry::new();
        r.with_provider_provider(&stub_rst(), ProviderConfig::default(), rst::ALIASES)
            .unwrap();

        for name in ["rst", "REST", "reStructuredText"] {
            assert_eq!(r.get(name).unwrap().name(), "rst", "lookup of {name}");
        }
        assert_eq!(r.names(), vec!["rst"]);
    }

    #[test]
    fn unknown_format_lists_known() {
        let mut r = ConverterRegistry::new();
        r.register(upper("shout"));
        r.with_provider_provider(&stub_rst(), ProviderConfig::default(), &[])
            .unwrap();

        match r.converter_for("asciidoc", DocumentContext::new("a.adoc")) {
            Err(ConverterError::UnknownFormat { name, known }) => {
                assert_eq!(name, "asciidoc");
                assert_eq!(known, "rst, shout");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("asciidoc should not resolve"),
        }
    }

    #[test]
    fn converter_for_dispatches() {
        let mut r = ConverterRegistry::new();
        r.register(upper("shout"));
        let c = r.converter_for("shout", DocumentContext::new("x")).unwrap();
        assert_eq!(c.convert(&RenderContext::new(b"hi")).unwrap().bytes(), b"HI");
    }

    #[test]
    fn re_registering_replaces() {
        let mut r = ConverterRegistry::new();
        r.register(upper("shout"));
        r.register(Arc::new(FnProvider::new("shout", |_| {
            Err(ConverterError::Internal("replaced".into()))
        })));
        assert_eq!(r.names().len(), 1);
        assert!(r.converter_for("shout", DocumentContext::new("x")).is_err());
    }

    #[test]
    fn defaults_skip_rst_when_configured_program_is_missing() {
        let cfg = ProviderConfig::builder()
            .programs(["rst2html-not-installed-anywhere"])
            .build()
            .unwrap();
        let r = ConverterRegistry::with_defaults(cfg).unwrap();
        assert!(!r.contains("rst"));
        assert!(r.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn defaults_probe_the_configured_program() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("my-rst2html");
        std::fs::write(&program, "#!/bin/sh\ncat\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let cfg = ProviderConfig::builder()
            .programs([program.display().to_string()])
            .build()
            .unwrap();
        let r = ConverterRegistry::with_defaults(cfg).unwrap();
        assert!(r.contains("rst"));
        assert!(r.contains("restructuredtext"));
    }
}
