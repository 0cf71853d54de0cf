//! Name and MIME type lookup for modes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::builtin::NullMode;
use super::{Mode, ModeConfig};

/// Name of the fallback mode every registry carries.
const NULL_MODE: &str = "null";

/// Longest chain of MIME aliases followed before giving up.
const MAX_MIME_HOPS: usize = 8;

/// Builds a fresh mode instance for a resolved spec.
pub type ModeFactory = Arc<dyn Fn(&ModeConfig, &ModeSpec) -> Box<dyn Mode> + Send + Sync>;

/// Request for a mode, either a bare name or a name plus options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSpec {
    ByName(String),
    BySpec {
        name: Option<String>,
        options: BTreeMap<String, String>,
    },
}

impl ModeSpec {
    /// Mode name this spec asks for. Specs without a name ask for `null`.
    pub fn name(&self) -> &str {
        match self {
            ModeSpec::ByName(name) => name,
            ModeSpec::BySpec { name, .. } => name.as_deref().unwrap_or(NULL_MODE),
        }
    }

    /// Option value carried by a `BySpec`.
    pub fn option(&self, key: &str) -> Option<&str> {
        match self {
            ModeSpec::ByName(_) => None,
            ModeSpec::BySpec { options, .. } => options.get(key).map(String::as_str),
        }
    }
}

impl From<&str> for ModeSpec {
    fn from(name: &str) -> Self {
        ModeSpec::ByName(name.to_string())
    }
}

impl From<String> for ModeSpec {
    fn from(name: String) -> Self {
        ModeSpec::ByName(name)
    }
}

/// Maps mode names to factories and MIME types to specs.
///
/// Registration overwrites silently: the last factory registered under a
/// name wins. Lookups never fail; unknown names resolve to the `null` mode.
pub struct ModeRegistry {
    modes: HashMap<String, ModeFactory>,
    mime_types: HashMap<String, ModeSpec>,
}

impl ModeRegistry {
    /// Creates a registry holding only the `null` mode.
    pub fn new() -> Self {
        let mut registry = Self {
            modes: HashMap::new(),
            mime_types: HashMap::new(),
        };
        registry.register_mode(NULL_MODE, |_, _| Box::new(NullMode));
        registry
    }

    /// Registers a mode factory under `name`.
    ///
    /// # Arguments
    ///
    /// * `name`: Mode name, replacing any earlier registration
    /// * `factory`: Builds a fresh mode from the run config and the spec
    ///   that asked for it, so options in the spec reach the mode
    pub fn register_mode<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ModeConfig, &ModeSpec) -> Box<dyn Mode> + Send + Sync + 'static,
    {
        self.modes.insert(name.into(), Arc::new(factory));
    }

    /// Registers an already shared factory, e.g. one reused under aliases.
    pub fn register_factory(&mut self, name: impl Into<String>, factory: ModeFactory) {
        self.modes.insert(name.into(), factory);
    }

    /// Maps a MIME type onto a mode spec, which may name another MIME type.
    pub fn register_mime_type(&mut self, mime: impl Into<String>, spec: impl Into<ModeSpec>) {
        self.mime_types.insert(mime.into(), spec.into());
    }

    pub fn has_mode(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    pub fn mime_spec(&self, mime: &str) -> Option<&ModeSpec> {
        self.mime_types.get(mime)
    }

    /// Registered mode names, sorted.
    pub fn mode_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.modes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the mode `spec` asks for.
    ///
    /// Names that are not modes are tried as MIME types, following MIME
    /// aliases for a bounded number of hops.
    ///
    /// # Arguments
    ///
    /// * `config`: Settings handed to the factory
    /// * `spec`: Mode name or MIME type, with options
    ///
    /// # Returns
    ///
    /// The resolved mode, or the `null` mode when nothing matches. Lookup
    /// never fails.
    pub fn resolve(&self, config: &ModeConfig, spec: &ModeSpec) -> Box<dyn Mode> {
        let mut current = spec;
        for _ in 0..MAX_MIME_HOPS {
            if let Some(factory) = self.modes.get(current.name()) {
                return factory(config, current);
            }
            match self.mime_types.get(current.name()) {
                Some(next) => current = next,
                None => break,
            }
        }

        tracing::debug!("No mode registered for {:?}, using null mode", spec.name());
        Box::new(NullMode)
    }
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeRegistry")
            .field("modes", &self.mode_names())
            .field("mime_types", &self.mime_types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::mode::{ScanCursor, Tokenizer};

    struct Tagged(&'static str);

    impl Tokenizer for Tagged {
        type State = ();

        fn name(&self) -> &str {
            self.0
        }

        fn start_state(&self) {}

        fn token(&self, cursor: &mut ScanCursor<'_>, _state: &mut ()) -> Result<Option<String>> {
            cursor.skip_to_end();
            Ok(Some(self.0.to_string()))
        }
    }

    #[test]
    fn test_new_registry_has_null_mode() {
        // Arrange & Act
        let registry = ModeRegistry::new();

        // Assert
        assert!(registry.has_mode("null"));
        assert_eq!(registry.mode_names(), vec!["null"]);
    }

    #[test]
    fn test_resolve_by_name() {
        // Arrange
        let mut registry = ModeRegistry::new();
        registry.register_mode("alpha", |_, _| Box::new(Tagged("alpha")));

        // Act
        let mode = registry.resolve(&ModeConfig::default(), &"alpha".into());

        // Assert
        assert_eq!(mode.name(), "alpha");
    }

    #[test]
    fn test_last_registration_wins() {
        // Arrange
        let mut registry = ModeRegistry::new();
        registry.register_mode("lang", |_, _| Box::new(Tagged("first")));
        registry.register_mode("lang", |_, _| Box::new(Tagged("second")));

        // Act
        let mode = registry.resolve(&ModeConfig::default(), &"lang".into());

        // Assert
        assert_eq!(mode.name(), "second");
    }

    #[test]
    fn test_unknown_mode_falls_back_to_null() {
        // Arrange
        let registry = ModeRegistry::new();

        // Act
        let mode = registry.resolve(&ModeConfig::default(), &"no-such-lang".into());

        // Assert
        assert_eq!(mode.name(), "null");
    }

    #[test]
    fn test_spec_without_name_resolves_null() {
        // Arrange
        let registry = ModeRegistry::new();
        let spec = ModeSpec::BySpec {
            name: None,
            options: BTreeMap::new(),
        };

        // Act
        let mode = registry.resolve(&ModeConfig::default(), &spec);

        // Assert
        assert_eq!(spec.name(), "null");
        assert_eq!(mode.name(), "null");
    }

    #[test]
    fn test_factory_receives_spec_options_and_config() {
        // Arrange
        let mut registry = ModeRegistry::new();
        registry.register_mode("opts", |config, spec| {
            let tag = match (spec.option("flavor"), config.tab_size) {
                (Some("spicy"), 2) => "spicy-2",
                _ => "plain",
            };
            Box::new(Tagged(tag))
        });
        let spec = ModeSpec::BySpec {
            name: Some("opts".to_string()),
            options: BTreeMap::from([("flavor".to_string(), "spicy".to_string())]),
        };

        // Act
        let mode = registry.resolve(&ModeConfig { tab_size: 2 }, &spec);

        // Assert
        assert_eq!(mode.name(), "spicy-2");
    }

    #[test]
    fn test_resolve_through_mime_type() {
        // Arrange
        let mut registry = ModeRegistry::new();
        registry.register_mode("rust", |_, _| Box::new(Tagged("rust")));
        registry.register_mime_type("text/x-rustsrc", "rust");
        registry.register_mime_type("text/rust-alias", "text/x-rustsrc");

        // Act
        let direct = registry.resolve(&ModeConfig::default(), &"text/x-rustsrc".into());
        let chained = registry.resolve(&ModeConfig::default(), &"text/rust-alias".into());

        // Assert
        assert_eq!(direct.name(), "rust");
        assert_eq!(chained.name(), "rust");
        assert_eq!(
            registry.mime_spec("text/x-rustsrc"),
            Some(&ModeSpec::ByName("rust".to_string()))
        );
    }

    #[test]
    fn test_self_referencing_mime_type_terminates() {
        // Arrange
        let mut registry = ModeRegistry::new();
        registry.register_mime_type("text/loop", "text/loop");

        // Act
        let mode = registry.resolve(&ModeConfig::default(), &"text/loop".into());

        // Assert
        assert_eq!(mode.name(), "null");
    }
}
