use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "hr";
pub const DEFAULT_INCLUDE: &str = "hardware_registers.hpp";
pub const DEFAULT_OUTPUT: &str = "header.hpp";

#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub output: Option<String>,
    pub source_type: SourceType,
    pub strict: bool,
    pub log_level: Option<String>,
    pub namespace: Option<String>,
    pub include: Option<String>,
    pub instance_rule: InstanceRule,
    pub emit_directives: bool,
}

impl Config {
    /// Alias under which the `hardware_registers` runtime is referenced
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn include(&self) -> &str {
        self.include.as_deref().unwrap_or(DEFAULT_INCLUDE)
    }

    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or(DEFAULT_OUTPUT)
    }
}

/// Decides whether a peripheral is one numbered instance of a family
/// (`TC1`, `TC2`, ...). Constants are not emitted for such peripherals
/// since every instance would define the same names.
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InstanceRule {
    /// Name ends in `0`-`9`
    #[default]
    TrailingDigit,
    /// Name ends in `1`-`9`
    TrailingNonzeroDigit,
    /// No peripheral is treated as an instance
    Never,
}

impl InstanceRule {
    pub fn is_instance(&self, peripheral_name: &str) -> bool {
        let last = peripheral_name.chars().last();
        match self {
            Self::TrailingDigit => last.is_some_and(|c| c.is_ascii_digit()),
            Self::TrailingNonzeroDigit => last.is_some_and(|c| matches!(c, '1'..='9')),
            Self::Never => false,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SourceType {
    #[default]
    Xml,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "json")]
    Json,
}

impl SourceType {
    /// Make a new [`SourceType`] from a given extension.
    pub fn from_extension(s: &str) -> Option<Self> {
        match s {
            "svd" | "xml" => Some(Self::Xml),
            #[cfg(feature = "yaml")]
            "yml" | "yaml" => Some(Self::Yaml),
            #[cfg(feature = "json")]
            "json" => Some(Self::Json),
            _ => None,
        }
    }
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_rules() {
        assert!(InstanceRule::TrailingDigit.is_instance("TC1"));
        assert!(InstanceRule::TrailingDigit.is_instance("UART0"));
        assert!(!InstanceRule::TrailingDigit.is_instance("TC"));
        assert!(!InstanceRule::TrailingDigit.is_instance(""));

        assert!(InstanceRule::TrailingNonzeroDigit.is_instance("TC1"));
        assert!(!InstanceRule::TrailingNonzeroDigit.is_instance("UART0"));

        assert!(!InstanceRule::Never.is_instance("TC1"));
    }

    #[cfg(feature = "json")]
    #[test]
    fn instance_rule_from_config() {
        let config: Config =
            serde_json::from_str(r#"{ "instance_rule": "trailing-nonzero-digit" }"#).unwrap();
        assert_eq!(config.instance_rule, InstanceRule::TrailingNonzeroDigit);
        assert!(serde_json::from_str::<Config>(r#"{ "instance_rule": "sometimes" }"#).is_err());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.namespace(), "hr");
        assert_eq!(config.include(), "hardware_registers.hpp");
        assert_eq!(config.output(), "header.hpp");
        assert_eq!(config.instance_rule, InstanceRule::TrailingDigit);
    }

    #[test]
    fn source_type_from_path() {
        assert_eq!(SourceType::from_path(Path::new("chip.svd")), SourceType::Xml);
        assert_eq!(SourceType::from_path(Path::new("chip")), SourceType::Xml);
        #[cfg(feature = "yaml")]
        assert_eq!(SourceType::from_path(Path::new("chip.yaml")), SourceType::Yaml);
    }
}
