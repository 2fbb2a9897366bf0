/// Runtime switches for the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Reject an unterminated double quote instead of ending the token at end of line.
    pub strict_quotes: bool,
    /// Terminate the interpreter when a pipeline cannot be spawned.
    pub abort_on_spawn_failure: bool,
    pub prompt_color: bool,
    pub banner: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            strict_quotes: false,
            abort_on_spawn_failure: false,
            prompt_color: true,
            banner: true,
        }
    }
}

impl ShellConfig {
    /// Defaults with `MYSHELL_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg
    }

    /// Applies overrides from any key lookup. `from_env` passes the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MYSHELL_STRICT_QUOTES") {
            self.strict_quotes = parse_bool(&v);
        }
        if let Some(v) = lookup("MYSHELL_ABORT_ON_SPAWN_FAILURE") {
            self.abort_on_spawn_failure = parse_bool(&v);
        }
        if let Some(v) = lookup("MYSHELL_PROMPT_COLOR") {
            self.prompt_color = parse_bool(&v);
        }
        if let Some(v) = lookup("MYSHELL_BANNER") {
            self.banner = parse_bool(&v);
        }
        tracing::debug!(config = ?self, "configuration loaded");
    }
}

fn parse_bool(value: &str) -> bool {
    !["0", "false", "no", "off"].contains(&value.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_values() {
        let cfg = ShellConfig::default();
        assert!(!cfg.strict_quotes);
        assert!(!cfg.abort_on_spawn_failure);
        assert!(cfg.prompt_color);
        assert!(cfg.banner);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("MYSHELL_STRICT_QUOTES", "yes"),
            ("MYSHELL_ABORT_ON_SPAWN_FAILURE", "1"),
            ("MYSHELL_PROMPT_COLOR", "Off"),
            ("MYSHELL_BANNER", "false"),
        ]
        .into_iter()
        .collect();

        let mut cfg = ShellConfig::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert!(cfg.strict_quotes);
        assert!(cfg.abort_on_spawn_failure);
        assert!(!cfg.prompt_color);
        assert!(!cfg.banner);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let mut cfg = ShellConfig::default();
        cfg.apply_overrides(|_| None);
        assert_eq!(cfg, ShellConfig::default());
    }
}
