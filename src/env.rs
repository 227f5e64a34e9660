use std::env as stdenv;

use crate::vars::NamedValueList;

/// The session's view of its environment variables.
///
/// Populated once from the host process at startup and never read back from
/// the process afterwards: every lookup, `setenv` and child spawn goes
/// through this store, so a session can be driven in tests without touching
/// process-level state.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: NamedValueList,
}

impl Environment {
    /// Capture the host process environment, preserving its order.
    ///
    /// Names or values that are not valid UTF-8 are converted lossily.
    pub fn from_process() -> Self {
        stdenv::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key)
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.set(key, val);
    }

    /// Remove an environment variable; unknown names are ignored.
    pub fn unset_var(&mut self, key: &str) {
        self.vars.unset(key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter()
    }

    /// Render the environment as the `name=value` array handed to a child.
    pub fn materialize(&self) -> Vec<String> {
        self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::default();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::from_process();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_materialize_keeps_insertion_order() {
        let mut env: Environment = [("PATH", "/bin"), ("HOME", "/root")].into_iter().collect();
        env.set_var("PATH", "/usr/bin");
        env.set_var("EMPTY", "");

        assert_eq!(
            env.materialize(),
            vec!["PATH=/usr/bin", "HOME=/root", "EMPTY="]
        );
    }

    #[test]
    fn test_unset_absent_is_noop() {
        let mut env: Environment = [("A", "1")].into_iter().collect();
        env.unset_var("B");
        assert_eq!(env.materialize(), vec!["A=1"]);
    }
}
