//! Operator registry
//!
//! An append-only mapping from operator name to operator, populated once at
//! startup. Registration order defines the mutation-discovery sequence, so
//! `list()` and the walker both iterate in insertion order.

use crate::error::{MutationError, Result};
use crate::operators::{self, Operator};

pub struct Registry {
    entries: Vec<Box<dyn Operator>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }

    /// Registry with every built-in operator, in their fixed order.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        for op in operators::builtin() {
            // built-in names are unique by construction
            registry
                .register(op)
                .expect("built-in operator registered twice");
        }
        registry
    }

    /// Register an operator. Duplicate names are a startup-time fatal error.
    pub fn register(&mut self, op: Box<dyn Operator>) -> Result<()> {
        if self.entries.iter().any(|e| e.name() == op.name()) {
            return Err(MutationError::DuplicateOperator {
                name: op.name().to_string(),
            });
        }
        self.entries.push(op);
        Ok(())
    }

    /// All registered names in registration order.
    pub fn list(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name()).collect()
    }

    /// Remove operators matching any pattern: an exact name, or a
    /// trailing-`*` prefix such as `arithmetic/*`. Survivor order is kept.
    pub fn disable(&mut self, patterns: &[String]) {
        if patterns.is_empty() {
            return;
        }
        self.entries
            .retain(|e| !patterns.iter().any(|p| pattern_matches(p, e.name())));
    }

    pub fn operators(&self) -> impl Iterator<Item = &dyn Operator> {
        self.entries.iter().map(Box::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builtin()
    }
}

fn pattern_matches(pattern: &str, name: &str) -> bool {
    if let Some(stem) = pattern.strip_suffix('*') {
        let prefix = stem.strip_suffix('/').unwrap_or(stem);
        name.starts_with(prefix)
    } else {
        pattern == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationSpec;
    use crate::operators::Site;
    use crate::unit::UnitInfo;

    struct Named(&'static str);

    impl Operator for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn mutations(&self, _: &UnitInfo, _: &Site) -> Vec<MutationSpec> {
            Vec::new()
        }
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut r = Registry::new();
        r.register(Box::new(Named("b/two"))).unwrap();
        r.register(Box::new(Named("a/one"))).unwrap();
        assert_eq!(r.list(), vec!["b/two", "a/one"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut r = Registry::new();
        r.register(Box::new(Named("a/one"))).unwrap();
        let err = r.register(Box::new(Named("a/one"))).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MutationError::DuplicateOperator { .. }
        ));
    }

    #[test]
    fn test_disable_exact_and_prefix() {
        let mut r = Registry::builtin();
        let before = r.list().len();
        r.disable(&["numbers/incrementer".to_string()]);
        assert_eq!(r.list().len(), before - 1);
        assert!(!r.list().contains(&"numbers/incrementer"));

        r.disable(&["arithmetic/*".to_string()]);
        assert!(r.list().iter().all(|n| !n.starts_with("arithmetic/")));
        // survivor order unchanged
        let survivors = r.list();
        let mut sorted = survivors.clone();
        sorted.sort();
        assert_eq!(survivors, sorted); // built-ins are alphabetical
    }

    #[test]
    fn test_builtin_contains_expected_names() {
        let r = Registry::builtin();
        let names = r.list();
        for name in [
            "arithmetic/base",
            "conditional/negated",
            "loop/break",
            "numbers/incrementer",
            "statement/remove",
            "branch/case",
        ] {
            assert!(names.contains(&name), "missing {name}");
        }
    }
}
