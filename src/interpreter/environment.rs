use super::Value;

/// Ordered name-to-value store for one compilation.
///
/// Bindings are only ever appended; a lookup returns the newest binding for a
/// name, so re-binding shadows without discarding the older entry.
#[derive(Debug, Default)]
pub(super) struct Environment {
    bindings: Vec<(String, Value)>,
}

impl Environment {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn define(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.push((name.into(), value));
    }

    pub(super) fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    pub(super) fn clear(&mut self) {
        self.bindings.clear();
    }

    #[cfg(test)]
    pub(super) fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_binding_wins() {
        let mut environment = Environment::new();
        environment.define("x", Value::Integer(1));
        environment.define("y", Value::Text("a".to_string()));
        environment.define("x", Value::Integer(2));
        assert_eq!(environment.lookup("x"), Some(&Value::Integer(2)));
        assert_eq!(environment.lookup("y"), Some(&Value::Text("a".to_string())));
        assert_eq!(environment.lookup("z"), None);
    }

    #[test]
    fn clear_drops_every_binding() {
        let mut environment = Environment::new();
        environment.define("x", Value::Integer(1));
        environment.clear();
        assert!(environment.is_empty());
        assert_eq!(environment.lookup("x"), None);
    }
}
