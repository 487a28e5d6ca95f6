use std::fmt;

/// Dotted qualified name for type identity.
///
/// Used as the caller-facing spelling of a class (`crm.Person`) and as the
/// input to [`crate::TypeHash::from_name`].
///
/// # Examples
///
/// ```
/// use classforge_core::TypePath;
///
/// // Global namespace
/// let person = TypePath::global("Person");
/// assert_eq!(person.to_string(), "Person");
///
/// // With namespace
/// let shape = TypePath::new("Shape", vec!["geom".into()]);
/// assert_eq!(shape.to_string(), "geom.Shape");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypePath {
    /// Simple name (e.g. "Person").
    pub name: String,
    /// Namespace segments (e.g. `["crm"]`); empty for the global namespace.
    pub namespace: Vec<String>,
}

impl TypePath {
    /// Create a new qualified path with namespace segments.
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Create a path in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Create from a dotted string (e.g. "crm.Person").
    ///
    /// The last segment is the name, the rest is the namespace. Empty
    /// segments are dropped, so "crm..Person" normalizes to "crm.Person".
    pub fn from_dotted(s: &str) -> Self {
        let parts: Vec<&str> = s.split('.').filter(|p| !p.is_empty()).collect();
        match parts.split_last() {
            None => Self::global(""),
            Some((name, namespace)) => Self {
                name: (*name).to_string(),
                namespace: namespace.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    /// Check if this is in the global namespace.
    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Get the simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Get the namespace segments.
    pub fn namespace_path(&self) -> &[String] {
        &self.namespace
    }

    /// Get the namespace as a joined string.
    pub fn namespace_string(&self) -> String {
        self.namespace.join(".")
    }

    /// Compute the [`crate::TypeHash`] of this path.
    pub fn to_type_hash(&self) -> crate::TypeHash {
        crate::TypeHash::from_name(&self.to_string())
    }

    /// Create a child path within this one.
    ///
    /// Example: `crm.core` + `Person` = `crm.core.Person`
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut namespace = self.namespace.clone();
        namespace.push(self.name.clone());
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Get the parent namespace as a path (if any).
    pub fn parent(&self) -> Option<Self> {
        let (name, namespace) = self.namespace.split_last()?;
        Some(Self {
            name: name.clone(),
            namespace: namespace.to_vec(),
        })
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace.join("."), self.name)
        }
    }
}

impl From<&str> for TypePath {
    fn from(s: &str) -> Self {
        Self::from_dotted(s)
    }
}

impl From<String> for TypePath {
    fn from(s: String) -> Self {
        Self::from_dotted(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_path() {
        let path = TypePath::global("Person");
        assert_eq!(path.simple_name(), "Person");
        assert!(path.is_global());
        assert_eq!(path.to_string(), "Person");
    }

    #[test]
    fn namespaced_path() {
        let path = TypePath::new("Shape", vec!["geom".into(), "core".into()]);
        assert!(!path.is_global());
        assert_eq!(path.namespace_string(), "geom.core");
        assert_eq!(path.to_string(), "geom.core.Shape");
    }

    #[test]
    fn from_dotted() {
        let path = TypePath::from_dotted("geom.core.Shape");
        assert_eq!(path.simple_name(), "Shape");
        assert_eq!(path.namespace, vec!["geom", "core"]);

        let global = TypePath::from_dotted("Shape");
        assert!(global.is_global());
    }

    #[test]
    fn from_dotted_drops_empty_segments() {
        assert_eq!(
            TypePath::from_dotted("geom..Shape"),
            TypePath::from_dotted("geom.Shape")
        );
    }

    #[test]
    fn child_and_parent() {
        let parent = TypePath::new("core", vec!["geom".into()]);
        let child = parent.child("Shape");
        assert_eq!(child.to_string(), "geom.core.Shape");
        assert_eq!(child.parent().map(|p| p.to_string()), Some("geom.core".into()));
        assert!(TypePath::global("Shape").parent().is_none());
    }

    #[test]
    fn hash_matches_dotted_name() {
        let path = TypePath::from_dotted("geom.Shape");
        assert_eq!(path.to_type_hash(), crate::TypeHash::from_name("geom.Shape"));
    }
}
