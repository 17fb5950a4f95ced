//! Document-identifier to vector-store-namespace resolution.
//!
//! A closed, literal lookup: ordered `(marker, namespace)` pairs evaluated
//! by first substring match, with a catch-all for unrecognized documents.

/// Namespace used when no marker matches (or no identifier is given).
pub const DEFAULT_NAMESPACE: &str = "default";

/// Known policy documents, keyed by the product code embedded in their
/// filenames/URLs. Order matters: resolution takes the first match.
const KNOWN_DOCUMENTS: &[(&str, &str)] = &[
    ("HDFHLIP23024V072223", "HDFC_ERGO_Easy_Health"),
    ("BAJHLIP23020V012223", "Bajaj_Allianz_Global_Health"),
    ("ICIHLIP22012V012223", "ICICI_Lombard_Golden_Shield"),
    ("CHOTGDP23004V012223", "Cholamandalam_Travel"),
    ("EDLHLGA23009V012223", "Edelweiss_Well_Baby_Well_Mother"),
];

/// Maps document identifiers to vector-store namespaces.
#[derive(Debug, Clone)]
pub struct NamespaceResolver {
    rules: Vec<(String, String)>,
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::new(
            KNOWN_DOCUMENTS
                .iter()
                .map(|(marker, namespace)| (marker.to_string(), namespace.to_string())),
        )
    }
}

impl NamespaceResolver {
    /// Build a resolver from ordered `(marker, namespace)` pairs.
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Resolve a document identifier to its namespace.
    ///
    /// Pure and stable: the same identifier always yields the same
    /// namespace, and anything unrecognized yields [`DEFAULT_NAMESPACE`].
    #[must_use]
    pub fn resolve(&self, identifier: Option<&str>) -> &str {
        let Some(identifier) = identifier else {
            return DEFAULT_NAMESPACE;
        };
        self.rules
            .iter()
            .find(|(marker, _)| identifier.contains(marker.as_str()))
            .map_or(DEFAULT_NAMESPACE, |(_, namespace)| namespace.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_documents_resolve() {
        let resolver = NamespaceResolver::default();
        assert_eq!(
            resolver.resolve(Some("https://example.com/HDFHLIP23024V072223.pdf")),
            "HDFC_ERGO_Easy_Health"
        );
        assert_eq!(
            resolver.resolve(Some("docs/BAJHLIP23020V012223.pdf")),
            "Bajaj_Allianz_Global_Health"
        );
        assert_eq!(
            resolver.resolve(Some("EDLHLGA23009V012223")),
            "Edelweiss_Well_Baby_Well_Mother"
        );
    }

    #[test]
    fn test_unmatched_and_absent_default() {
        let resolver = NamespaceResolver::default();
        assert_eq!(resolver.resolve(Some("some-other-policy.pdf")), DEFAULT_NAMESPACE);
        assert_eq!(resolver.resolve(None), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_resolution_is_stable() {
        let resolver = NamespaceResolver::default();
        let first = resolver.resolve(Some("ICIHLIP22012V012223")).to_string();
        for _ in 0..10 {
            assert_eq!(resolver.resolve(Some("ICIHLIP22012V012223")), first);
        }
    }

    #[test]
    fn test_first_match_wins() {
        let resolver = NamespaceResolver::new([
            ("POLICY".to_string(), "first".to_string()),
            ("POLICY-A".to_string(), "second".to_string()),
        ]);
        assert_eq!(resolver.resolve(Some("POLICY-A.pdf")), "first");
    }
}
