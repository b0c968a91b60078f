//! Attribute schema registry.
//!
//! Maps each subject to the full, ordered list of attributes a reader could
//! ever see. The registry is supplied by the caller (usually from
//! configuration); resolution only ever narrows it.

use std::collections::{BTreeMap, HashMap};

use fleetgate_types::normalize;

/// Subject -> full attribute list.
///
/// Subject names are normalized (trimmed, lower-cased). Attribute names are
/// trimmed and deduplicated but keep their declared order and case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSchemaRegistry {
    subjects: HashMap<String, Vec<String>>,
}

impl AttributeSchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the attribute list for `subject`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fleetgate_rbac::AttributeSchemaRegistry;
    ///
    /// let registry = AttributeSchemaRegistry::new()
    ///     .with_subject("Vehicle", ["plate", "model_year", "plate", "status"]);
    ///
    /// assert_eq!(registry.full_attributes("vehicle"), ["plate", "model_year", "status"]);
    /// assert!(registry.full_attributes("driver").is_empty());
    /// ```
    pub fn with_subject<I, S>(mut self, subject: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.register(subject, attributes);
        self
    }

    /// In-place form of [`with_subject`](Self::with_subject).
    pub fn register<I, S>(&mut self, subject: &str, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let subject = normalize(subject);
        if subject.is_empty() {
            return;
        }

        let mut list: Vec<String> = Vec::new();
        for attribute in attributes {
            let attribute = attribute.as_ref().trim();
            if !attribute.is_empty() && !list.iter().any(|a| a == attribute) {
                list.push(attribute.to_string());
            }
        }
        self.subjects.insert(subject, list);
    }

    /// Full attribute list for `subject`, or an empty slice if unknown.
    ///
    /// An unknown subject and a subject registered with no attributes are
    /// indistinguishable here; both resolve to `[]`.
    pub fn full_attributes(&self, subject: &str) -> &[String] {
        self.subjects
            .get(&normalize(subject))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns whether `subject` has been registered (possibly with no attributes).
    pub fn contains_subject(&self, subject: &str) -> bool {
        self.subjects.contains_key(&normalize(subject))
    }

    /// Registered subjects, sorted.
    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = self.subjects.keys().map(String::as_str).collect();
        subjects.sort_unstable();
        subjects
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl<S, A> FromIterator<(S, Vec<A>)> for AttributeSchemaRegistry
where
    S: AsRef<str>,
    A: AsRef<str>,
{
    fn from_iter<T: IntoIterator<Item = (S, Vec<A>)>>(iter: T) -> Self {
        let mut registry = Self::new();
        for (subject, attributes) in iter {
            registry.register(subject.as_ref(), attributes);
        }
        registry
    }
}

impl From<&BTreeMap<String, Vec<String>>> for AttributeSchemaRegistry {
    fn from(subjects: &BTreeMap<String, Vec<String>>) -> Self {
        subjects
            .iter()
            .map(|(subject, attributes)| (subject.as_str(), attributes.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_lookup_is_case_insensitive() {
        let registry = AttributeSchemaRegistry::new().with_subject("vehicle", ["plate"]);

        assert_eq!(registry.full_attributes("VEHICLE"), ["plate"]);
        assert!(registry.contains_subject(" Vehicle "));
    }

    #[test]
    fn blank_attributes_and_subjects_are_ignored() {
        let registry = AttributeSchemaRegistry::new()
            .with_subject("vehicle", ["plate", " ", "", " color "])
            .with_subject("  ", ["ignored"]);

        assert_eq!(registry.full_attributes("vehicle"), ["plate", "color"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_subject_is_registered_but_has_no_attributes() {
        let registry = AttributeSchemaRegistry::new().with_subject("trailer", Vec::<String>::new());

        assert!(registry.contains_subject("trailer"));
        assert!(registry.full_attributes("trailer").is_empty());
        assert!(!registry.contains_subject("vehicle"));
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let registry = AttributeSchemaRegistry::new()
            .with_subject("vehicle", ["plate"])
            .with_subject("Vehicle", ["vin"]);

        assert_eq!(registry.full_attributes("vehicle"), ["vin"]);
    }

    #[test]
    fn from_btree_map() {
        let mut subjects = BTreeMap::new();
        subjects.insert("driver".to_string(), vec!["name".to_string(), "license".to_string()]);
        subjects.insert("vehicle".to_string(), vec!["plate".to_string()]);

        let registry = AttributeSchemaRegistry::from(&subjects);

        assert_eq!(registry.subjects(), vec!["driver", "vehicle"]);
        assert_eq!(registry.full_attributes("driver"), ["name", "license"]);
    }
}
