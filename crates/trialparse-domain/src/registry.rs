//! Ordered collection of the studies in one batch

use crate::error::DomainError;
use crate::study::Study;

/// Registry of studies, in insertion order
///
/// Owns its studies exclusively. Insertion order only affects output
/// ordering. Iteration is restartable; the registry is not meant to be
/// mutated while iterated.
#[derive(Debug, Clone, Default)]
pub struct StudyRegistry {
    studies: Vec<Study>,
}

impl StudyRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            studies: Vec::new(),
        }
    }

    /// Build a registry from raw rows
    ///
    /// # Errors
    ///
    /// Fails with [`DomainError::MalformedRow`] on the first row with fewer
    /// than five fields.
    pub fn from_rows<R, S>(rows: &[R]) -> Result<Self, DomainError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        registry.extend_from_rows(rows)?;
        Ok(registry)
    }

    /// Append studies built from raw rows
    ///
    /// Every row is validated before any study is added, so on error the
    /// registry is left unchanged. Returns the number of studies added.
    pub fn extend_from_rows<R, S>(&mut self, rows: &[R]) -> Result<usize, DomainError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let built = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| Study::from_row(idx, row.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let added = built.len();
        self.studies.extend(built);
        Ok(added)
    }

    /// Add a study
    pub fn add(&mut self, study: Study) {
        self.studies.push(study);
    }

    /// Number of studies
    pub fn len(&self) -> usize {
        self.studies.len()
    }

    /// Whether the registry holds no studies
    pub fn is_empty(&self) -> bool {
        self.studies.is_empty()
    }

    /// Iterate over studies in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Study> {
        self.studies.iter()
    }

    /// Get a study by position
    pub fn get(&self, index: usize) -> Option<&Study> {
        self.studies.get(index)
    }

    /// Find a study by trial identifier
    pub fn find(&self, id: &str) -> Option<&Study> {
        self.studies.iter().find(|s| s.id() == id)
    }

    /// Hand over ownership of all studies, in insertion order
    pub fn into_studies(self) -> Vec<Study> {
        self.studies
    }
}

impl FromIterator<Study> for StudyRegistry {
    fn from_iter<I: IntoIterator<Item = Study>>(iter: I) -> Self {
        Self {
            studies: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for StudyRegistry {
    type Item = Study;
    type IntoIter = std::vec::IntoIter<Study>;

    fn into_iter(self) -> Self::IntoIter {
        self.studies.into_iter()
    }
}

impl<'a> IntoIterator for &'a StudyRegistry {
    type Item = &'a Study;
    type IntoIter = std::slice::Iter<'a, Study>;

    fn into_iter(self) -> Self::IntoIter {
        self.studies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> Vec<String> {
        vec![
            id.to_string(),
            format!("Title {}", id),
            "false".to_string(),
            "Cond".to_string(),
            "Inclusion Criteria: - adults".to_string(),
        ]
    }

    #[test]
    fn test_new_registry() {
        let registry = StudyRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn test_add_preserves_order() {
        let mut registry = StudyRegistry::new();
        registry.add(Study::new("NCT2", "b", vec![], ""));
        registry.add(Study::new("NCT1", "a", vec![], ""));
        registry.add(Study::new("NCT3", "c", vec![], ""));

        let ids: Vec<&str> = registry.iter().map(Study::id).collect();
        assert_eq!(ids, ["NCT2", "NCT1", "NCT3"]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let registry = StudyRegistry::from_rows(&[row("A"), row("B")]).unwrap();
        let first: Vec<&str> = registry.iter().map(Study::id).collect();
        let second: Vec<&str> = (&registry).into_iter().map(Study::id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_rows() {
        let registry = StudyRegistry::from_rows(&[row("NCT001"), row("NCT002")]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(1).unwrap().id(), "NCT002");
        assert_eq!(registry.find("NCT001").unwrap().title(), "Title NCT001");
        assert!(registry.find("NCT999").is_none());
    }

    #[test]
    fn test_extend_from_rows_is_all_or_nothing() {
        let mut registry = StudyRegistry::from_rows(&[row("NCT001")]).unwrap();

        let short = vec!["NCT003".to_string(), "T".to_string()];
        let err = registry
            .extend_from_rows(&[row("NCT002"), short])
            .unwrap_err();

        assert_eq!(err, DomainError::MalformedRow { row: 1, fields: 2 });
        assert_eq!(registry.len(), 1);
        assert!(registry.find("NCT002").is_none());
    }

    #[test]
    fn test_from_rows_accepts_str_arrays() {
        let rows = [["NCT1", "t", "false", "c", "e"]];
        let registry = StudyRegistry::from_rows(&rows).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_into_studies() {
        let registry: StudyRegistry = vec![
            Study::new("A", "", vec![], ""),
            Study::new("B", "", vec![], ""),
        ]
        .into_iter()
        .collect();
        let studies = registry.into_studies();
        assert_eq!(studies.len(), 2);
        assert_eq!(studies[0].id(), "A");
    }
}
