//! Version conflict reporting.

use std::fmt;

use graft_core::dependency::ModuleIdentifier;

/// Every conflict the resolver settled.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// Several versions of one module were requested; one was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub module: ModuleIdentifier,
    pub requested: String,
    pub selected: String,
    pub reason: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Conflicts involving `module`.
    pub fn for_module<'a>(&'a self, module: &'a ModuleIdentifier) -> impl Iterator<Item = &'a VersionConflict> {
        self.conflicts.iter().filter(move |c| &c.module == module)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested {} but selected {} ({})",
            self.module, self.requested, self.selected, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No version conflicts.");
    }

    #[test]
    fn report_lists_conflicts() {
        let module = ModuleIdentifier::new("org.example", "lib");
        let mut report = ConflictReport::new();
        report.add(VersionConflict {
            module: module.clone(),
            requested: "1.0".into(),
            selected: "2.0".into(),
            reason: "newest version wins".into(),
        });
        assert_eq!(report.len(), 1);
        assert_eq!(report.for_module(&module).count(), 1);
        let s = report.to_string();
        assert!(s.starts_with("Version conflicts (1):"));
        assert!(s.contains("org.example:lib requested 1.0 but selected 2.0 (newest version wins)"));
    }
}
