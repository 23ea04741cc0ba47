//! Non-fatal issues collected while building episode tables.
//!
//! A build keeps going past a [`DiagnosticIssue`]: a malformed action
//! channel, for instance, contributes no impact and leaves a warning here.
//! The collected [`Diagnostics`] are returned next to the tables.
//!
//! ```
//! use gat_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_at_timestep("action", "missing nb_changed", "status_toggle", 4);
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(
//!     diag.issues[0].to_string(),
//!     "[warning:action] missing nb_changed (status_toggle) at timestep 4"
//! );
//! ```

use std::fmt;

use serde::Serialize;

/// One warning raised while building the tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    /// Source of the issue, e.g. `"action"`
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestep: Option<usize>,
    /// Offending item, e.g. the effect channel name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
            timestep: None,
            entity: None,
        }
    }

    pub fn at_timestep(self, timestep: usize) -> Self {
        Self {
            timestep: Some(timestep),
            ..self
        }
    }

    pub fn on(self, entity: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            ..self
        }
    }
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[warning:{}] {}", self.category, self.message)?;
        if let Some(entity) = &self.entity {
            write!(f, " ({entity})")?;
        }
        if let Some(timestep) = self.timestep {
            write!(f, " at timestep {timestep}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    /// Warning tied to one timestep and one entity.
    pub fn add_warning_at_timestep(
        &mut self,
        category: &str,
        message: &str,
        entity: &str,
        timestep: usize,
    ) {
        self.push(
            DiagnosticIssue::warning(category, message)
                .on(entity)
                .at_timestep(timestep),
        );
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn at_timestep(&self, timestep: usize) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(move |i| i.timestep == Some(timestep))
    }

    /// `"No issues"`, `"1 warning"`, `"3 warnings"`.
    pub fn summary(&self) -> String {
        match self.warning_count() {
            0 => "No issues".to_string(),
            1 => "1 warning".to_string(),
            n => format!("{n} warnings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_reports_no_issues() {
        let diag = Diagnostics::new();
        assert!(!diag.has_issues());
        assert_eq!(diag.summary(), "No issues");
    }

    #[test]
    fn summary_pluralises() {
        let mut diag = Diagnostics::new();
        diag.add_warning_at_timestep("action", "a", "reconnect", 0);
        assert_eq!(diag.summary(), "1 warning");
        diag.add_warning_at_timestep("action", "b", "disconnect", 1);
        assert_eq!(diag.summary(), "2 warnings");
    }

    #[test]
    fn timestep_issues_keep_entity_and_display() {
        let mut diag = Diagnostics::new();
        diag.add_warning_at_timestep("action", "line id 9 is out of range", "disconnect", 3);
        let issue = &diag.issues[0];
        assert_eq!(issue.timestep, Some(3));
        assert_eq!(issue.entity.as_deref(), Some("disconnect"));
        assert_eq!(
            issue.to_string(),
            "[warning:action] line id 9 is out of range (disconnect) at timestep 3"
        );
        assert_eq!(diag.at_timestep(3).count(), 1);
        assert_eq!(diag.at_timestep(2).count(), 0);
    }

    #[test]
    fn issues_serialize_without_empty_fields() {
        let issue = DiagnosticIssue::warning("action", "m");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["category"], "action");
        assert!(json.get("timestep").is_none());
    }
}
