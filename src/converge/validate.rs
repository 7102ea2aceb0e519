//! Post-run validator: re-probe the health targets and print a PASS/FAIL
//! table. Advisory only.
use super::context::Context;
use super::prober;
use crate::config::catalog::{Category, Target};
use crate::logging::terminal_columns;

/// Widest table the validator will draw.
const MAX_WIDTH: usize = 100;
const RESULT_WIDTH: usize = 6;

/// One re-probed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    /// Target id.
    pub id: String,
    /// Whether the target is satisfied.
    pub passed: bool,
}

/// Result of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Checks in probe order.
    pub checks: Vec<HealthCheck>,
}

impl ValidationReport {
    /// Number of passing checks.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Ids of failing checks.
    #[must_use]
    pub fn failures(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.id.as_str())
            .collect()
    }

    /// Whether every check passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// One-line tally, e.g. `"4 of 5 health checks passed"`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} of {} health checks passed", self.passed(), self.checks.len())
    }

    /// Render the table for a terminal `columns` wide.
    #[must_use]
    pub fn render(&self, columns: usize) -> Vec<String> {
        let width = columns.clamp(RESULT_WIDTH + 12, MAX_WIDTH);
        let result_width = RESULT_WIDTH;
        let id_width = width - result_width - 1;
        let rule = "-".repeat(width);

        let mut lines = vec![
            format!("{:<id_width$} {:>result_width$}", "TARGET", "RESULT"),
            rule.clone(),
        ];
        for check in &self.checks {
            let verdict = if check.passed { "PASS" } else { "FAIL" };
            lines.push(format!(
                "{:<id_width$} {verdict:>result_width$}",
                truncate(&check.id, id_width)
            ));
        }
        lines.push(rule);
        lines.push(format!("{}/{} passed", self.passed(), self.checks.len()));
        lines
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// The targets the validator re-probes.
///
/// With an explicit id list, those targets (ids not in `catalog` are
/// ignored); otherwise every essential and dotfile target.
#[must_use]
pub fn health_targets<'a>(catalog: &'a [Target], ids: &[String]) -> Vec<&'a Target> {
    if ids.is_empty() {
        catalog
            .iter()
            .filter(|t| matches!(t.category, Category::Essential | Category::Dotfile))
            .collect()
    } else {
        ids.iter()
            .filter_map(|id| catalog.iter().find(|t| &t.id == id))
            .collect()
    }
}

/// Re-probe `targets` and log the table.
#[must_use]
pub fn validate(targets: &[&Target], ctx: &Context) -> ValidationReport {
    ctx.log.stage("Validation");
    let report = ValidationReport {
        checks: targets
            .iter()
            .map(|t| HealthCheck {
                id: t.id.clone(),
                passed: prober::is_satisfied(t, ctx),
            })
            .collect(),
    };
    for line in report.render(terminal_columns()) {
        ctx.log.info(&line);
    }
    if !report.all_passed() {
        ctx.log.warn(&format!(
            "{} health check(s) failed; re-run install to converge",
            report.checks.len() - report.passed()
        ));
    }
    report
}
