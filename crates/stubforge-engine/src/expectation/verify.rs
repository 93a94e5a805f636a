//! Verification: replay each plan's invocation log against its expectation.
//!
//! Verification is a pure read. It never touches the invocation logs, so
//! verifying twice without new calls yields the same report. A failing entry
//! does not stop the remaining plans from being checked.

use std::fmt;

use serde::{Deserialize, Serialize};
use stubforge_core::id::DoubleId;

use crate::invocation::Invocation;
use crate::plan::BehaviorPlan;
use crate::value::render_arguments;

/// Whether one expectation held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
}

/// The verification result for one operation's expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub operation: String,
    /// Description of the expectation, e.g. `called exactly once`.
    pub expectation: String,
    pub outcome: Outcome,
    /// Calls whose arguments satisfied every constraint.
    pub actual_count: usize,
    /// All calls to the operation, matching or not.
    pub total_calls: usize,
    /// Up to the configured sample limit of calls whose arguments did not match.
    pub mismatched_calls: Vec<Invocation>,
}

impl ReportEntry {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.outcome {
            Outcome::Passed => "ok",
            Outcome::Failed => "FAILED",
        };
        write!(
            f,
            "[{status}] {}() expected to be {}, matched {} of {} call(s)",
            self.operation, self.expectation, self.actual_count, self.total_calls
        )?;
        for call in &self.mismatched_calls {
            write!(
                f,
                "\n    mismatched call #{}: ({})",
                call.sequence,
                render_arguments(&call.arguments)
            )?;
        }
        Ok(())
    }
}

/// Everything verification found for one double.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub double: DoubleId,
    pub contract: String,
    /// One entry per operation carrying an expectation, in operation order.
    pub entries: Vec<ReportEntry>,
}

impl VerificationReport {
    /// Returns `true` if every expectation held.
    pub fn passed(&self) -> bool {
        self.entries.iter().all(ReportEntry::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.passed())
    }

    /// Converts failing entries into an error value for hosts that want a
    /// `Result` to fail the enclosing test with.
    pub fn ensure_passed(&self) -> Result<(), VerificationError> {
        if self.passed() {
            return Ok(());
        }
        Err(VerificationError {
            double: self.double,
            contract: self.contract.clone(),
            failures: self.failures().cloned().collect(),
        })
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.contract, self.double)?;
        if self.entries.is_empty() {
            write!(f, ": no expectations")?;
        }
        for entry in &self.entries {
            write!(f, "\n  {entry}")?;
        }
        Ok(())
    }
}

/// Failed expectations of one double.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} expectation(s) failed for {contract} ({double}):{}", .failures.len(), render_failures(.failures))]
pub struct VerificationError {
    pub double: DoubleId,
    pub contract: String,
    pub failures: Vec<ReportEntry>,
}

fn render_failures(failures: &[ReportEntry]) -> String {
    failures.iter().map(|f| format!("\n  {f}")).collect()
}

/// Checks every plan that carries an expectation.
pub fn verify_plans<'a>(
    double: DoubleId,
    contract: &str,
    plans: impl IntoIterator<Item = &'a BehaviorPlan>,
    sample_limit: usize,
) -> VerificationReport {
    let mut entries = Vec::new();

    for plan in plans {
        let Some(expectation) = plan.expectation() else {
            continue;
        };

        let invocations = plan.invocations();
        let mut actual_count = 0;
        let mut mismatched_calls = Vec::new();
        for invocation in invocations {
            if expectation.matches(&invocation.arguments) {
                actual_count += 1;
            } else if mismatched_calls.len() < sample_limit {
                mismatched_calls.push(invocation.clone());
            }
        }

        let outcome = if expectation.count.is_satisfied_by(actual_count) {
            Outcome::Passed
        } else {
            Outcome::Failed
        };

        entries.push(ReportEntry {
            operation: plan.operation_name().to_string(),
            expectation: expectation.to_string(),
            outcome,
            actual_count,
            total_calls: invocations.len(),
            mismatched_calls,
        });
    }

    VerificationReport {
        double,
        contract: contract.to_string(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::expectation::{Expectation, InvocationCount};
    use crate::value::Value;
    use smallvec::smallvec;
    use stubforge_core::{Dispatch, IntrospectedOperation, OperationDef, TypeId};

    fn plan(name: &str) -> BehaviorPlan {
        let def = OperationDef::new(name, vec![("arg".to_string(), TypeId::MIXED)], TypeId::VOID);
        BehaviorPlan::new(
            IntrospectedOperation {
                def,
                declared_in: TypeId(10),
                dispatch: Dispatch::Doubled,
            },
            "Observer",
            true,
        )
    }

    fn call(plan: &mut BehaviorPlan, seq: u64, arg: &str) {
        plan.record(seq, smallvec![Value::from(arg)]);
    }

    #[test]
    fn plans_without_expectations_are_skipped() {
        let mut update = plan("update");
        call(&mut update, 0, "x");
        let report = verify_plans(DoubleId(0), "Observer", [&update], 3);
        assert!(report.entries.is_empty());
        assert!(report.passed());
        assert!(report.ensure_passed().is_ok());
    }

    #[test]
    fn exactly_once_with_argument() {
        let mut update = plan("update");
        update.set_expectation(
            Expectation::new(InvocationCount::once()).with([Constraint::equal_to("something")]),
        );
        call(&mut update, 0, "something");

        let report = verify_plans(DoubleId(0), "Observer", [&update], 3);
        assert!(report.passed());
        assert_eq!(report.entries[0].actual_count, 1);
        assert_eq!(
            report.entries[0].expectation,
            "called exactly once with #0 is equal to \"something\""
        );

        call(&mut update, 1, "something");
        let report = verify_plans(DoubleId(0), "Observer", [&update], 3);
        assert!(!report.passed());
        assert_eq!(report.entries[0].actual_count, 2);
        assert_eq!(report.entries[0].total_calls, 2);
    }

    #[test]
    fn mismatches_are_sampled_up_to_limit() {
        let mut update = plan("update");
        update.set_expectation(
            Expectation::new(InvocationCount::AtLeastOnce).with([Constraint::equal_to("hit")]),
        );
        for seq in 0..5 {
            call(&mut update, seq, "miss");
        }

        let report = verify_plans(DoubleId(4), "Observer", [&update], 2);
        let entry = &report.entries[0];
        assert_eq!(entry.outcome, Outcome::Failed);
        assert_eq!(entry.actual_count, 0);
        assert_eq!(entry.total_calls, 5);
        let sampled: Vec<u64> = entry.mismatched_calls.iter().map(|c| c.sequence).collect();
        assert_eq!(sampled, vec![0, 1]);
    }

    #[test]
    fn one_failure_does_not_hide_others() {
        let mut first = plan("first");
        first.set_expectation(Expectation::new(InvocationCount::Never));
        call(&mut first, 0, "x");
        let mut second = plan("second");
        second.set_expectation(Expectation::new(InvocationCount::once()));

        let report = verify_plans(DoubleId(1), "Observer", [&first, &second], 3);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failures().count(), 2);

        let err = report.ensure_passed().unwrap_err();
        assert_eq!(err.failures.len(), 2);
        let message = err.to_string();
        assert!(message.starts_with("2 expectation(s) failed for Observer (double#1):"));
        assert!(message.contains("first() expected to be called never"));
    }

    #[test]
    fn verifying_twice_gives_same_report() {
        let mut update = plan("update");
        update.set_expectation(Expectation::new(InvocationCount::Exactly(2)));
        call(&mut update, 0, "a");
        let first = verify_plans(DoubleId(0), "Observer", [&update], 3);
        let second = verify_plans(DoubleId(0), "Observer", [&update], 3);
        assert_eq!(first, second);
        assert_eq!(update.invocations().len(), 1);
    }

    #[test]
    fn report_display_lists_mismatches() {
        let mut update = plan("update");
        update.set_expectation(
            Expectation::new(InvocationCount::once()).with([Constraint::equal_to("a")]),
        );
        call(&mut update, 7, "b");
        let report = verify_plans(DoubleId(0), "Observer", [&update], 3);
        let text = report.to_string();
        assert!(text.contains("[FAILED] update()"));
        assert!(text.contains("mismatched call #7: (\"b\")"));
    }
}
