//! Reference-value checks and the tolerance rule behind them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Compare `got` against the reference value `want` to `digits` decimal
/// digits: the two agree when their absolute difference is strictly below
/// half a unit in the last required digit.
pub fn compare_values(want: f64, got: f64, digits: i32) -> bool {
    (got - want).abs() < 0.5 * 10.0_f64.powi(-digits)
}

/// Which stage's output variables a check reads.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum Stage {
    #[serde(alias = "reference")]
    Reference,
    #[default]
    #[serde(alias = "correlated")]
    Correlated,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Stage::Reference => "reference",
            Stage::Correlated => "correlated",
        })
    }
}

/// One reference-value check from the config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Check {
    /// label printed with the result
    pub label: String,

    /// which stage's variable table to read, correlated by default
    #[serde(default)]
    pub stage: Stage,

    /// the output variable to compare; matched against the program's
    /// uppercase variable names case-insensitively
    #[serde(default = "current_energy")]
    pub var: String,

    /// the reference value
    pub want: f64,

    /// decimal digits of agreement required
    pub digits: i32,
}

fn current_energy() -> String {
    String::from("CURRENT ENERGY")
}

/// The outcome of one [Check].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckResult {
    pub label: String,
    pub var: String,
    pub want: f64,
    pub got: f64,
    pub digits: i32,
    pub passed: bool,
}

impl CheckResult {
    pub fn evaluate(check: &Check, got: f64) -> Self {
        Self {
            label: check.label.clone(),
            var: check.var.clone(),
            want: check.want,
            got,
            digits: check.digits,
            passed: compare_values(check.want, got, check.digits),
        }
    }
}

impl Display for CheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}  {}: got {:.12}, want {:.12} to {} digits",
            if self.passed { "PASS" } else { "FAIL" },
            self.label,
            self.got,
            self.want,
            self.digits,
        )
    }
}
