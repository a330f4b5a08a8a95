use std::fmt::Display;

use serde::Serialize;

use crate::check::CheckResult;

/// Everything worth keeping from one run: the stage energies, the total wall
/// time the program reported, and the outcome of every configured check.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub name: String,
    pub reference_energy: f64,
    pub correlated_energy: f64,
    pub time: f64,
    pub checks: Vec<CheckResult>,
}

impl Summary {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "==> {} <==", self.name)?;
        writeln!(f, "reference energy  = {:.12}", self.reference_energy)?;
        writeln!(f, "correlated energy = {:.12}", self.correlated_energy)?;
        writeln!(f, "wall time         = {:.2} s", self.time)?;
        for check in &self.checks {
            writeln!(f, "{check}")?;
        }
        let passed = self.checks.iter().filter(|c| c.passed).count();
        writeln!(f, "{passed}/{} checks passed", self.checks.len())
    }
}
