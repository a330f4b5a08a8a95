//! Regression tests for an external quantum chemistry package: run a
//! reference method, pin the orbital phase gauge, run the correlated solver
//! on the fixed orbitals, and compare named results against stored reference
//! values.

use std::{fmt::Display, path::Path};

use qprog::{
    irrep::PointGroup,
    options::OptionSet,
    program::{Method, Program, ProgramError, psi4::Psi4, run_job},
    store::{AMPS_FILE, AmpStore, StoreError},
    wavefunction::MosError,
};

use crate::{
    check::{CheckResult, Stage},
    config::{Config, ConfigError},
    summary::Summary,
};

pub mod check;
pub mod config;
pub mod summary;

#[cfg(test)]
mod tests;

/// print the arguments with `eprintln!` and exit with code 1
#[macro_export]
macro_rules! die {
    ($($t:tt)*) => {{
        eprintln!($($t)*);
        std::process::exit(1);
    }};
}

#[derive(Debug, PartialEq)]
pub enum RunError {
    Config(ConfigError),
    Solve(Stage, ProgramError),
    /// the reference run produced no wavefunction punch
    NoWavefunction(String),
    /// the reference ran in a different point group than the config names
    SymmetryMismatch {
        point_group: PointGroup,
        nirrep: usize,
    },
    /// writing the phase-fixed guess failed
    Phases(MosError),
    Store(StoreError),
    /// a check named a variable its stage never reported
    MissingVar(Stage, String),
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StoreError> for RunError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "invalid config: {e}"),
            RunError::Solve(stage, e) => {
                write!(f, "{stage} solve failed: {e}")
            }
            RunError::NoWavefunction(file) => {
                write!(f, "no wavefunction punched next to {file}")
            }
            RunError::SymmetryMismatch {
                point_group,
                nirrep,
            } => {
                write!(
                    f,
                    "the reference ran with {nirrep} irreps, but point \
                     group {point_group} has {}",
                    point_group.nirrep()
                )
            }
            RunError::Phases(e) => {
                write!(f, "failed to write guess orbitals: {e}")
            }
            RunError::Store(e) => write!(f, "amplitude store: {e}"),
            RunError::MissingVar(stage, var) => {
                write!(f, "the {stage} stage reported no variable `{var}`")
            }
        }
    }
}

impl std::error::Error for RunError {}

/// Run the two-stage calculation `config` describes in `workdir` and
/// evaluate its checks.
///
/// The reference stage punches its converged orbitals; a sign-fixed copy of
/// them is punched back out as the guess for the correlated stage, so the
/// correlated solver always starts from the same orbital gauge no matter
/// which signs the reference happened to converge to. Both solves run with
/// `workdir` as their working directory, putting the solver's own
/// checkpoint files where staging and harvesting look for them. Amplitude
/// checkpoints are staged in and harvested around the correlated stage when
/// the config names a store.
pub fn run_test(
    config: &Config,
    workdir: impl AsRef<Path>,
) -> Result<Summary, RunError> {
    let workdir = workdir.as_ref();
    config.validate()?;

    let base = workdir.join(&config.name);
    let base = base.to_string_lossy();

    let mut globals = OptionSet::new();
    globals.insert("basis", config.basis.as_str());
    for (k, v) in config.scf.iter() {
        globals.insert(k, v.clone());
    }

    log::info!("{}: running the {} reference", config.name, config.reference);
    let mut refjob = Psi4::new(
        format!("{base}_ref"),
        config.reference,
        config.molecule.clone(),
        config.point_group,
    )
    .globals(globals.clone())
    .memory(config.memory.clone())
    .threads(config.threads);
    let refres = run_job(&config.program, workdir, &mut refjob)
        .map_err(|e| RunError::Solve(Stage::Reference, e))?;
    log::info!("{} energy = {:.12}", config.reference, refres.energy);

    let Some(wfn) = &refres.wavefunction else {
        return Err(RunError::NoWavefunction(refjob.outfile()));
    };
    if wfn.nirrep() != config.point_group.nirrep() {
        return Err(RunError::SymmetryMismatch {
            point_group: config.point_group,
            nirrep: wfn.nirrep(),
        });
    }

    // pin the phase gauge on a copy and punch it for the next stage
    let fixed = wfn.with_fixed_phases();
    let guess = format!("{base}_guess.mos");
    fixed.ca.dump(&guess, &fixed.irreps).map_err(RunError::Phases)?;

    let store = match &config.amp_dir {
        Some(dir) => Some(AmpStore::new(dir)?),
        None => None,
    };
    if config.forte.bool_is_set("dsrg_read_amps") {
        match &store {
            Some(store) => {
                if !store.stage(&config.name, workdir)? {
                    log::warn!("no stored amplitudes for {}", config.name);
                }
            }
            None => log::warn!(
                "dsrg_read_amps is set but no amp_dir is configured"
            ),
        }
    }

    log::info!("{}: running the correlated stage", config.name);
    let mut corjob = Psi4::new(
        format!("{base}_cor"),
        Method::Forte,
        config.molecule.clone(),
        config.point_group,
    )
    .ref_method(config.reference)
    .globals(globals)
    .forte(config.forte.clone())
    .memory(config.memory.clone())
    .threads(config.threads)
    .guess(guess);
    let corres = run_job(&config.program, workdir, &mut corjob)
        .map_err(|e| RunError::Solve(Stage::Correlated, e))?;
    log::info!("correlated energy = {:.12}", corres.energy);

    if let Some(store) = &store {
        if config.forte.bool_is_set("dsrg_dump_amps") {
            store.harvest(&config.name, workdir)?;
        }
    }

    let mut checks = Vec::new();
    for check in &config.checks {
        let vars = match check.stage {
            Stage::Reference => &refres.variables,
            Stage::Correlated => &corres.variables,
        };
        let Some(&got) = vars.get(&check.var.to_uppercase()) else {
            return Err(RunError::MissingVar(check.stage, check.var.clone()));
        };
        checks.push(CheckResult::evaluate(check, got));
    }

    Ok(Summary {
        name: config.name.clone(),
        reference_energy: refres.energy,
        correlated_energy: corres.energy,
        time: refres.time + corres.time,
        checks,
    })
}

/// Remove the scratch files a run named `name` leaves in `workdir`. The
/// summary file is not touched.
pub fn cleanup(name: &str, workdir: impl AsRef<Path>) {
    let workdir = workdir.as_ref();
    for file in [
        format!("{name}_ref.dat"),
        format!("{name}_ref.out"),
        format!("{name}_ref.mos"),
        format!("{name}_guess.mos"),
        format!("{name}_cor.dat"),
        format!("{name}_cor.out"),
        format!("{name}_cor.mos"),
        String::from(AMPS_FILE),
    ] {
        let _ = std::fs::remove_file(workdir.join(file));
    }
}
