//! Configuration for one regression job.

use std::{
    fmt::{Debug, Display},
    fs::read_to_string,
    path::Path,
};

use qprog::{
    geom::Molecule,
    irrep::PointGroup,
    options::{OptValue, OptionSet},
    program::Method,
};
use serde::Deserialize;

use crate::check::Check;


/// keywords holding one entry per irrep of the computational point group
const PER_IRREP_KEYS: [&str; 7] = [
    "docc",
    "socc",
    "frozen_docc",
    "restricted_docc",
    "active",
    "frozen_uocc",
    "restricted_uocc",
];

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// the name of the job, used for its scratch files, the summary file,
    /// and as its key in the amplitude store
    name: String,

    /// the command invoking the external program. extra words become leading
    /// arguments. defaults to `psi4`
    program: Option<String>,

    /// the molecular geometry, an optional `charge multiplicity` line
    /// followed by a Z-matrix or cartesian coordinates
    geometry: String,

    /// the computational point group; per-irrep options are sized against it
    point_group: PointGroup,

    /// the basis set identifier
    basis: String,

    /// memory handed to the external program, defaults to `500 mb`
    memory: Option<String>,

    /// threads for the external program, defaults to 1
    threads: Option<usize>,

    /// the reference method for the first stage, `scf` or `casscf`
    reference: Method,

    /// global options for every stage's `set` block
    #[serde(default)]
    scf: OptionSet,

    /// options for the correlated solver's `set forte` block
    #[serde(default)]
    forte: OptionSet,

    /// directory of the amplitude store. without it, checkpoints are neither
    /// staged before nor harvested after the correlated stage
    amp_dir: Option<String>,

    /// the reference values to compare against, in order
    #[serde(default)]
    checks: Vec<Check>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawConfig")]
pub struct Config {
    pub name: String,
    pub program: String,
    pub molecule: Molecule,
    pub point_group: PointGroup,
    pub basis: String,
    pub memory: String,
    pub threads: usize,
    pub reference: Method,
    pub scf: OptionSet,
    pub forte: OptionSet,
    pub amp_dir: Option<String>,
    pub checks: Vec<Check>,
}

impl From<RawConfig> for Config {
    fn from(rc: RawConfig) -> Self {
        Self {
            name: rc.name,
            program: rc.program.unwrap_or_else(|| String::from("psi4")),
            molecule: rc
                .geometry
                .parse()
                .unwrap_or_else(|e| panic!("bad geometry: {e}")),
            point_group: rc.point_group,
            basis: rc.basis,
            memory: rc.memory.unwrap_or_else(|| String::from("500 mb")),
            threads: rc.threads.unwrap_or(1),
            reference: rc.reference,
            scf: rc.scf,
            forte: rc.forte,
            amp_dir: rc.amp_dir,
            checks: rc.checks,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    EmptyName,
    EmptyProgram,
    BadThreads,
    /// the reference method has to leave the correlated stage something to do
    BadReference(Method),
    BadDigits {
        label: String,
        digits: i32,
    },
    /// a per-irrep option whose length disagrees with the point group
    BadOccupation {
        key: String,
        len: usize,
        point_group: PointGroup,
    },
    /// a per-irrep option that is not a vector at all
    NotAVector {
        key: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyName => write!(f, "name must not be empty"),
            ConfigError::EmptyProgram => {
                write!(f, "program must not be empty")
            }
            ConfigError::BadThreads => {
                write!(f, "threads must be at least 1")
            }
            ConfigError::BadReference(m) => {
                write!(f, "`{m}` is not a reference method")
            }
            ConfigError::BadDigits { label, digits } => {
                write!(f, "check `{label}` requires at least 1 digit, got {digits}")
            }
            ConfigError::BadOccupation {
                key,
                len,
                point_group,
            } => {
                write!(
                    f,
                    "option `{key}` has {len} entries but point group \
                     {point_group} has {} irreps",
                    point_group.nirrep()
                )
            }
            ConfigError::NotAVector { key } => {
                write!(f, "option `{key}` must be a vector of integers")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn load<P>(filename: P) -> Self
    where
        P: AsRef<Path> + Debug,
    {
        let contents = read_to_string(&filename).unwrap_or_else(|e| {
            panic!("failed to load config from {filename:?} with {e}")
        });
        toml::from_str(&contents).unwrap_or_else(|e| {
            panic!("failed to deserialize config from {filename:?} with {e}")
        })
    }

    /// Check the parts of the config a solve depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.program.split_whitespace().next().is_none() {
            return Err(ConfigError::EmptyProgram);
        }
        if self.threads == 0 {
            return Err(ConfigError::BadThreads);
        }
        if self.reference == Method::Forte {
            return Err(ConfigError::BadReference(self.reference));
        }
        for check in &self.checks {
            if check.digits < 1 {
                return Err(ConfigError::BadDigits {
                    label: check.label.clone(),
                    digits: check.digits,
                });
            }
        }
        let nirrep = self.point_group.nirrep();
        for opts in [&self.scf, &self.forte] {
            for key in PER_IRREP_KEYS {
                match opts.get(key) {
                    None => {}
                    Some(OptValue::IntVec(v)) => {
                        if v.len() != nirrep {
                            return Err(ConfigError::BadOccupation {
                                key: key.to_string(),
                                len: v.len(),
                                point_group: self.point_group,
                            });
                        }
                    }
                    Some(_) => {
                        return Err(ConfigError::NotAVector {
                            key: key.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            name,
            program,
            molecule,
            point_group,
            basis,
            memory,
            threads,
            reference,
            scf,
            forte,
            amp_dir,
            checks,
        } = self;
        writeln!(f, "name = {name}")?;
        writeln!(f, "program = {program}")?;
        writeln!(f, "point_group = {point_group}")?;
        writeln!(f, "basis = {basis}")?;
        writeln!(f, "memory = {memory}")?;
        writeln!(f, "threads = {threads}")?;
        writeln!(f, "reference = {reference}")?;
        writeln!(
            f,
            "amp_dir = {}",
            amp_dir.as_deref().unwrap_or("<none>")
        )?;
        writeln!(f, "molecule = {{\n{molecule}}}")?;
        writeln!(f, "scf = {{")?;
        for (k, v) in scf.iter() {
            writeln!(f, "  {k} = {v}")?;
        }
        writeln!(f, "}}")?;
        writeln!(f, "forte = {{")?;
        for (k, v) in forte.iter() {
            writeln!(f, "  {k} = {v}")?;
        }
        writeln!(f, "}}")?;
        for check in checks {
            writeln!(
                f,
                "check `{}`: {} {} = {:.12} to {} digits",
                check.label, check.stage, check.var, check.want, check.digits
            )?;
        }
        Ok(())
    }
}
