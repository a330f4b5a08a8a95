use std::{fmt::Display, path::Path, process::Command, str::FromStr};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::wavefunction::{MosError, Wavefunction};

pub mod psi4;

/// The energy entry points this crate knows how to request from an external
/// program. `Scf` and `Casscf` are reference methods; `Forte` runs the
/// correlated solver on top of one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(alias = "scf")]
    Scf,
    #[serde(alias = "casscf")]
    Casscf,
    #[serde(alias = "forte")]
    Forte,
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Method::Scf => "scf",
            Method::Casscf => "casscf",
            Method::Forte => "forte",
        })
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scf" => Ok(Method::Scf),
            "casscf" => Ok(Method::Casscf),
            "forte" => Ok(Method::Forte),
            _ => Err(()),
        }
    }
}

/// The parts of a program's output we care about: the final energy, the full
/// table of named output variables, the punched reference wavefunction if the
/// run produced one, and the wall time the program reported.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramResult {
    pub energy: f64,
    pub variables: FxHashMap<String, f64>,
    pub wavefunction: Option<Wavefunction>,
    pub time: f64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProgramError {
    FileNotFound(String),
    ReadFileError(String, std::io::ErrorKind),
    WriteFileError(String, std::io::ErrorKind),
    SpawnFailure(String, std::io::ErrorKind),
    ErrorInOutput(String),
    NoConvergence(String),
    EnergyNotFound(String),
    EnergyParseError(String),
    BadMos(MosError),
}

impl ProgramError {
    /// helper for matching the NoConvergence variant
    #[must_use]
    pub fn is_no_convergence(&self) -> bool {
        matches!(self, Self::NoConvergence(_))
    }
}

impl From<MosError> for ProgramError {
    fn from(e: MosError) -> Self {
        Self::BadMos(e)
    }
}

impl Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ProgramError {}

/// One calculation for an external quantum chemistry program: how to write
/// its input file and how to read its results back.
pub trait Program {
    /// the job's base file name, without an extension
    fn filename(&self) -> String;

    fn set_filename(&mut self, filename: &str);

    /// the input file extension to append to [Self::filename]
    fn extension(&self) -> String;

    fn infile(&self) -> String {
        let filename = self.filename();
        format!("{}.{}", filename, self.extension())
    }

    fn outfile(&self) -> String {
        self.filename() + ".out"
    }

    fn method(&self) -> Method;

    /// command line arguments placed after the program name itself. the
    /// program runs in the directory holding the job's files, so paths here
    /// are bare file names
    fn run_args(&self) -> Vec<String> {
        vec![
            String::from("-i"),
            base_name(&self.infile()).to_string(),
            String::from("-o"),
            base_name(&self.outfile()).to_string(),
        ]
    }

    /// write the input file to [Self::infile]
    fn write_input(&mut self) -> Result<(), ProgramError>;

    /// parse an output file. `filename` should not include an extension;
    /// implementations derive the files they need from it
    fn read_output(filename: &str) -> Result<ProgramResult, ProgramError>
    where
        Self: Sized;

    /// every file this job writes or reads, for cleanup after a run
    fn associated_files(&self) -> Vec<String>;
}

/// Write `job`'s input file, run `cmd` on it to completion, and parse the
/// output. `cmd` is split on whitespace: the first word is the program to
/// invoke and the rest become leading arguments, ahead of
/// [Program::run_args]. The program runs with `dir` as its working
/// directory, so checkpoint files it keeps there land next to the job's
/// own files. Blocks until the program exits.
pub fn run_job<P: Program>(
    cmd: &str,
    dir: impl AsRef<Path>,
    job: &mut P,
) -> Result<ProgramResult, ProgramError> {
    let dir = dir.as_ref();
    let mut words = cmd.split_whitespace();
    let Some(bin) = words.next() else {
        return Err(ProgramError::SpawnFailure(
            String::from("empty program command"),
            std::io::ErrorKind::NotFound,
        ));
    };
    job.write_input()?;
    // any output from an earlier run is stale now
    let _ = std::fs::remove_file(job.outfile());
    log::debug!("running `{cmd}` on {} in {}", job.infile(), dir.display());
    let output = Command::new(bin)
        .args(words)
        .args(job.run_args())
        .current_dir(dir)
        .output()
        .map_err(|e| ProgramError::SpawnFailure(job.infile(), e.kind()))?;
    if !output.status.success() {
        log::warn!(
            "`{bin}` exited with status {:?} for {}",
            output.status.code(),
            job.infile()
        );
    }
    P::read_output(&job.filename())
}

pub(crate) fn parse_f64(s: &str, outname: &str) -> Result<f64, ProgramError> {
    s.parse()
        .map_err(|_| ProgramError::EnergyParseError(outname.to_string()))
}

/// the file-name component of `path`, as the program sees it from inside
/// the job's directory
pub(crate) fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(path)
}
