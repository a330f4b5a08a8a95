use std::{fs::read_to_string, path::Path, sync::OnceLock};

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::{
    geom::Molecule,
    irrep::PointGroup,
    options::OptionSet,
    program::{base_name, parse_f64},
    wavefunction::{BlockMat, Wavefunction},
};

use super::{Method, Program, ProgramError, ProgramResult};

#[cfg(test)]
mod tests;

/// One invocation of the external program, from generated input deck to
/// parsed output file.
///
/// A reference job (`Scf` or `Casscf`) punches its converged MO coefficients
/// to a `.mos` file next to the output, so the caller gets them back in
/// [ProgramResult::wavefunction]. A `Forte` job instead reruns its reference
/// method, overwrites the fresh orbitals with a guess punch when one is
/// supplied, and hands the result to the correlated solver.
#[derive(Clone, Debug, PartialEq)]
pub struct Psi4 {
    filename: String,
    method: Method,
    ref_method: Method,
    molecule: Molecule,
    point_group: PointGroup,
    globals: OptionSet,
    forte: OptionSet,
    memory: String,
    threads: usize,
    guess: Option<String>,
}

impl Psi4 {
    pub fn new(
        filename: impl Into<String>,
        method: Method,
        molecule: Molecule,
        point_group: PointGroup,
    ) -> Self {
        Self {
            filename: filename.into(),
            method,
            ref_method: Method::Scf,
            molecule,
            point_group,
            globals: OptionSet::new(),
            forte: OptionSet::new(),
            memory: String::from("500 mb"),
            threads: 1,
            guess: None,
        }
    }

    /// options for the top-level `set` block, shared by every stage
    pub fn globals(mut self, opts: OptionSet) -> Self {
        self.globals = opts;
        self
    }

    /// options for the correlated solver's `set forte` block
    pub fn forte(mut self, opts: OptionSet) -> Self {
        self.forte = opts;
        self
    }

    /// the reference method a `Forte` job reruns before the correlated solver
    pub fn ref_method(mut self, method: Method) -> Self {
        self.ref_method = method;
        self
    }

    pub fn memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = memory.into();
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// path of a punch file to load over the reference orbitals; the deck
    /// refers to it by file name, so it must sit in the job's directory
    pub fn guess(mut self, path: impl Into<String>) -> Self {
        self.guess = Some(path.into());
        self
    }

    /// the file a reference job punches its MO coefficients to
    pub fn mosfile(&self) -> String {
        self.filename.clone() + ".mos"
    }

    fn punch_epilogue(&self) -> String {
        // the deck runs in the job's directory, so it punches to a bare name
        format!(
            r#"
ca = wfn.Ca()
rowdim = ca.rowdim()
coldim = ca.coldim()
labels = wfn.molecule().irrep_labels()
with open('{}', 'w') as f:
    f.write('nirrep %d\n' % ca.nirrep())
    for h in range(ca.nirrep()):
        f.write('irrep %s rows %d cols %d\n' % (labels[h], rowdim[h], coldim[h]))
        for j in range(rowdim[h]):
            f.write(' '.join('%.12f' % ca.get(h, j, i) for i in range(coldim[h])) + '\n')
"#,
            base_name(&self.mosfile())
        )
    }

    fn guess_prologue(guess: &str) -> String {
        format!(
            r#"
ca = wfn.Ca()
with open('{guess}') as f:
    f.readline()
    for h in range(ca.nirrep()):
        dims = f.readline().split()
        for j in range(int(dims[3])):
            row = f.readline().split()
            for i in range(int(dims[5])):
                ca.set(h, j, i, float(row[i]))
"#
        )
    }
}

impl Program for Psi4 {
    fn filename(&self) -> String {
        self.filename.clone()
    }

    fn set_filename(&mut self, filename: &str) {
        self.filename = filename.into();
    }

    fn extension(&self) -> String {
        String::from("dat")
    }

    fn method(&self) -> Method {
        self.method
    }

    fn run_args(&self) -> Vec<String> {
        vec![
            String::from("-i"),
            base_name(&self.infile()).to_string(),
            String::from("-o"),
            base_name(&self.outfile()).to_string(),
            String::from("-n"),
            self.threads.to_string(),
        ]
    }

    fn write_input(&mut self) -> Result<(), ProgramError> {
        let mut body = format!(
            "memory {}\n\nmolecule {{\n{}symmetry {}\n}}\n",
            self.memory, self.molecule, self.point_group
        );
        if !self.globals.is_empty() {
            body.push_str("\nset {\n");
            for (k, v) in self.globals.iter() {
                body.push_str(&format!("  {k} {v}\n"));
            }
            body.push_str("}\n");
        }
        if self.method == Method::Forte && !self.forte.is_empty() {
            body.push_str("\nset forte {\n");
            for (k, v) in self.forte.iter() {
                body.push_str(&format!("  {k} {v}\n"));
            }
            body.push_str("}\n");
        }
        match self.method {
            Method::Scf | Method::Casscf => {
                body.push_str(&format!(
                    "\ne, wfn = energy('{}', return_wfn=True)\n",
                    self.method
                ));
                body.push_str(&self.punch_epilogue());
            }
            Method::Forte => {
                body.push_str(&format!(
                    "\ne, wfn = energy('{}', return_wfn=True)\n",
                    self.ref_method
                ));
                if let Some(guess) = &self.guess {
                    body.push_str(&Self::guess_prologue(base_name(guess)));
                }
                body.push_str("\ne = energy('forte', ref_wfn=wfn)\n");
            }
        }
        body.push_str("\nprint_variables()\n");

        // a punch left over from an earlier run must not outlive its deck
        let _ = std::fs::remove_file(self.mosfile());
        let infile = self.infile();
        std::fs::write(&infile, body)
            .map_err(|e| ProgramError::WriteFileError(infile.clone(), e.kind()))
    }

    fn read_output(filename: &str) -> Result<ProgramResult, ProgramError> {
        static CELL: OnceLock<[Regex; 4]> = OnceLock::new();
        let [noconv_re, error_re, var_re, time_re] = CELL.get_or_init(|| {
            [
                Regex::new(
                    "(?i)failed to converge|could not converge\
                     |has not converged|convergenceerror",
                )
                .unwrap(),
                Regex::new(
                    "(?i)psiexception|traceback|fatal error\
                     |validationerror|runtimeerror",
                )
                .unwrap(),
                Regex::new(r#"^\s*"([^"]+)"\s*=>\s*(-?\d+\.\d+)"#).unwrap(),
                Regex::new(r"wall time for execution:\s*(\d+):(\d+):(\d+\.?\d*)")
                    .unwrap(),
            ]
        });

        let outfile = format!("{filename}.out");
        if !Path::new(&outfile).exists() {
            return Err(ProgramError::FileNotFound(outfile));
        }
        let contents = read_to_string(&outfile)
            .map_err(|e| ProgramError::ReadFileError(outfile.clone(), e.kind()))?;

        // a convergence failure also raises an exception, so check for it
        // before the generic error markers
        if noconv_re.is_match(&contents) {
            return Err(ProgramError::NoConvergence(outfile));
        }
        if error_re.is_match(&contents) {
            return Err(ProgramError::ErrorInOutput(outfile));
        }

        let mut variables = FxHashMap::default();
        let mut time = 0.0;
        for line in contents.lines() {
            if let Some(caps) = var_re.captures(line) {
                let val = parse_f64(&caps[2], &outfile)?;
                variables.insert(caps[1].to_string(), val);
            } else if let Some(caps) = time_re.captures(line) {
                let h: f64 = caps[1].parse().unwrap();
                let m: f64 = caps[2].parse().unwrap();
                let s: f64 = caps[3].parse().unwrap();
                time = 3600.0 * h + 60.0 * m + s;
            }
        }

        let Some(&energy) = variables.get("CURRENT ENERGY") else {
            return Err(ProgramError::EnergyNotFound(outfile));
        };

        let mosfile = format!("{filename}.mos");
        let wavefunction = if Path::new(&mosfile).exists() {
            let (ca, irreps) = BlockMat::load(&mosfile)?;
            Some(Wavefunction { energy, irreps, ca })
        } else {
            None
        };

        Ok(ProgramResult {
            energy,
            variables,
            wavefunction,
            time,
        })
    }

    fn associated_files(&self) -> Vec<String> {
        vec![self.infile(), self.outfile(), self.mosfile()]
    }
}
