//! Reference wavefunctions and the coefficient punch files that carry them
//! between external program runs.

use std::{
    fmt::Display,
    fs::{File, read_to_string},
    io::Write,
    path::{Path, PathBuf},
};

use nalgebra::DMatrix;

use crate::irrep::Irrep;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum MosError {
    Io(PathBuf, std::io::ErrorKind),
    /// file, 1-based line number, and what went wrong there
    Parse(PathBuf, usize, String),
}

impl Display for MosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MosError::Io(path, kind) => {
                write!(f, "{}: {kind}", path.display())
            }
            MosError::Parse(path, line, msg) => {
                write!(f, "{}:{line}: {msg}", path.display())
            }
        }
    }
}

impl std::error::Error for MosError {}

/// MO coefficients in block form, one block per irrep of the computational
/// point group. Block `h` is row-indexed by symmetry orbitals and
/// column-indexed by molecular orbitals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockMat {
    blocks: Vec<DMatrix<f64>>,
}

impl BlockMat {
    pub fn new(blocks: Vec<DMatrix<f64>>) -> Self {
        Self { blocks }
    }

    pub fn nblocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, h: usize) -> &DMatrix<f64> {
        &self.blocks[h]
    }

    pub fn blocks(&self) -> impl Iterator<Item = &DMatrix<f64>> {
        self.blocks.iter()
    }

    pub fn row_dim(&self, h: usize) -> usize {
        self.blocks[h].nrows()
    }

    pub fn col_dim(&self, h: usize) -> usize {
        self.blocks[h].ncols()
    }

    /// Return a copy with a deterministic sign convention: every column whose
    /// first-row coefficient is negative is negated as a whole. Idempotent,
    /// and the identity on columns already starting with a non-negative
    /// coefficient.
    pub fn fixed_phases(&self) -> Self {
        let mut blocks = self.blocks.clone();
        for block in &mut blocks {
            let (rows, cols) = block.shape();
            if rows == 0 {
                continue;
            }
            for i in 0..cols {
                if block[(0, i)] < 0.0 {
                    for j in 0..rows {
                        block[(j, i)] = -block[(j, i)];
                    }
                }
            }
        }
        Self { blocks }
    }

    /// Read a coefficient punch file written by [Self::dump] or by the
    /// epilogue of a reference-stage input deck.
    pub fn load(
        path: impl AsRef<Path>,
    ) -> Result<(Self, Vec<Irrep>), MosError> {
        let path = path.as_ref();
        let contents = read_to_string(path)
            .map_err(|e| MosError::Io(path.to_path_buf(), e.kind()))?;
        let parse = |line: usize, msg: &str| {
            MosError::Parse(path.to_path_buf(), line, msg.to_string())
        };
        let lines: Vec<&str> = contents.lines().collect();
        let nirrep = match lines
            .first()
            .map(|l| l.split_whitespace().collect::<Vec<_>>())
            .as_deref()
        {
            Some(["nirrep", n]) => n
                .parse::<usize>()
                .map_err(|_| parse(1, "malformed nirrep header"))?,
            _ => return Err(parse(1, "malformed nirrep header")),
        };
        let mut blocks = Vec::with_capacity(nirrep);
        let mut irreps = Vec::with_capacity(nirrep);
        let mut cur = 1;
        for _ in 0..nirrep {
            let Some(head) = lines.get(cur) else {
                return Err(parse(cur + 1, "missing irrep header"));
            };
            let (irrep, rows, cols) =
                match head.split_whitespace().collect::<Vec<_>>()[..] {
                    ["irrep", label, "rows", r, "cols", c] => {
                        let irrep = label.parse::<Irrep>().map_err(|()| {
                            parse(cur + 1, "unknown irrep label")
                        })?;
                        let rows = r.parse::<usize>().map_err(|_| {
                            parse(cur + 1, "malformed row dimension")
                        })?;
                        let cols = c.parse::<usize>().map_err(|_| {
                            parse(cur + 1, "malformed column dimension")
                        })?;
                        (irrep, rows, cols)
                    }
                    _ => return Err(parse(cur + 1, "malformed irrep header")),
                };
            cur += 1;
            let mut data = Vec::with_capacity(rows * cols);
            for _ in 0..rows {
                let Some(line) = lines.get(cur) else {
                    return Err(parse(cur + 1, "missing coefficient row"));
                };
                let row: Vec<f64> = line
                    .split_whitespace()
                    .map(str::parse)
                    .collect::<Result<_, _>>()
                    .map_err(|_| parse(cur + 1, "malformed coefficient"))?;
                if row.len() != cols {
                    return Err(parse(
                        cur + 1,
                        "wrong number of coefficients",
                    ));
                }
                data.extend(row);
                cur += 1;
            }
            irreps.push(irrep);
            blocks.push(DMatrix::from_row_slice(rows, cols, &data));
        }
        Ok((Self { blocks }, irreps))
    }

    /// Write the coefficients to `path` in the punch format [Self::load]
    /// reads. `irreps` labels the blocks and must match them in length.
    pub fn dump(
        &self,
        path: impl AsRef<Path>,
        irreps: &[Irrep],
    ) -> Result<(), MosError> {
        assert_eq!(self.blocks.len(), irreps.len());
        let path = path.as_ref();
        let io = |e: std::io::Error| MosError::Io(path.to_path_buf(), e.kind());
        let mut f = File::create(path).map_err(io)?;
        writeln!(f, "nirrep {}", self.blocks.len()).map_err(io)?;
        for (block, irrep) in self.blocks.iter().zip(irreps) {
            writeln!(
                f,
                "irrep {irrep} rows {} cols {}",
                block.nrows(),
                block.ncols()
            )
            .map_err(io)?;
            for j in 0..block.nrows() {
                let row = (0..block.ncols())
                    .map(|i| format!("{:.12}", block[(j, i)]))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "{row}").map_err(io)?;
            }
        }
        Ok(())
    }
}

/// A converged reference wavefunction: the total energy and MO coefficients,
/// tagged with the irreps of the point group the program actually used.
#[derive(Clone, Debug, PartialEq)]
pub struct Wavefunction {
    pub energy: f64,
    pub irreps: Vec<Irrep>,
    pub ca: BlockMat,
}

impl Wavefunction {
    pub fn nirrep(&self) -> usize {
        self.irreps.len()
    }

    /// [BlockMat::fixed_phases] applied to a copy of the coefficients. The
    /// original is left untouched.
    pub fn with_fixed_phases(&self) -> Self {
        Self {
            energy: self.energy,
            irreps: self.irreps.clone(),
            ca: self.ca.fixed_phases(),
        }
    }
}
