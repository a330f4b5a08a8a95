//! Infrastructure for driving external quantum chemistry packages: molecule
//! and option handling, input generation, output parsing, and the orbital and
//! amplitude files passed between runs.

pub mod geom;
pub mod irrep;
pub mod options;
pub mod program;
pub mod store;
pub mod wavefunction;
