use std::{fs::read_to_string, path::Path};

use approx::assert_abs_diff_eq;
use insta::assert_snapshot;

use crate::{
    irrep::Irrep::*,
    program::run_job,
    wavefunction::MosError,
};

use super::*;

fn n2() -> Molecule {
    "0 1\nN\nN 1 R\n\nR = 1.1\n".parse().unwrap()
}

fn scf_options() -> OptionSet {
    let mut opts = OptionSet::new();
    opts.insert("basis", "6-31g");
    opts.insert("scf_type", "pk");
    opts.insert("reference", "rhf");
    opts.insert("d_convergence", 8);
    opts.insert("e_convergence", 12);
    opts
}

fn forte_options() -> OptionSet {
    let mut opts = OptionSet::new();
    opts.insert("active_space_solver", "fci");
    opts.insert("correlation_solver", "mrdsrg");
    opts.insert("corr_level", "ldsrg2");
    opts.insert("restricted_docc", vec![2, 0, 0, 0, 0, 2, 0, 0]);
    opts.insert("active", vec![1, 0, 1, 1, 0, 1, 1, 1]);
    opts.insert("dsrg_s", 1.0);
    opts.insert("e_convergence", 1e-8);
    opts.insert("r_convergence", 1e-7);
    opts.insert("dsrg_read_amps", true);
    opts.insert("dsrg_diis_start", 1);
    opts
}

#[test]
fn method_round_trip() {
    for m in [Method::Scf, Method::Casscf, Method::Forte] {
        assert_eq!(m.to_string().parse::<Method>(), Ok(m));
    }
    assert_eq!("SCF".parse(), Ok(Method::Scf));
    assert!("mp2".parse::<Method>().is_err());
}

#[test]
fn write_scf_input() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("n2_ref");
    let base = base.to_str().unwrap();
    let mut job = Psi4::new(base, Method::Scf, n2(), PointGroup::D2h)
        .globals(scf_options())
        .memory("3 gb")
        .threads(10);
    job.write_input().unwrap();
    let got = read_to_string(job.infile()).unwrap();
    // paths inside the deck are relative to the job's directory
    let want = r#"memory 3 gb

molecule {
0 1
N
N 1 R

R = 1.1
symmetry d2h
}

set {
  basis 6-31g
  scf_type pk
  reference rhf
  d_convergence 8
  e_convergence 12
}

e, wfn = energy('scf', return_wfn=True)

ca = wfn.Ca()
rowdim = ca.rowdim()
coldim = ca.coldim()
labels = wfn.molecule().irrep_labels()
with open('n2_ref.mos', 'w') as f:
    f.write('nirrep %d\n' % ca.nirrep())
    for h in range(ca.nirrep()):
        f.write('irrep %s rows %d cols %d\n' % (labels[h], rowdim[h], coldim[h]))
        for j in range(rowdim[h]):
            f.write(' '.join('%.12f' % ca.get(h, j, i) for i in range(coldim[h])) + '\n')

print_variables()
"#;
    assert_eq!(got, want);
}

#[test]
fn write_forte_input() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("n2_cor");
    let base = base.to_str().unwrap();
    let guess = tmp.path().join("n2_guess.mos");
    let guess = guess.to_str().unwrap();
    let mut job = Psi4::new(base, Method::Forte, n2(), PointGroup::D2h)
        .globals(scf_options())
        .forte(forte_options())
        .memory("3 gb")
        .threads(10)
        .guess(guess);
    job.write_input().unwrap();
    let got = read_to_string(job.infile()).unwrap();
    let want = r#"memory 3 gb

molecule {
0 1
N
N 1 R

R = 1.1
symmetry d2h
}

set {
  basis 6-31g
  scf_type pk
  reference rhf
  d_convergence 8
  e_convergence 12
}

set forte {
  active_space_solver fci
  correlation_solver mrdsrg
  corr_level ldsrg2
  restricted_docc [2, 0, 0, 0, 0, 2, 0, 0]
  active [1, 0, 1, 1, 0, 1, 1, 1]
  dsrg_s 1.0
  e_convergence 0.00000001
  r_convergence 0.0000001
  dsrg_read_amps true
  dsrg_diis_start 1
}

e, wfn = energy('scf', return_wfn=True)

ca = wfn.Ca()
with open('n2_guess.mos') as f:
    f.readline()
    for h in range(ca.nirrep()):
        dims = f.readline().split()
        for j in range(int(dims[3])):
            row = f.readline().split()
            for i in range(int(dims[5])):
                ca.set(h, j, i, float(row[i]))

e = energy('forte', ref_wfn=wfn)

print_variables()
"#;
    assert_eq!(got, want);
}

#[test]
fn write_casscf_ref_input() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("n2_cor");
    let mut job =
        Psi4::new(base.to_str().unwrap(), Method::Forte, n2(), PointGroup::D2h)
            .ref_method(Method::Casscf);
    job.write_input().unwrap();
    let got = read_to_string(job.infile()).unwrap();
    // without a guess, the correlated deck reruns its reference and goes
    // straight into the solver
    assert!(got.contains("e, wfn = energy('casscf', return_wfn=True)"));
    assert!(got.contains("e = energy('forte', ref_wfn=wfn)"));
    assert!(!got.contains("with open"));
}

#[test]
fn read_scf_output() {
    let res = Psi4::read_output("testfiles/n2_ref").unwrap();
    assert_eq!(res.energy, -108.867618373021);
    assert_eq!(res.time, 2.11);
    assert_eq!(res.variables["SCF TOTAL ENERGY"], -108.867618373021);
    assert_eq!(res.variables["NUCLEAR REPULSION ENERGY"], 23.572901940401);
    let wfn = res.wavefunction.unwrap();
    assert_eq!(wfn.energy, res.energy);
    assert_eq!(wfn.nirrep(), 8);
    assert_eq!(wfn.irreps, vec![Ag, B1g, B2g, B3g, Au, B1u, B2u, B3u]);
    let dims: Vec<_> = wfn.ca.blocks().map(|b| b.nrows()).collect();
    assert_eq!(dims, [5, 0, 2, 2, 0, 5, 2, 2]);
    assert_eq!(wfn.ca.block(0)[(0, 0)], 0.703069);
    assert_eq!(wfn.ca.block(0)[(0, 1)], -0.155457);
}

#[test]
fn read_forte_output() {
    let res = Psi4::read_output("testfiles/n2_cor").unwrap();
    assert_eq!(res.energy, -109.100837616507);
    assert_eq!(res.time, 100.39);
    assert_eq!(
        res.variables["CURRENT REFERENCE ENERGY"],
        -108.940698994036
    );
    assert_eq!(res.variables["UNRELAXED ENERGY"], -109.100837616507);
    assert!(res.wavefunction.is_none());
}

#[test]
fn read_errors() {
    assert_eq!(
        Psi4::read_output("testfiles/missing"),
        Err(ProgramError::FileNotFound("testfiles/missing.out".into()))
    );
    let err = Psi4::read_output("testfiles/noconv").unwrap_err();
    assert!(err.is_no_convergence());
    assert_eq!(
        err,
        ProgramError::NoConvergence("testfiles/noconv.out".into())
    );
    assert_eq!(
        Psi4::read_output("testfiles/bad"),
        Err(ProgramError::ErrorInOutput("testfiles/bad.out".into()))
    );
    assert_eq!(
        Psi4::read_output("testfiles/noenergy"),
        Err(ProgramError::EnergyNotFound("testfiles/noenergy.out".into()))
    );
    assert!(matches!(
        Psi4::read_output("testfiles/badmos"),
        Err(ProgramError::BadMos(MosError::Parse(..)))
    ));
}

#[test]
fn error_display() {
    let err = Psi4::read_output("testfiles/noconv").unwrap_err();
    assert_snapshot!(err, @r#"NoConvergence("testfiles/noconv.out")"#);
}

#[test]
fn run_fake_program() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    // the fake runs inside `tmp`, so the canned files need full paths
    let refout = Path::new("testfiles/n2_ref.out").canonicalize()?;
    let refmos = Path::new("testfiles/n2_ref.mos").canonicalize()?;
    let fake = tmp.path().join("fake.sh");
    std::fs::write(
        &fake,
        format!(
            concat!(
                "#!/bin/sh\n",
                "while [ $# -gt 0 ]; do case $1 in -o) out=$2; shift;; esac; shift; done\n",
                "cp {} \"$out\"\n",
                "cp {} \"${{out%.out}}.mos\"\n",
            ),
            refout.display(),
            refmos.display(),
        ),
    )?;
    let base = tmp.path().join("n2_ref");
    let mut job =
        Psi4::new(base.to_str().unwrap(), Method::Scf, n2(), PointGroup::D2h)
            .globals(scf_options());
    let res =
        run_job(&format!("sh {}", fake.display()), tmp.path(), &mut job)?;
    assert_eq!(res.energy, -108.867618373021);
    assert!(res.wavefunction.is_some());
    assert!(Path::new(&job.infile()).exists());
    for file in job.associated_files() {
        assert!(Path::new(&file).exists(), "{file} missing");
    }
    Ok(())
}

#[test]
fn run_missing_program() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("n2_ref");
    let mut job =
        Psi4::new(base.to_str().unwrap(), Method::Scf, n2(), PointGroup::D2h);
    assert!(matches!(
        run_job("surely_not_a_real_program", tmp.path(), &mut job),
        Err(ProgramError::SpawnFailure(..))
    ));
    assert!(matches!(
        run_job("", tmp.path(), &mut job),
        Err(ProgramError::SpawnFailure(..))
    ));
}

/// requires a real `psi4` on the PATH
#[test]
#[ignore]
fn psi4_scf() {
    let tmp = tempfile::tempdir().unwrap();
    let base = tmp.path().join("n2_ref");
    let mut job =
        Psi4::new(base.to_str().unwrap(), Method::Scf, n2(), PointGroup::D2h)
            .globals(scf_options())
            .memory("3 gb")
            .threads(2);
    let res = run_job("psi4", tmp.path(), &mut job).unwrap();
    assert_abs_diff_eq!(res.energy, -108.867618373021401, epsilon = 1e-9);
    let wfn = res.wavefunction.unwrap();
    assert_eq!(wfn.nirrep(), 8);
    assert_eq!(
        wfn.ca.blocks().map(|b| b.nrows()).sum::<usize>(),
        18
    );
}
