use approx::assert_abs_diff_eq;
use insta::assert_snapshot;
use qprog::wavefunction::BlockMat;

use crate::check::{Check, compare_values};

use super::*;

/// the command for a stand-in program that copies canned outputs
fn fake(script: &str) -> String {
    let script = Path::new("testfiles").join(script);
    format!("sh {}", script.canonicalize().unwrap().display())
}

#[test]
fn full_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::load("testfiles/n2.toml");
    config.program = fake("fake_psi4.sh");

    let summary = run_test(&config, tmp.path()).unwrap();
    assert!(summary.passed());
    assert_eq!(summary.reference_energy, -108.867618373021);
    assert_eq!(summary.correlated_energy, -109.100837616507);
    assert_abs_diff_eq!(summary.time, 102.5, epsilon = 1e-9);
    assert_snapshot!(summary, @r"
    ==> n2 <==
    reference energy  = -108.867618373021
    correlated energy = -109.100837616507
    wall time         = 102.50 s
    PASS  RHF energy: got -108.867618373021, want -108.867618373021 to 8 digits
    PASS  MR-LDSRG(2) unrelaxed energy: got -109.100837616507, want -109.100837616507 to 8 digits
    2/2 checks passed
    ");

    // the guess punched for the correlated stage has its phases pinned
    let (ca, irreps) =
        BlockMat::load(tmp.path().join("n2_guess.mos")).unwrap();
    assert_eq!(irreps, PointGroup::D2h.irreps());
    for block in ca.blocks() {
        for j in 0..block.ncols() {
            assert!(block[(0, j)] >= 0.0);
        }
    }
    assert_eq!(ca.block(0)[(0, 1)], 0.155457);
    // B2g converged to the opposite sign of B3g; fixing makes them agree
    assert_eq!(ca.block(2), ca.block(3));

    assert!(tmp.path().join("n2_ref.out").exists());
    assert!(tmp.path().join("n2_cor.dat").exists());
    assert!(tmp.path().join("forte.amps").exists());
    cleanup(&config.name, tmp.path());
    for file in [
        "n2_ref.dat",
        "n2_ref.out",
        "n2_ref.mos",
        "n2_guess.mos",
        "n2_cor.dat",
        "n2_cor.out",
        "forte.amps",
    ] {
        assert!(!tmp.path().join(file).exists(), "{file} survived cleanup");
    }
}

/// dropping the commutator truncation moves the energy past the checked
/// tolerance, while each run still matches its own reference value
#[test]
fn truncated_commutator() {
    let tmp = tempfile::tempdir().unwrap();

    let mut config = Config::load("testfiles/n2.toml");
    config.program = fake("fake_psi4.sh");
    let truncated = run_test(&config, tmp.path()).unwrap();
    assert!(truncated.passed());

    let mut config = Config::load("testfiles/n2full.toml");
    config.program = fake("fake_psi4.sh");
    let full = run_test(&config, tmp.path()).unwrap();
    assert!(full.passed());

    assert_eq!(full.correlated_energy, -109.100877299246);
    assert!(compare_values(
        truncated.correlated_energy,
        full.correlated_energy,
        4
    ));
    assert!(!compare_values(
        truncated.correlated_energy,
        full.correlated_energy,
        8
    ));
}

/// the solver reads and writes its amplitude checkpoint in the directory it
/// runs in, and the store has to meet it there
#[test]
fn amp_restart() {
    let amps = tempfile::tempdir().unwrap();
    let mut config = Config::load("testfiles/n2.toml");
    config.program = fake("fake_psi4.sh");
    config.amp_dir = Some(amps.path().to_string_lossy().to_string());
    config.forte.insert("dsrg_dump_amps", true);
    let stored = amps.path().join("n2.amps");

    // first run: nothing staged, the solver converges from scratch and its
    // checkpoint is banked
    let work = tempfile::tempdir().unwrap();
    assert!(run_test(&config, work.path()).unwrap().passed());
    assert_eq!(
        std::fs::read_to_string(&stored).unwrap(),
        "t1 t2 checkpoint\n"
    );

    // second run in a fresh workdir: the staged checkpoint reaches the
    // solver, and what the solver writes there replaces the banked copy
    let work = tempfile::tempdir().unwrap();
    assert!(run_test(&config, work.path()).unwrap().passed());
    assert_eq!(
        std::fs::read_to_string(work.path().join(AMPS_FILE)).unwrap(),
        "restart checkpoint\n"
    );
    assert_eq!(
        std::fs::read_to_string(&stored).unwrap(),
        "restart checkpoint\n"
    );
}

#[test]
fn no_convergence() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::load("testfiles/n2.toml");
    config.program = fake("fake_noconv.sh");
    let err = run_test(&config, tmp.path()).unwrap_err();
    assert_eq!(
        err,
        RunError::Solve(
            Stage::Reference,
            ProgramError::NoConvergence(format!(
                "{}/n2_ref.out",
                tmp.path().display()
            ))
        )
    );
}

#[test]
fn symmetry_mismatch() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = r#"
name = "n2"
geometry = "0 1\nN\nN 1 R\n\nR = 1.1"
point_group = "c2v"
basis = "6-31g"
reference = "scf"
"#;
    let mut config: Config = toml::from_str(raw).unwrap();
    config.program = fake("fake_psi4.sh");
    let err = run_test(&config, tmp.path()).unwrap_err();
    assert_eq!(
        err,
        RunError::SymmetryMismatch {
            point_group: PointGroup::C2v,
            nirrep: 8
        }
    );
    assert_snapshot!(
        err,
        @"the reference ran with 8 irreps, but point group c2v has 4"
    );
}

#[test]
fn missing_variable() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = Config::load("testfiles/n2.toml");
    config.program = fake("fake_psi4.sh");
    config.checks.push(Check {
        label: String::from("MP2 energy"),
        stage: Stage::Reference,
        var: String::from("MP2 TOTAL ENERGY"),
        want: 0.0,
        digits: 8,
    });
    let err = run_test(&config, tmp.path()).unwrap_err();
    assert_eq!(
        err,
        RunError::MissingVar(
            Stage::Reference,
            String::from("MP2 TOTAL ENERGY")
        )
    );
}

/// needs real psi4 and forte installations on the path
#[test]
#[ignore]
fn real_psi4() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::load("testfiles/n2.toml");
    let summary = run_test(&config, tmp.path()).unwrap();
    assert_abs_diff_eq!(
        summary.reference_energy,
        -108.867618373021401,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        summary.correlated_energy,
        -109.100837616506638,
        epsilon = 1e-8
    );
    assert!(summary.passed());
}
