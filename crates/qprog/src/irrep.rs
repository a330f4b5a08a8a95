use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// an irreducible representation of an abelian point group
#[derive(
    Debug,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Copy,
    Clone,
    Serialize,
    Hash,
)]
pub enum Irrep {
    // C1
    A,
    // C2
    B,
    // Cs - p = prime
    Ap,
    App,
    // C2v
    A1,
    A2,
    B1,
    B2,
    // D2
    B3,
    // C2h
    Ag,
    Au,
    Bg,
    Bu,
    // D2h
    B1g,
    B2g,
    B3g,
    B1u,
    B2u,
    B3u,
}

impl Display for Irrep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Irrep::A => "A",
            Irrep::B => "B",
            Irrep::Ap => "Ap",
            Irrep::App => "App",
            Irrep::A1 => "A1",
            Irrep::A2 => "A2",
            Irrep::B1 => "B1",
            Irrep::B2 => "B2",
            Irrep::B3 => "B3",
            Irrep::Ag => "Ag",
            Irrep::Au => "Au",
            Irrep::Bg => "Bg",
            Irrep::Bu => "Bu",
            Irrep::B1g => "B1g",
            Irrep::B2g => "B2g",
            Irrep::B3g => "B3g",
            Irrep::B1u => "B1u",
            Irrep::B2u => "B2u",
            Irrep::B3u => "B3u",
        })
    }
}

impl FromStr for Irrep {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Irrep::A),
            "B" => Ok(Irrep::B),
            "Ap" | "A'" => Ok(Irrep::Ap),
            "App" | "A''" => Ok(Irrep::App),
            "A1" => Ok(Irrep::A1),
            "A2" => Ok(Irrep::A2),
            "B1" => Ok(Irrep::B1),
            "B2" => Ok(Irrep::B2),
            "B3" => Ok(Irrep::B3),
            "Ag" => Ok(Irrep::Ag),
            "Au" => Ok(Irrep::Au),
            "Bg" => Ok(Irrep::Bg),
            "Bu" => Ok(Irrep::Bu),
            "B1g" => Ok(Irrep::B1g),
            "B2g" => Ok(Irrep::B2g),
            "B3g" => Ok(Irrep::B3g),
            "B1u" => Ok(Irrep::B1u),
            "B2u" => Ok(Irrep::B2u),
            "B3u" => Ok(Irrep::B3u),
            _ => Err(()),
        }
    }
}

/// an abelian point group, in the orientation the external program settles on
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Copy, Clone, Hash)]
pub enum PointGroup {
    #[serde(alias = "c1")]
    C1,
    #[serde(alias = "ci")]
    Ci,
    #[serde(alias = "cs")]
    Cs,
    #[serde(alias = "c2")]
    C2,
    #[serde(alias = "c2v")]
    C2v,
    #[serde(alias = "c2h")]
    C2h,
    #[serde(alias = "d2")]
    D2,
    #[serde(alias = "d2h")]
    D2h,
}

impl PointGroup {
    pub fn nirrep(self) -> usize {
        self.irreps().len()
    }

    /// the group's irreps in Cotton order, the order the external program
    /// uses for its per-irrep dimension and occupation arrays
    pub fn irreps(self) -> &'static [Irrep] {
        use Irrep::*;
        match self {
            Self::C1 => &[A],
            Self::Ci => &[Ag, Au],
            Self::Cs => &[Ap, App],
            Self::C2 => &[A, B],
            Self::C2v => &[A1, A2, B1, B2],
            Self::C2h => &[Ag, Bg, Au, Bu],
            Self::D2 => &[A, B1, B2, B3],
            Self::D2h => &[Ag, B1g, B2g, B3g, Au, B1u, B2u, B3u],
        }
    }
}

impl Display for PointGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            PointGroup::C1 => "c1",
            PointGroup::Ci => "ci",
            PointGroup::Cs => "cs",
            PointGroup::C2 => "c2",
            PointGroup::C2v => "c2v",
            PointGroup::C2h => "c2h",
            PointGroup::D2 => "d2",
            PointGroup::D2h => "d2h",
        })
    }
}

impl FromStr for PointGroup {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "c1" => Ok(PointGroup::C1),
            "ci" => Ok(PointGroup::Ci),
            "cs" => Ok(PointGroup::Cs),
            "c2" => Ok(PointGroup::C2),
            "c2v" => Ok(PointGroup::C2v),
            "c2h" => Ok(PointGroup::C2h),
            "d2" => Ok(PointGroup::D2),
            "d2h" => Ok(PointGroup::D2h),
            _ => Err(()),
        }
    }
}
