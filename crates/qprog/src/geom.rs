use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// A molecular geometry, either a list of cartesian atoms or a Z-matrix
/// carried verbatim for the external program to interpret.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub enum Geom {
    Xyz(Vec<Atom>),
    Zmat(String),
}

impl Default for Geom {
    fn default() -> Self {
        Self::Xyz(Default::default())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ParseGeomError(pub String);

impl Display for ParseGeomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse geometry line `{}`", self.0)
    }
}

impl std::error::Error for ParseGeomError {}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Atom {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Atom {
    pub fn new(label: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            z,
        }
    }
}

impl FromStr for Atom {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = s.split_whitespace().collect();
        let [label, x, y, z] = fields[..] else {
            return Err(());
        };
        Ok(Self {
            label: label.to_string(),
            x: x.parse().map_err(|_| ())?,
            y: y.parse().map_err(|_| ())?,
            z: z.parse().map_err(|_| ())?,
        })
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:5}{:15.10}{:15.10}{:15.10}",
            self.label, self.x, self.y, self.z
        )
    }
}

impl FromStr for Geom {
    type Err = ParseGeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut atoms = Vec::new();
        let mut skip = 0;
        for line in s.lines() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            let fields = line.split_whitespace().collect::<Vec<_>>();
            if fields.is_empty() {
                continue;
            }
            if fields.len() == 1 {
                if fields[0].chars().all(char::is_alphabetic) {
                    // a lone atomic symbol starts a Z-matrix
                    return Ok(Geom::Zmat(String::from(s)));
                } else {
                    // an XYZ atom count, followed by a comment line
                    skip = 1;
                    continue;
                }
            }
            atoms.push(
                line.parse()
                    .map_err(|()| ParseGeomError(line.to_string()))?,
            );
        }
        Ok(Geom::Xyz(atoms))
    }
}

impl Geom {
    pub fn xyz(&self) -> Option<&Vec<Atom>> {
        match &self {
            Geom::Xyz(x) => Some(x),
            _ => None,
        }
    }

    pub fn zmat(&self) -> Option<&String> {
        match &self {
            Geom::Zmat(x) => Some(x),
            _ => None,
        }
    }

    pub fn is_xyz(&self) -> bool {
        matches!(self, Geom::Xyz(_))
    }

    pub fn is_zmat(&self) -> bool {
        matches!(self, Geom::Zmat(_))
    }

    /// Extract the `NAME = value` variable bindings from a Z-matrix. Returns
    /// an empty Vec for cartesian geometries.
    pub fn zvars(&self) -> Vec<(String, f64)> {
        let Geom::Zmat(s) = self else {
            return Vec::new();
        };
        let mut ret = Vec::new();
        for line in s.lines() {
            if let Some((name, val)) = line.split_once('=') {
                if let Ok(v) = val.trim().parse::<f64>() {
                    ret.push((name.trim().to_string(), v));
                }
            }
        }
        ret
    }
}

impl Display for Geom {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Geom::Xyz(atoms) => {
                for atom in atoms {
                    writeln!(f, "{atom}")?;
                }
            }
            Geom::Zmat(geom) => writeln!(f, "{}", geom.trim_end())?,
        }
        Ok(())
    }
}

/// Charge, spin multiplicity, and geometry for a single molecule. Immutable
/// once constructed.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Molecule {
    charge: isize,
    multiplicity: usize,
    geom: Geom,
}

impl Molecule {
    pub fn new(charge: isize, multiplicity: usize, geom: Geom) -> Self {
        Self {
            charge,
            multiplicity,
            geom,
        }
    }

    pub fn charge(&self) -> isize {
        self.charge
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    pub fn geom(&self) -> &Geom {
        &self.geom
    }
}

impl FromStr for Molecule {
    type Err = ParseGeomError;

    /// Parse an optional leading `charge multiplicity` line, followed by the
    /// geometry itself. Without the leading line, the molecule defaults to a
    /// neutral singlet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for (i, line) in s.lines().enumerate() {
            let fields = line.split_whitespace().collect::<Vec<_>>();
            if fields.is_empty() {
                continue;
            }
            if fields.len() == 2 {
                if let (Ok(charge), Ok(multiplicity)) =
                    (fields[0].parse(), fields[1].parse())
                {
                    let rest =
                        s.lines().skip(i + 1).collect::<Vec<_>>().join("\n");
                    return Ok(Self {
                        charge,
                        multiplicity,
                        geom: rest.parse()?,
                    });
                }
            }
            break;
        }
        Ok(Self {
            charge: 0,
            multiplicity: 1,
            geom: s.parse()?,
        })
    }
}

impl Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {}", self.charge, self.multiplicity)?;
        write!(f, "{}", self.geom)
    }
}
