//! Keyword options passed through to the external program.

use std::fmt::Display;

use serde::{Deserialize, Serialize, de::Visitor};

/// A single option value. Rendered into input files by [Display], so every
/// variant has to print in a form the external program parses back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    IntVec(Vec<usize>),
}

impl Display for OptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptValue::Bool(b) => write!(f, "{b}"),
            OptValue::Int(i) => write!(f, "{i}"),
            // keep whole floats visibly floating point
            OptValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{v:.1}")
            }
            OptValue::Float(v) => write!(f, "{v}"),
            OptValue::Str(s) => write!(f, "{s}"),
            OptValue::IntVec(v) => {
                write!(f, "[")?;
                for (i, n) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{n}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for OptValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for OptValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for OptValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for OptValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for OptValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<usize>> for OptValue {
    fn from(v: Vec<usize>) -> Self {
        Self::IntVec(v)
    }
}

/// An ordered set of program options. Keys are folded to lowercase on
/// insertion, so lookups and re-insertions are case-insensitive, matching how
/// the external program treats its keywords.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionSet {
    opts: Vec<(String, OptValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under the lowercased `key`, replacing any existing
    /// entry for the same key in place.
    pub fn insert(&mut self, key: &str, value: impl Into<OptValue>) {
        let key = key.to_lowercase();
        let value = value.into();
        for (k, v) in &mut self.opts {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.opts.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&OptValue> {
        let key = key.to_lowercase();
        self.opts.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// whether `key` is present and set to a literal `true`
    pub fn bool_is_set(&self, key: &str) -> bool {
        matches!(self.get(key), Some(OptValue::Bool(true)))
    }

    pub fn len(&self) -> usize {
        self.opts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    /// iterate over the options in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptValue)> {
        self.opts.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'de> Deserialize<'de> for OptionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct OptionSetVisitor;

        impl<'de> Visitor<'de> for OptionSetVisitor {
            type Value = OptionSet;

            fn expecting(
                &self,
                f: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                f.write_str("a table of option keywords and values")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: serde::de::MapAccess<'de>,
            {
                let mut ret = OptionSet::new();
                while let Some((key, value)) =
                    map.next_entry::<String, OptValue>()?
                {
                    ret.insert(&key, value);
                }
                Ok(ret)
            }
        }

        deserializer.deserialize_map(OptionSetVisitor)
    }
}
