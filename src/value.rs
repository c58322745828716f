use std::collections::BTreeMap;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::connection::Connection;
use crate::error::{EngineError, EngineResult};

/// A 2-D integer matrix, the `grid` tag's native representation.
pub type Grid = Array2<i64>;
pub type IntPair = (i64, i64);
pub type Region = Vec<IntPair>;
pub type PointPair = (IntPair, IntPair);

/// Stable identifier for every runtime-distinguishable shape of `Value`.
///
/// Tag equality is the primitive typing relation; the closed set mirrors the
/// shapes the default primitive library produces. Implementations may widen
/// the enum, but the engine otherwise treats tags opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    Char,
    Int,
    Long,
    Float,
    Double,
    Str,
    Grid,
    GridVec,
    GridPairVec,
    IntPair,
    IntPairVec,
    Region,
    RegionVec,
    RegionVecVec,
    PairOfPointsVec,
    PairOfPointsVecVec,
    PairedRegionVec,
    IntIntMap,
    /// The placeholder tag itself — a `Value::Placeholder` carries one of
    /// these as its datum.
    TypeTag,
}

impl TypeTag {
    /// The wire name used in the JSON schema of spec.md §6.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Char => "char",
            TypeTag::Int => "int",
            TypeTag::Long => "long",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Str => "string",
            TypeTag::Grid => "grid",
            TypeTag::GridVec => "gridVector",
            TypeTag::GridPairVec => "gridPairVector",
            TypeTag::IntPair => "intPair",
            TypeTag::IntPairVec => "intPairVector",
            TypeTag::Region => "region",
            TypeTag::RegionVec => "regionVector",
            TypeTag::RegionVecVec => "regionVectorVector",
            TypeTag::PairOfPointsVec => "pairOfPointsVector",
            TypeTag::PairOfPointsVecVec => "pairOfPointsVectorVector",
            TypeTag::PairedRegionVec => "pairedRegionVector",
            TypeTag::IntIntMap => "intToIntMap",
            TypeTag::TypeTag => "typeTag",
        }
    }

    pub fn from_name(name: &str) -> EngineResult<TypeTag> {
        Ok(match name {
            "bool" => TypeTag::Bool,
            "char" => TypeTag::Char,
            "int" => TypeTag::Int,
            "long" => TypeTag::Long,
            "float" => TypeTag::Float,
            "double" => TypeTag::Double,
            "string" => TypeTag::Str,
            "grid" => TypeTag::Grid,
            "gridVector" => TypeTag::GridVec,
            "gridPairVector" => TypeTag::GridPairVec,
            "intPair" => TypeTag::IntPair,
            "intPairVector" => TypeTag::IntPairVec,
            "region" => TypeTag::Region,
            "regionVector" => TypeTag::RegionVec,
            "regionVectorVector" => TypeTag::RegionVecVec,
            "pairOfPointsVector" => TypeTag::PairOfPointsVec,
            "pairOfPointsVectorVector" => TypeTag::PairOfPointsVecVec,
            "pairedRegionVector" => TypeTag::PairedRegionVec,
            "intToIntMap" => TypeTag::IntIntMap,
            "typeTag" => TypeTag::TypeTag,
            other => return Err(EngineError::UnknownTypeTag(other.to_string())),
        })
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged union admitting scalars/containers, type placeholders, and
/// nested expression trees (§3).
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Grid(Grid),
    GridVec(Vec<Grid>),
    GridPairVec(Vec<(Grid, Grid)>),
    IntPair(IntPair),
    IntPairVec(Vec<IntPair>),
    Region(Region),
    RegionVec(Vec<Region>),
    RegionVecVec(Vec<Vec<Region>>),
    PairOfPointsVec(Vec<PointPair>),
    PairOfPointsVecVec(Vec<Vec<PointPair>>),
    PairedRegionVec(Vec<(Region, Region)>),
    IntIntMap(BTreeMap<i64, i64>),
    /// A hole that must be filled by a `Value` of the carried tag.
    Placeholder(TypeTag),
    /// A `Value` produced by evaluating a subexpression.
    Conn(Box<Connection>),
}

impl Value {
    /// The runtime tag of this value. For a `Conn`, this is the neuron's
    /// declared output tag — the Connection "plays the role" of that tag.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Char(_) => TypeTag::Char,
            Value::Int(_) => TypeTag::Int,
            Value::Long(_) => TypeTag::Long,
            Value::Float(_) => TypeTag::Float,
            Value::Double(_) => TypeTag::Double,
            Value::Str(_) => TypeTag::Str,
            Value::Grid(_) => TypeTag::Grid,
            Value::GridVec(_) => TypeTag::GridVec,
            Value::GridPairVec(_) => TypeTag::GridPairVec,
            Value::IntPair(_) => TypeTag::IntPair,
            Value::IntPairVec(_) => TypeTag::IntPairVec,
            Value::Region(_) => TypeTag::Region,
            Value::RegionVec(_) => TypeTag::RegionVec,
            Value::RegionVecVec(_) => TypeTag::RegionVecVec,
            Value::PairOfPointsVec(_) => TypeTag::PairOfPointsVec,
            Value::PairOfPointsVecVec(_) => TypeTag::PairOfPointsVecVec,
            Value::PairedRegionVec(_) => TypeTag::PairedRegionVec,
            Value::IntIntMap(_) => TypeTag::IntIntMap,
            Value::Placeholder(t) => *t,
            Value::Conn(c) => c.neuron().output,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Value::Placeholder(_))
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Value::Conn(c) => Some(c),
            _ => None,
        }
    }

    /// True if this value (or, recursively, any hole inside a nested
    /// Connection) is convertible to a string for display purposes — used
    /// by the heuristic's string-convertible penalty (§4.1).
    pub fn is_string_convertible(&self) -> bool {
        !matches!(
            self,
            Value::Placeholder(_)
                | Value::Grid(_)
                | Value::GridVec(_)
                | Value::GridPairVec(_)
                | Value::RegionVec(_)
                | Value::RegionVecVec(_)
                | Value::PairOfPointsVec(_)
                | Value::PairOfPointsVecVec(_)
                | Value::PairedRegionVec(_)
                | Value::IntIntMap(_)
        )
    }

    /// Lexical rendering used by `Connection::string()`/`expression()` and
    /// the JSON leaf form (spec.md §6): scalars as decimal text, chars as a
    /// one-character string, strings verbatim, placeholders as the tag name.
    pub fn lexical(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Long(l) => l.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Str(s) => s.clone(),
            Value::Placeholder(t) => t.name().to_string(),
            Value::Conn(c) => c.string(),
            Value::IntPair((a, b)) => format!("({a}, {b})"),
            other => format!("<{}>", other.tag()),
        }
    }

    /// Parse a leaf literal of the given tag from its lexical form (the
    /// inverse of `lexical()`, used by `Connection::from_json`).
    pub fn parse_leaf(tag: TypeTag, literal: &str) -> EngineResult<Value> {
        let malformed = || EngineError::MalformedValue {
            literal: literal.to_string(),
            tag,
        };
        Ok(match tag {
            TypeTag::Bool => Value::Bool(literal.parse().map_err(|_| malformed())?),
            TypeTag::Char => Value::Char(literal.chars().next().ok_or_else(malformed)?),
            TypeTag::Int => Value::Int(literal.parse().map_err(|_| malformed())?),
            TypeTag::Long => Value::Long(literal.parse().map_err(|_| malformed())?),
            TypeTag::Float => Value::Float(literal.parse().map_err(|_| malformed())?),
            TypeTag::Double => Value::Double(literal.parse().map_err(|_| malformed())?),
            TypeTag::Str => Value::Str(literal.to_string()),
            TypeTag::TypeTag => Value::Placeholder(TypeTag::from_name(literal)?),
            _ => return Err(malformed()),
        })
    }
}

impl PartialEq for Value {
    /// Structural equality per §3: scalars/strings by value, placeholders by
    /// tag, nested Connections by recursive equality. Values of differing
    /// shape (including numeric-vs-string) are never equal.
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Str(a), Str(b)) => a == b,
            (Grid(a), Grid(b)) => a == b,
            (GridVec(a), GridVec(b)) => a == b,
            (GridPairVec(a), GridPairVec(b)) => a == b,
            (IntPair(a), IntPair(b)) => a == b,
            (IntPairVec(a), IntPairVec(b)) => a == b,
            (Region(a), Region(b)) => a == b,
            (RegionVec(a), RegionVec(b)) => a == b,
            (RegionVecVec(a), RegionVecVec(b)) => a == b,
            (PairOfPointsVec(a), PairOfPointsVec(b)) => a == b,
            (PairOfPointsVecVec(a), PairOfPointsVecVec(b)) => a == b,
            (PairedRegionVec(a), PairedRegionVec(b)) => a == b,
            (IntIntMap(a), IntIntMap(b)) => a == b,
            (Placeholder(a), Placeholder(b)) => a == b,
            (Conn(a), Conn(b)) => a == b,
            _ => false,
        }
    }
}

/// Combines into a Connection's cached structural hash (§3): a per-child
/// contribution drawn from the child's Value kind, added to the neuron's
/// own hash. Deliberately not `std::hash::Hash` — floats aren't `Hash` and
/// the combination rule (sum, not a generic `Hasher`) matches the original.
pub fn value_hash(v: &Value) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut h = DefaultHasher::new();
    match v {
        Value::Bool(b) => b.hash(&mut h),
        Value::Char(c) => c.hash(&mut h),
        Value::Int(i) => i.hash(&mut h),
        Value::Long(l) => l.hash(&mut h),
        Value::Float(f) => f.to_bits().hash(&mut h),
        Value::Double(d) => d.to_bits().hash(&mut h),
        Value::Str(s) => s.hash(&mut h),
        Value::Placeholder(t) => t.hash(&mut h),
        Value::Conn(c) => return c.hash(),
        Value::Grid(g) => {
            for x in g.iter() {
                x.hash(&mut h);
            }
            g.shape().hash(&mut h);
        }
        Value::IntPair((a, b)) => {
            a.hash(&mut h);
            b.hash(&mut h);
        }
        other => other.lexical().hash(&mut h),
    }
    h.finish()
}
