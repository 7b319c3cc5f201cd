//! Coefficient descriptors and the column-wise descriptor table.

use serde::{Deserialize, Serialize};

use crate::coeff::CoeffType;
use crate::error::DescribedError;

/// Labels of one coefficient (one row of a described tensor).
///
/// Fields that do not apply to a coefficient type are `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoeffDescriptor {
    pub coeff_type: CoeffType,
    /// Left channel index.
    pub nl: Option<usize>,
    /// Right channel index.
    pub nr: Option<usize>,
    /// Moment order.
    pub q: Option<usize>,
    /// Scattering order of the left factor.
    pub rl: Option<usize>,
    /// Scattering order of the right factor.
    pub rr: Option<usize>,
    /// Scale-path id of the left factor.
    pub scl: Option<usize>,
    /// Scale-path id of the right factor.
    pub scr: Option<usize>,
    /// First scale of the left factor.
    pub jl1: Option<usize>,
    /// First scale of the right factor.
    pub jr1: Option<usize>,
    /// Shared second scale.
    pub j2: Option<usize>,
    /// Orientation of the left factor.
    pub al: Option<usize>,
    /// Orientation of the right factor.
    pub ar: Option<usize>,
    /// Whether the coefficient comes from the low-pass path.
    pub is_low: bool,
}

impl CoeffDescriptor {
    /// Descriptor with only the type set and every optional field absent.
    pub fn empty(coeff_type: CoeffType) -> Self {
        Self {
            coeff_type,
            nl: None,
            nr: None,
            q: None,
            rl: None,
            rr: None,
            scl: None,
            scr: None,
            jl1: None,
            jr1: None,
            j2: None,
            al: None,
            ar: None,
            is_low: false,
        }
    }
}

/// Descriptor table stored one typed vector per column.
///
/// All columns always have the same length; deserialization rejects tables
/// whose columns disagree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptorTable")]
pub struct DescriptorTable {
    coeff_type: Vec<CoeffType>,
    nl: Vec<Option<usize>>,
    nr: Vec<Option<usize>>,
    q: Vec<Option<usize>>,
    rl: Vec<Option<usize>>,
    rr: Vec<Option<usize>>,
    scl: Vec<Option<usize>>,
    scr: Vec<Option<usize>>,
    jl1: Vec<Option<usize>>,
    jr1: Vec<Option<usize>>,
    j2: Vec<Option<usize>>,
    al: Vec<Option<usize>>,
    ar: Vec<Option<usize>>,
    is_low: Vec<bool>,
}

/// Column layout as read from disk, before the lengths are checked.
#[derive(Deserialize)]
struct RawDescriptorTable {
    coeff_type: Vec<CoeffType>,
    nl: Vec<Option<usize>>,
    nr: Vec<Option<usize>>,
    q: Vec<Option<usize>>,
    rl: Vec<Option<usize>>,
    rr: Vec<Option<usize>>,
    scl: Vec<Option<usize>>,
    scr: Vec<Option<usize>>,
    jl1: Vec<Option<usize>>,
    jr1: Vec<Option<usize>>,
    j2: Vec<Option<usize>>,
    al: Vec<Option<usize>>,
    ar: Vec<Option<usize>>,
    is_low: Vec<bool>,
}

impl TryFrom<RawDescriptorTable> for DescriptorTable {
    type Error = DescribedError;

    fn try_from(raw: RawDescriptorTable) -> Result<Self, Self::Error> {
        let rows = raw.coeff_type.len();
        let lengths = [
            ("nl", raw.nl.len()),
            ("nr", raw.nr.len()),
            ("q", raw.q.len()),
            ("rl", raw.rl.len()),
            ("rr", raw.rr.len()),
            ("scl", raw.scl.len()),
            ("scr", raw.scr.len()),
            ("jl1", raw.jl1.len()),
            ("jr1", raw.jr1.len()),
            ("j2", raw.j2.len()),
            ("al", raw.al.len()),
            ("ar", raw.ar.len()),
            ("is_low", raw.is_low.len()),
        ];
        if let Some(&(column, found)) = lengths.iter().find(|(_, len)| *len != rows) {
            return Err(DescribedError::ColumnLengthMismatch { column, rows, found });
        }
        Ok(Self {
            coeff_type: raw.coeff_type,
            nl: raw.nl,
            nr: raw.nr,
            q: raw.q,
            rl: raw.rl,
            rr: raw.rr,
            scl: raw.scl,
            scr: raw.scr,
            jl1: raw.jl1,
            jr1: raw.jr1,
            j2: raw.j2,
            al: raw.al,
            ar: raw.ar,
            is_low: raw.is_low,
        })
    }
}

/// Names of the integer-valued columns, in table order.
pub const INDEX_FIELDS: [&str; 12] = [
    "nl", "nr", "q", "rl", "rr", "scl", "scr", "jl1", "jr1", "j2", "al", "ar",
];

impl DescriptorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` rows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            coeff_type: Vec::with_capacity(capacity),
            nl: Vec::with_capacity(capacity),
            nr: Vec::with_capacity(capacity),
            q: Vec::with_capacity(capacity),
            rl: Vec::with_capacity(capacity),
            rr: Vec::with_capacity(capacity),
            scl: Vec::with_capacity(capacity),
            scr: Vec::with_capacity(capacity),
            jl1: Vec::with_capacity(capacity),
            jr1: Vec::with_capacity(capacity),
            j2: Vec::with_capacity(capacity),
            al: Vec::with_capacity(capacity),
            ar: Vec::with_capacity(capacity),
            is_low: Vec::with_capacity(capacity),
        }
    }

    /// Appends one row.
    pub fn push(&mut self, row: CoeffDescriptor) {
        self.coeff_type.push(row.coeff_type);
        self.nl.push(row.nl);
        self.nr.push(row.nr);
        self.q.push(row.q);
        self.rl.push(row.rl);
        self.rr.push(row.rr);
        self.scl.push(row.scl);
        self.scr.push(row.scr);
        self.jl1.push(row.jl1);
        self.jr1.push(row.jr1);
        self.j2.push(row.j2);
        self.al.push(row.al);
        self.ar.push(row.ar);
        self.is_low.push(row.is_low);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.coeff_type.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.coeff_type.is_empty()
    }

    /// Reassembles row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn row(&self, i: usize) -> CoeffDescriptor {
        CoeffDescriptor {
            coeff_type: self.coeff_type[i],
            nl: self.nl[i],
            nr: self.nr[i],
            q: self.q[i],
            rl: self.rl[i],
            rr: self.rr[i],
            scl: self.scl[i],
            scr: self.scr[i],
            jl1: self.jl1[i],
            jr1: self.jr1[i],
            j2: self.j2[i],
            al: self.al[i],
            ar: self.ar[i],
            is_low: self.is_low[i],
        }
    }

    /// Iterates over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = CoeffDescriptor> + '_ {
        (0..self.len()).map(|i| self.row(i))
    }

    /// The coefficient type column.
    pub fn coeff_types(&self) -> &[CoeffType] {
        &self.coeff_type
    }

    /// The low-pass flag column.
    pub fn is_low(&self) -> &[bool] {
        &self.is_low
    }

    /// Integer column by name, or `None` for an unknown name.
    pub fn index_column(&self, field: &str) -> Option<&[Option<usize>]> {
        let column = match field {
            "nl" => &self.nl,
            "nr" => &self.nr,
            "q" => &self.q,
            "rl" => &self.rl,
            "rr" => &self.rr,
            "scl" => &self.scl,
            "scr" => &self.scr,
            "jl1" => &self.jl1,
            "jr1" => &self.jr1,
            "j2" => &self.j2,
            "al" => &self.al,
            "ar" => &self.ar,
            _ => return None,
        };
        Some(column.as_slice())
    }

    /// New table holding the given rows, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut table = Self::with_capacity(indices.len());
        for &i in indices {
            table.push(self.row(i));
        }
        table
    }
}

impl FromIterator<CoeffDescriptor> for DescriptorTable {
    fn from_iter<I: IntoIterator<Item = CoeffDescriptor>>(iter: I) -> Self {
        let mut table = Self::new();
        for row in iter {
            table.push(row);
        }
        table
    }
}
