//! Typed row queries over a descriptor table.

use crate::coeff::CoeffType;
use crate::descriptor::{DescriptorTable, INDEX_FIELDS};
use crate::error::DescribedError;

/// Predicate on a single descriptor column.
///
/// An absent (`None`) field never matches [`Match::Eq`] or [`Match::AnyOf`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Match<T> {
    /// Matches every row.
    #[default]
    Any,
    /// Matches rows whose field equals the value.
    Eq(T),
    /// Matches rows whose field is one of the values.
    AnyOf(Vec<T>),
}

impl<T: PartialEq> Match<T> {
    /// Matches a single value.
    pub fn eq(value: T) -> Self {
        Self::Eq(value)
    }

    /// Matches any of the given values.
    pub fn any_of(values: impl IntoIterator<Item = T>) -> Self {
        Self::AnyOf(values.into_iter().collect())
    }

    /// Returns `true` for the unconstrained predicate.
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Tests a present value.
    pub fn test(&self, value: &T) -> bool {
        match self {
            Self::Any => true,
            Self::Eq(v) => v == value,
            Self::AnyOf(vs) => vs.contains(value),
        }
    }

    /// Tests an optional value; `None` only passes [`Match::Any`].
    pub fn test_opt(&self, value: Option<&T>) -> bool {
        match value {
            Some(v) => self.test(v),
            None => self.is_any(),
        }
    }
}

impl<T> From<T> for Match<T> {
    fn from(value: T) -> Self {
        Self::Eq(value)
    }
}

/// Conjunction of per-column predicates.
///
/// # Example
///
/// ```ignore
/// use scat_described::{CoeffType, Match, Query};
///
/// let query = Query::new()
///     .coeff_type(CoeffType::Variance)
///     .jl1(Match::any_of([0, 1, 2]));
/// let low_scales = tensor.query(&query);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    coeff_type: Match<CoeffType>,
    /// Integer columns in [`INDEX_FIELDS`] order.
    index: [Match<usize>; 12],
    is_low: Match<bool>,
}

macro_rules! index_setter {
    ($($name:ident => $slot:expr),* $(,)?) => {
        $(
            #[doc = concat!("Constrains the `", stringify!($name), "` column.")]
            pub fn $name(mut self, m: impl Into<Match<usize>>) -> Self {
                self.index[$slot] = m.into();
                self
            }
        )*
    };
}

impl Query {
    /// Creates a query matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains the coefficient type column.
    pub fn coeff_type(mut self, m: impl Into<Match<CoeffType>>) -> Self {
        self.coeff_type = m.into();
        self
    }

    /// Constrains the low-pass flag.
    pub fn is_low(mut self, m: impl Into<Match<bool>>) -> Self {
        self.is_low = m.into();
        self
    }

    index_setter! {
        nl => 0,
        nr => 1,
        q => 2,
        rl => 3,
        rr => 4,
        scl => 5,
        scr => 6,
        jl1 => 7,
        jr1 => 8,
        j2 => 9,
        al => 10,
        ar => 11,
    }

    /// Returns `true` when no column is constrained.
    pub fn is_identity(&self) -> bool {
        self.coeff_type.is_any() && self.is_low.is_any() && self.index.iter().all(Match::is_any)
    }

    /// Parses a textual filter `field=v1,v2` into a single-column query.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DescribedError::MalformedFilter`] | no `=`, or an empty side |
    /// | [`DescribedError::UnknownField`] | field is not a descriptor column |
    /// | [`DescribedError::InvalidValue`] | a value does not parse for the column |
    pub fn parse_filter(filter: &str) -> Result<Self, DescribedError> {
        Self::new().with_filter(filter)
    }

    /// Adds the constraint of a textual filter to this query.
    ///
    /// # Errors
    ///
    /// Same as [`Query::parse_filter`].
    pub fn with_filter(mut self, filter: &str) -> Result<Self, DescribedError> {
        let (field, values) = filter
            .split_once('=')
            .map(|(f, v)| (f.trim(), v.trim()))
            .filter(|(f, v)| !f.is_empty() && !v.is_empty())
            .ok_or_else(|| DescribedError::MalformedFilter(filter.to_string()))?;
        let raw: Vec<&str> = values.split(',').map(str::trim).collect();

        match field {
            "coeff_type" => {
                let types = raw
                    .iter()
                    .map(|v| v.parse::<CoeffType>())
                    .collect::<Result<Vec<_>, _>>()?;
                self.coeff_type = into_match(types);
            }
            "is_low" => {
                let flags = raw
                    .iter()
                    .map(|v| parse_value::<bool>(field, v))
                    .collect::<Result<Vec<_>, _>>()?;
                self.is_low = into_match(flags);
            }
            _ => {
                let slot = INDEX_FIELDS
                    .iter()
                    .position(|&f| f == field)
                    .ok_or_else(|| DescribedError::UnknownField(field.to_string()))?;
                let indices = raw
                    .iter()
                    .map(|v| parse_value::<usize>(field, v))
                    .collect::<Result<Vec<_>, _>>()?;
                self.index[slot] = into_match(indices);
            }
        }
        Ok(self)
    }

    /// Tests row `i` of `table`.
    pub fn matches(&self, table: &DescriptorTable, i: usize) -> bool {
        if !self.coeff_type.test(&table.coeff_types()[i]) || !self.is_low.test(&table.is_low()[i]) {
            return false;
        }
        INDEX_FIELDS.iter().zip(&self.index).all(|(field, m)| {
            m.is_any()
                || table
                    .index_column(field)
                    .is_some_and(|column| m.test_opt(column[i].as_ref()))
        })
    }

    /// Indices of all matching rows, in table order.
    pub fn select(&self, table: &DescriptorTable) -> Vec<usize> {
        (0..table.len()).filter(|&i| self.matches(table, i)).collect()
    }
}

fn into_match<T: PartialEq>(mut values: Vec<T>) -> Match<T> {
    if values.len() == 1 {
        values.pop().map_or(Match::Any, Match::Eq)
    } else {
        Match::AnyOf(values)
    }
}

fn parse_value<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, DescribedError> {
    value.parse().map_err(|_| DescribedError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}
