//! Filter-path lookups: `<field>[__<date part>][__<comparison>]`.

pub const LOOKUP_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Exact,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    IContains,
    StartsWith,
    EndsWith,
}

impl Comparison {
    pub const ALL: [Self; 9] = [
        Self::Exact,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::IContains,
        Self::StartsWith,
        Self::EndsWith,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
        }
    }

    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|comparison| comparison.as_str() == segment)
    }

    #[must_use]
    pub const fn is_range(self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }

    #[must_use]
    pub const fn is_text_match(self) -> bool {
        matches!(self, Self::IContains | Self::StartsWith | Self::EndsWith)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
    /// Calendar date of a date-time value.
    Date,
}

impl DatePart {
    pub const ALL: [Self; 4] = [Self::Year, Self::Month, Self::Day, Self::Date];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Date => "date",
        }
    }

    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|part| part.as_str() == segment)
    }

    /// SQL expression extracting this part from a quoted column.
    #[must_use]
    pub fn sql_expression(self, column: &str) -> String {
        match self {
            Self::Year => format!("CAST(strftime('%Y', {column}) AS INTEGER)"),
            Self::Month => format!("CAST(strftime('%m', {column}) AS INTEGER)"),
            Self::Day => format!("CAST(strftime('%d', {column}) AS INTEGER)"),
            Self::Date => format!("date({column})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    pub transform: Option<DatePart>,
    pub comparison: Comparison,
}

/// A filter key broken into its field name and lookup chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPath<'a> {
    pub field: &'a str,
    pub segments: Vec<&'a str>,
}

#[must_use]
pub fn split_filter_path(key: &str) -> FilterPath<'_> {
    let mut parts = key.split(LOOKUP_SEPARATOR);
    let field = parts.next().unwrap_or_default();
    FilterPath {
        field,
        segments: parts.collect(),
    }
}

/// Resolves trailing segments into a lookup. On failure returns the first
/// segment that is unknown or out of place.
pub fn parse_lookup<'a>(segments: &[&'a str]) -> Result<Lookup, &'a str> {
    match segments {
        [] => Ok(Lookup {
            transform: None,
            comparison: Comparison::Exact,
        }),
        [only] => {
            if let Some(comparison) = Comparison::from_segment(only) {
                Ok(Lookup {
                    transform: None,
                    comparison,
                })
            } else if let Some(part) = DatePart::from_segment(only) {
                Ok(Lookup {
                    transform: Some(part),
                    comparison: Comparison::Exact,
                })
            } else {
                Err(*only)
            }
        }
        [first, second] => {
            let part = DatePart::from_segment(first).ok_or(*first)?;
            let comparison = Comparison::from_segment(second).ok_or(*second)?;
            Ok(Lookup {
                transform: Some(part),
                comparison,
            })
        }
        [_, _, extra, ..] => Err(*extra),
    }
}
