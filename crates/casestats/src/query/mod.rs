//! Ad-hoc aggregate queries: `{record_type, filters, group_by, aggregation}`
//! validated against the metadata registry and compiled to parameterized SQL.

pub mod error;
pub mod execute;
pub mod lookup;
pub mod request;
pub mod validate;

pub use error::{QueryError, QueryValidationError};
pub use execute::{
    AggregateRow, AggregateStatement, AggregateStore, GroupResult, GroupValue, MetricValue,
    QueryExecutor, QueryResult, UNKNOWN_LABEL, compile, group_label,
};
pub use lookup::{Comparison, DatePart, Lookup};
pub use request::{AggregateRequest, json_schema};
pub use validate::{
    Aggregation, FilterValue, OperandKind, QueryValidator, ValidatedFilter, ValidatedQuery,
};
