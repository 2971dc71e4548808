pub mod choices;
pub mod query_envelope;
pub mod records;

pub use choices::{Choice, ChoiceDomain, choice_label};
pub use query_envelope::{
    FailureKind, QUERY_ENVELOPE_SCHEMA_VERSION, QueryEnvelope, QueryEnvelopeCommandFailure,
    QueryEnvelopeError, QueryEnvelopeMeta, QueryEnvelopeWarning,
};
pub use records::{FIELD_TABLE_VERSION, FieldKind, FieldSpec, RecordType};
