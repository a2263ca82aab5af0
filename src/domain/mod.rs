use chrono::{DateTime, Utc};

pub mod error;
pub mod operation;
pub mod schema;

pub use error::{AssembleError, GenerationError, SpecError};
pub use operation::{ApiOperation, ApiParameter, ParameterLocation, RequestBody};
pub use schema::{AdditionalProperties, ExclusiveBound, SchemaKind, SchemaNode};

/// Lookup of `$ref` targets by reference string.
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Option<&SchemaNode>;
}

/// Source of the current instant for `date` / `date-time` formats.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for reproducible output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
