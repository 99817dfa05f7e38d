pub mod block;
pub mod cell;
pub mod diagnostic;
pub mod metadata;
pub mod observation;

pub use block::{Block, BlockRole, BlockView, ClassifiedBlock};
pub use cell::{Cell, CellGrid};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use metadata::MetadataRecord;
pub use observation::{Flag, ObservationRecord, TimeSeries, Variable};
