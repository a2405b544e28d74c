pub mod aggregator;
pub mod error;
pub mod listener;
pub mod registry;
pub mod router;
pub mod sink;

pub use aggregator::{fold_notification, FoldOutcome, StepIdGen, DESCRIPTION_LIMIT};
pub use error::RouterError;
pub use listener::SessionListener;
pub use registry::{SessionRecord, SessionRegistry};
pub use router::{ProcessOptions, TranscriptOutcome, TranscriptRouter};
pub use sink::{ProgressCallback, ProgressSink};
