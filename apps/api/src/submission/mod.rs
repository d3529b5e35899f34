// Submission: derive the payload from a committed record and hand it onward.
// The transformer is pure; delivery goes through the pluggable sink.

pub mod sink;
pub mod transformer;

pub use sink::{LogSink, SubmissionReceipt, SubmissionSink};
pub use transformer::{build_payload, SubmissionError, SubmissionPayload};
