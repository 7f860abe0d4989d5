//! Text to report: sanitize, correct, extract, normalize, classify,
//! aggregate. Each stage is a plain function over the previous stage's
//! output; `ReportPipeline` wires them together.

pub mod aggregate;
pub mod classify;
pub mod correction;
pub mod extract;
pub mod findings;
pub mod normalize;
pub mod orchestrator;
pub mod patient;
pub mod sanitize;

pub use aggregate::*;
pub use classify::*;
pub use correction::*;
pub use extract::*;
pub use findings::*;
pub use normalize::*;
pub use orchestrator::*;
pub use patient::*;
pub use sanitize::*;
