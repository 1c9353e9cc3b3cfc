//! Verification data model: criteria, options, results and batch aggregates.

pub mod batch;
pub mod criteria;
pub mod options;
pub mod result;


pub use batch::BatchVerificationResult;
pub use criteria::{Category, VerificationCriteria};
pub use options::{BatchPosition, VerificationOptions};
pub use result::{
    CategoryResult, ConfidenceSource, ParseMethod, ResultMetadata, VerificationMetrics,
    VerificationResult,
};
