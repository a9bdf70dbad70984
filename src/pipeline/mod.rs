pub mod import;
pub mod extraction;
pub mod structuring;
pub mod normalize;
pub mod vocabulary;
pub mod processor; // Per-applicant decode → extract → normalize
pub mod batch; // Worker pool, result cache, progress
