//! Email triage pipeline.
//!
//! Every analyzed email flows through:
//! 1. `preprocess::normalize()`: bookkeeping form of the text
//! 2. `EmailAnalyzer::analyze()`: single model attempt when a client exists
//! 3. `RuleClassifier::classify()`: deterministic category when the model is out
//! 4. `extract_highlights()` and `synthesize_reply()`: fill whatever is missing
//!
//! **No request fails for model reasons.** The rules path always answers.

pub mod highlights;
pub mod preprocess;
pub mod processor;
pub mod reply;
pub mod rules;
pub mod types;

pub use processor::{EmailAnalyzer, ModelAttempt, ModelVerdict};
pub use rules::RuleClassifier;
pub use types::{AnalysisResponse, Category, EmailInput, Tone};
