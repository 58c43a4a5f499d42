//! micracc library interface
//!
//! Exposes the accuracy pipeline for integration testing: the bounded
//! concurrency runner, the classification engine, the evaluation ledger,
//! and the collaborator service boundary.

pub mod accuracy;
pub mod batch;
pub mod ledger;
pub mod report;
pub mod runner;
pub mod services;

pub use accuracy::{bucket_for, AccuracyTally, Bucket};
pub use batch::{run_accuracy_batch, BatchOptions};
pub use ledger::EvaluationLedger;
pub use report::{Reporter, TracingReporter};
pub use runner::{run_bounded, Produced};
