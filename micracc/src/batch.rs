//! Batch orchestration
//!
//! Glue between the runner and the classification engine: the job
//! producer walks the configured id range, and each job fetches image
//! bytes, asks the recognition collaborator for an outcome, and hands
//! the result to the tally. The runner knows nothing about
//! classification; the tally knows nothing about concurrency.

use crate::accuracy::AccuracyTally;
use crate::runner::{run_bounded, Produced};
use crate::services::{GroundTruthSource, ImageSource, Recognizer};
use micracc_common::{CheckId, Result};
use std::cell::RefCell;
use tracing::info;

/// Id range and scheduling bound for one run
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub first_check: CheckId,
    pub last_check: CheckId,
    pub max_concurrency: usize,
}

/// Drive recognition and classification across the whole id range.
///
/// The tally sits in a `RefCell` because the in-flight jobs all share
/// it: execution is single-threaded cooperative, every borrow is
/// confined to the synchronous `classify` call, so no borrow is ever
/// held across an await.
///
/// Fails on the first job that fails; the caller owns the decision to
/// report partial statistics from its cleanup path.
pub async fn run_accuracy_batch<R, G, I>(
    recognizer: &R,
    ground_truth: &G,
    images: &I,
    tally: &RefCell<AccuracyTally>,
    options: BatchOptions,
) -> Result<()>
where
    R: Recognizer,
    G: GroundTruthSource,
    I: ImageSource,
{
    info!(
        first_check = options.first_check,
        last_check = options.last_check,
        max_concurrency = options.max_concurrency,
        "Starting accuracy batch"
    );

    let mut next_id = options.first_check;
    run_bounded(
        move || {
            let id = next_id;
            next_id = next_id.saturating_add(1);
            async move {
                if id > options.last_check {
                    return Ok::<_, micracc_common::Error>(Produced::Done);
                }
                let image = images.load(id)?;
                let outcome = recognizer.recognize(id, &image).await?;
                let record = ground_truth.ground_truth(id)?;
                let matched = tally.borrow_mut().classify(id, &record, &outcome)?;
                Ok(Produced::Value(matched))
            }
        },
        options.max_concurrency,
    )
    .await?;

    info!(
        compared = tally.borrow().total_compared(),
        "Accuracy batch complete"
    );
    Ok(())
}
