//! Batch tools built on the harness.
//!
//! - [`normalize::LoudnessNormalizer`]: loudness normalization of every
//!   audio track in Matroska files, video and subtitles copied as-is.
//! - [`convert::VideoConverter`]: HEVC re-encode with quality presets.

pub mod convert;
pub mod discovery;
pub mod normalize;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::harness::BatchContext;

/// Runs `work(position, item)` for every item, at most `ctx.workers` at a time.
///
/// Positions are 1-based. Items still waiting for a slot when the batch is
/// cancelled never start.
pub(crate) async fn for_each_bounded<T, F, Fut>(ctx: &BatchContext, items: Vec<T>, work: F)
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = ()>,
{
    let semaphore = Arc::new(Semaphore::new(ctx.workers.max(1)));
    let work = &work;

    let tasks = items.into_iter().enumerate().map(move |(i, item)| {
        let semaphore = semaphore.clone();
        let cancel = ctx.cancel.clone();
        async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                permit = semaphore.acquire() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };
            work(i + 1, item).await;
        }
    });

    futures::future::join_all(tasks).await;
}
