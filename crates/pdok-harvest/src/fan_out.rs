//! Bounded scatter-gather over independent network tasks.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Runs `task` over every item with at most `workers` invocations in flight
/// and returns the results in input order, whatever order they complete in.
///
/// There is no retry, timeout or error barrier here: each task is expected to
/// turn its own failures into a value (see
/// [`crate::CapabilitiesFetcher::fetch`]). A `workers` value of 0 is treated
/// as 1.
pub async fn fan_out<I, T, R, F, Fut>(items: I, workers: usize, mut task: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    let items: Vec<T> = items.into_iter().collect();
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();

    let indexed: Vec<(usize, R)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let fut = task(item);
            async move { (index, fut.await) }
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    for (index, result) in indexed {
        slots[index] = Some(result);
    }

    slots.into_iter().flatten().collect()
}
