use crate::context::Context;
use crate::engine::{Batch, Engine};
use crate::error::{ErrorKind, Result};
use crate::report::{OutputItem, Report, Summary};
use algoscope_catalog::UsageFact;
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt, TryStreamExt};
use std::pin::pin;
use tokio::time::Instant;
use tracing::instrument;

/// Progress events emitted by [`Engine::lookup_stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, with the batch size.
/// 2. [`Resolved`](Self::Resolved): once per identifier, in completion order,
///    tagged with the identifier's position in the batch.
/// 3. [`Complete`](Self::Complete): exactly once.
///
/// An error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum LookupEvent<F> {
    Started(usize),
    Resolved(usize, Box<OutputItem<F>>),
    Complete,
}

impl<F: UsageFact> Engine<F> {
    /// Streams [`LookupEvent`]s while the batch is resolved.
    ///
    /// Identifiers are resolved concurrently, at most
    /// [`Options::concurrency`](crate::Options::concurrency) at a time; more
    /// are started as in-flight ones complete. A storage failure, a
    /// cancelled `ctx` or a passed deadline ends the stream with an error and
    /// drops all remaining work.
    pub fn lookup_stream<'a>(
        &'a self,
        batch: &'a Batch,
        ctx: &'a Context,
    ) -> impl Stream<Item = Result<LookupEvent<F>>> + 'a {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            if batch.is_empty() {
                yield Err(exn::Exn::from(ErrorKind::EmptyBatch));
                return;
            }
            yield Ok(LookupEvent::Started(batch.len()));

            let mut pending = batch
                .requests
                .iter()
                .enumerate()
                .map(|(index, request)| self.resolve_indexed(index, request, batch.cardinality));
            let mut processing = FuturesUnordered::new();
            processing.extend(pending.by_ref().take(self.options.concurrency));
            loop {
                let next = tokio::select! {
                    biased;
                    reason = ctx.interrupted() => Err(reason),
                    next = processing.next() => Ok(next),
                };
                match next {
                    Ok(Some(Ok((index, item)))) => {
                        yield Ok(LookupEvent::Resolved(index, Box::new(item)));
                        if let Some(future) = pending.next() {
                            processing.push(future);
                        }
                    },
                    Ok(Some(Err(err))) => {
                        let reason = (*err).clone();
                        self.recorder.aborted(&reason);
                        tracing::warn!(%reason, in_flight = processing.len(), "Lookup batch aborted");
                        yield Err(err);
                        return;
                    },
                    Ok(None) => break,
                    Err(reason) => {
                        self.recorder.aborted(&reason);
                        tracing::warn!(%reason, in_flight = processing.len(), "Lookup batch interrupted");
                        yield Err(exn::Exn::from(reason));
                        return;
                    },
                }
            }

            yield Ok(LookupEvent::Complete);
        })
    }

    /// Resolve a whole batch and summarise it.
    ///
    /// Items come back in input order, one per identifier, whatever their
    /// classification. Fails with [`ErrorKind::EmptyBatch`] for an empty
    /// batch, a storage error kind when any catalog or usage read fails, or a
    /// cancellation kind; no partial report is returned in those cases.
    #[instrument(skip_all, fields(identifiers = batch.len(), cardinality = ?batch.cardinality))]
    pub async fn lookup(&self, batch: &Batch, ctx: &Context) -> Result<Report<F>> {
        let started = Instant::now();
        let mut slots: Vec<Option<OutputItem<F>>> = std::iter::repeat_with(|| None).take(batch.len()).collect();
        let mut events = pin!(self.lookup_stream(batch, ctx));
        while let Some(event) = events.try_next().await? {
            if let LookupEvent::Resolved(index, item) = event
                && let Some(slot) = slots.get_mut(index)
            {
                *slot = Some(*item);
            }
        }
        let items: Vec<OutputItem<F>> = slots.into_iter().flatten().collect();
        for item in &items {
            self.recorder.outcome(item.ecosystem.as_deref(), item.outcome);
        }
        let summary = Summary::from_items(&items);
        self.recorder.batch(&summary, started.elapsed());
        tracing::info!(
            total = summary.total(),
            found = summary.found(),
            not_found = summary.not_found().len(),
            without_info = summary.without_info().len(),
            failed_to_parse = summary.failed_to_parse().len(),
            "Lookup batch complete"
        );
        Ok(Report { items, summary })
    }
}
