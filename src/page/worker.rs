//! Render worker - runs in a separate thread
//!
//! Requests are handled one at a time. Before each batch the worker drains
//! the queue so that only the newest page request is prepared; older ones
//! are answered with [`RenderResponse::Cancelled`].

use std::sync::{Arc, Mutex};
use std::time::Instant;

use flume::{Receiver, Sender};
use log::{debug, error};

use super::cache::{CacheKey, PageCache};
use super::decoder::{PageDecoder, PageDescriptor};
use super::load_pages;
use super::pipeline::RenderPipeline;
use super::request::{RenderRequest, RenderResponse, RenderTicket};
use crate::fetch::{Fetcher, SourceLocation};

/// Everything the worker needs besides its channels
pub struct WorkerContext {
    pub fetcher: Fetcher,
    pub decoder: Arc<dyn PageDecoder>,
    pub pipeline: RenderPipeline,
    pub cache: Arc<Mutex<PageCache>>,
}

pub fn render_worker(
    context: WorkerContext,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    while let Ok(first) = requests.recv() {
        let mut batch = vec![first];
        batch.extend(requests.try_iter());

        let newest_page = batch
            .iter()
            .rposition(|r| matches!(r, RenderRequest::Page { .. }));

        for (i, request) in batch.into_iter().enumerate() {
            let response = match request {
                RenderRequest::Shutdown => {
                    debug!("Render worker shutting down");
                    return;
                }

                RenderRequest::Load { generation, source } => {
                    handle_load(&context, generation, &source)
                }

                RenderRequest::Page { ticket, .. } if Some(i) != newest_page => {
                    debug!("Skipping superseded render of page {}", ticket.page);
                    RenderResponse::Cancelled(ticket)
                }

                RenderRequest::Page { ticket, descriptor } => {
                    handle_page(&context, ticket, &descriptor)
                }
            };

            if responses.send(response).is_err() {
                debug!("Response channel closed, render worker exiting");
                return;
            }
        }
    }
}

fn handle_load(context: &WorkerContext, generation: u64, source: &SourceLocation) -> RenderResponse {
    let started = Instant::now();
    let result = load_pages(&context.fetcher, context.decoder.as_ref(), source);
    match &result {
        Ok(pages) => {
            context
                .cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .retain_generation(generation);
            debug!(
                "Loaded {} page(s) from {source} in {}ms",
                pages.len(),
                started.elapsed().as_millis()
            );
        }
        Err(e) => error!("Loading {source} failed: {e}"),
    }
    RenderResponse::Loaded { generation, result }
}

fn handle_page(
    context: &WorkerContext,
    ticket: RenderTicket,
    descriptor: &PageDescriptor,
) -> RenderResponse {
    let key = CacheKey::new(ticket.generation, ticket.page);
    let started = Instant::now();

    let cached = context
        .cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key);
    if let Some(frame) = cached {
        debug!("Page {} served from cache", ticket.page);
        return RenderResponse::Page {
            ticket,
            result: Ok(frame),
            elapsed: started.elapsed(),
        };
    }

    let result = context.pipeline.prepare(descriptor).map(|frame| {
        context
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key, frame)
    });
    let elapsed = started.elapsed();
    debug!("Prepared page {} in {}ms", ticket.page, elapsed.as_millis());

    RenderResponse::Page {
        ticket,
        result,
        elapsed,
    }
}
