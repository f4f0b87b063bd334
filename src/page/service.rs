//! Render service - owns the worker thread and the frame cache

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flume::{Receiver, Sender};
use log::warn;

use super::cache::PageCache;
use super::decoder::{PageDecoder, PageDescriptor};
use super::pipeline::RenderPipeline;
use super::request::{RenderRequest, RenderResponse, RenderTicket};
use super::worker::{WorkerContext, render_worker};
use crate::fetch::{Fetcher, SourceLocation};

/// Default number of prepared frames kept around
pub const DEFAULT_CACHE_SIZE: usize = 8;

/// Service tuning
#[derive(Clone, Copy, Debug)]
pub struct ServiceConfig {
    pub cache_size: usize,
    pub fetch_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            fetch_timeout: crate::fetch::DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Fetch, decode and page preparation on a background thread
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    cache: Arc<Mutex<PageCache>>,
}

impl RenderService {
    /// Spawn the worker thread
    #[must_use]
    pub fn new(config: ServiceConfig, decoder: Arc<dyn PageDecoder>) -> Self {
        let cache = Arc::new(Mutex::new(PageCache::new(config.cache_size)));

        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let context = WorkerContext {
            fetcher: Fetcher::new(config.fetch_timeout),
            decoder,
            pipeline: RenderPipeline::default(),
            cache: cache.clone(),
        };
        std::thread::spawn(move || {
            render_worker(context, request_rx, response_tx);
        });

        Self {
            request_tx,
            response_rx,
            cache,
        }
    }

    /// Queue a container load
    pub fn request_load(&self, generation: u64, source: SourceLocation) {
        self.send(RenderRequest::Load { generation, source });
    }

    /// Queue a page preparation
    pub fn request_page(&self, ticket: RenderTicket, descriptor: PageDescriptor) {
        self.send(RenderRequest::Page { ticket, descriptor });
    }

    /// Drain completed responses without blocking
    pub fn poll_responses(&self) -> Vec<RenderResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Block up to `timeout` for the next response
    pub fn wait_response(&self, timeout: Duration) -> Option<RenderResponse> {
        self.response_rx.recv_timeout(timeout).ok()
    }

    /// Number of cached frames
    #[must_use]
    pub fn cached_frames(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Ask the worker to exit
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn send(&self, request: RenderRequest) {
        if self.request_tx.send(request).is_err() {
            warn!("Render worker is gone, request dropped");
        }
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::page::TiffDecoder;
    use crate::page::request::RequestId;
    use crate::test_utils::fixtures::tiff_file;

    const WAIT: Duration = Duration::from_secs(10);

    fn ticket(id: u64, generation: u64, page: usize) -> RenderTicket {
        RenderTicket {
            id: RequestId::new(id),
            generation,
            page,
            total: 2,
        }
    }

    #[test]
    fn load_then_render_round_trip() {
        let file = tiff_file(&[(8, 6), (4, 4)]);
        let service = RenderService::new(ServiceConfig::default(), Arc::new(TiffDecoder));

        service.request_load(1, SourceLocation::Path(file.path().to_path_buf()));
        let Some(RenderResponse::Loaded { generation, result }) = service.wait_response(WAIT)
        else {
            panic!("expected a load response");
        };
        assert_eq!(generation, 1);
        let pages = result.unwrap();
        assert_eq!(pages.len(), 2);

        service.request_page(ticket(1, 1, 1), pages[1].clone());
        let Some(RenderResponse::Page { ticket, result, .. }) = service.wait_response(WAIT) else {
            panic!("expected a page response");
        };
        assert_eq!(ticket.page, 1);
        let frame = result.unwrap();
        assert_eq!((frame.width, frame.height), (4, 4));
        assert_eq!(service.cached_frames(), 1);
    }

    #[test]
    fn missing_source_reports_load_error() {
        let service = RenderService::new(ServiceConfig::default(), Arc::new(TiffDecoder));
        service.request_load(
            3,
            SourceLocation::Path("/nonexistent/pageloupe/missing.tif".into()),
        );

        match service.wait_response(WAIT) {
            Some(RenderResponse::Loaded { generation: 3, result }) => assert!(result.is_err()),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
