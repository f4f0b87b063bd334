//! Worker request and response types

use std::sync::Arc;
use std::time::Duration;

use super::decoder::PageDescriptor;
use super::error::{LoadError, RenderError};
use super::pipeline::PreparedFrame;
use crate::fetch::SourceLocation;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Identifies one render invocation and the navigation state it was issued for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTicket {
    pub id: RequestId,
    /// Load generation the page belongs to
    pub generation: u64,
    /// Target page (0-indexed)
    pub page: usize,
    /// Page count at issue time
    pub total: usize,
}

/// Request sent to the render worker
pub enum RenderRequest {
    /// Fetch and split a container
    Load {
        generation: u64,
        source: SourceLocation,
    },

    /// Prepare a page for display
    Page {
        ticket: RenderTicket,
        descriptor: PageDescriptor,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    /// Container loaded (or failed to)
    Loaded {
        generation: u64,
        result: Result<Vec<PageDescriptor>, LoadError>,
    },

    /// Page prepared (or failed to)
    Page {
        ticket: RenderTicket,
        result: Result<Arc<PreparedFrame>, RenderError>,
        /// Time spent in the pipeline, queueing excluded
        elapsed: Duration,
    },

    /// A newer page request superseded this one before it started
    Cancelled(RenderTicket),
}
