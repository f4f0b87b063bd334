pub mod app;
pub mod event_source;
pub mod export;
pub mod fetch;
pub mod geometry;
pub mod magnifier;
pub mod page;
pub mod panic_handler;
pub mod regions;
pub mod settings;
pub mod surface;
pub mod theme;
pub mod viewer;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, AppConfig, run_app_with_event_source};
