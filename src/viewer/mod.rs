//! Viewer model: navigation, zoom, the page/screen transform and the state
//! record that ties them together

mod navigation;
mod session;
mod state;
mod transform;
mod zoom;

pub use navigation::Navigation;
pub use session::{Job, Session};
pub use state::{Command, Control, Controls, Effect, ViewerState};
pub use transform::ViewTransform;
pub use zoom::Zoom;
