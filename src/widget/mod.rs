pub mod canvas;
pub mod controls;
pub mod fields;
pub mod hud_message;
pub mod loupe;

pub use canvas::{CELL_HEIGHT_PX, CELL_WIDTH_PX, PageCanvas};
pub use controls::{ControlBar, hit_control};
pub use fields::FieldsPanel;
pub use hud_message::{HudMessage, HudMode};
pub use loupe::LoupePopup;
