pub mod commands;
pub mod render;
pub mod ui;
pub mod wizard;

pub use render::{Rendered, render_stream};
pub use ui::Output;
pub use wizard::{ProjectData, ProjectUpdate, WizardState, WizardStep};
