//! Terminal host I/O: backend trait, real and test backends, detection.

mod crossterm_backend;
mod detect;
mod test_backend;
mod traits;

pub use crossterm_backend::CrosstermBackend;
pub use detect::{detect_capabilities, detect_color_support};
pub use test_backend::TestBackend;
pub use traits::{ColorSupport, MouseMode, Terminal, TerminalCapabilities};
