pub mod content_type;
pub mod file;
pub mod signal;

pub use content_type::get_content_type;
pub use file::*;
pub use signal::shutdown_signal;
