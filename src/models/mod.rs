pub mod job;
pub mod response;
pub mod result;

pub use job::*;
pub use response::*;
pub use result::*;
