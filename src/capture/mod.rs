pub mod detector;
pub mod frame;
#[cfg(feature = "opencv")]
pub mod opencv_backend;
pub mod session;
pub mod source;

pub use detector::*;
pub use frame::*;
pub use session::*;
pub use source::*;
