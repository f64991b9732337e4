pub mod color;
pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use color::{ColorBackend, HsvRange, COLOR_BACKEND_LABEL};
pub use stub::StubBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;
