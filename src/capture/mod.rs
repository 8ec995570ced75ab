pub mod controller;
pub mod loop_worker;

pub use controller::CaptureController;
pub use loop_worker::{capture_loop, capture_sample};
