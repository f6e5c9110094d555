pub mod window_id;

pub use window_id::WindowId;
