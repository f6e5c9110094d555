//! Seams to the platform: window handles, pointer capture, screens.

pub mod geometry;
pub mod headless;
pub mod input;
pub mod screen;
pub mod window;
