//! Library exports for the pagescriber annotation engine.
//!
//! The binary is a thin headless host; everything it drives (stroke store,
//! interaction controller, render loop, page prefetching, persistence) is
//! reusable from here by other front ends.

pub mod accel;
pub mod app;
pub mod config;
pub mod draw;
pub mod input;
pub mod pages;
pub mod project;
pub mod render_loop;
pub mod util;

pub use app::Annotator;
pub use config::Config;
