pub mod config;
pub mod consts;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod io;
pub mod pyramid;
pub mod render;
pub mod session;
pub mod source;
pub mod viewport;
