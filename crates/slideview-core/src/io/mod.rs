pub mod export;
pub mod tiling;
