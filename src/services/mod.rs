pub mod ai;
pub mod image;
pub mod plan;
pub mod speech;
