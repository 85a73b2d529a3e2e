pub mod project;
pub mod recommend;
pub mod score;
pub mod weights;
