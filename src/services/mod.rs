pub mod features;
pub mod providers;
pub mod recommendations;
pub mod similarity;

pub use recommendations::{recommend, Recommender};
