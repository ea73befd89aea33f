pub mod annotation;
pub mod detection;
pub mod matching;
pub mod rendering;
pub mod runtime;
pub mod shared;
pub mod video;
