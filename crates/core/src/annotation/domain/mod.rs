pub mod annotation_controller;
pub mod annotation_state;
pub mod pipeline_state;
