pub mod constants;
pub mod face_box;
pub mod frame;
pub mod identity;
pub mod image_payload;
pub mod overlay_config;
pub mod service_client;
pub mod service_error;
