pub mod frame_presenter;
pub mod overlay_renderer;
pub mod surface;
pub mod text_box_layout;
