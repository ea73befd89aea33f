pub mod overlay_session;
