pub mod raster_surface;
pub mod snapshot_presenter;
