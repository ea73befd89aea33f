use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::shared::frame::Frame;
use crate::shared::service_error::ServiceError;

/// Encodes a frame as PNG and wraps it in standard base64.
///
/// This is the request body both services accept: the base64 text of the
/// image alone, without a `data:image/png;base64,` prefix.
pub fn encode_png_base64(frame: &Frame) -> Result<String, ServiceError> {
    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| {
            ServiceError::FrameUnavailable("frame data does not match its dimensions".into())
        })?;

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, image::ImageFormat::Png)
        .map_err(ServiceError::Encode)?;

    Ok(BASE64_STANDARD.encode(png.into_inner()))
}
