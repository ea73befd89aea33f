use serde::Deserialize;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::constants::DETECT_ENDPOINT;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;
use crate::shared::service_client::ServiceClient;
use crate::shared::service_error::ServiceError;

/// Face detector backed by the remote `/boxes` endpoint.
pub struct HttpFaceDetector {
    client: ServiceClient,
}

#[derive(Deserialize)]
struct DetectionResponse {
    face_locations: Vec<[f64; 4]>,
}

impl HttpFaceDetector {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

impl FaceDetector for HttpFaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceBox>, ServiceError> {
        let body = self.client.post_image(DETECT_ENDPOINT, frame)?;
        parse_detection_response(&body)
    }
}

/// Parses `{"face_locations": [[top, right, bottom, left], ...]}`.
///
/// Box order is preserved. Fractional edges are rounded to whole pixels.
pub fn parse_detection_response(body: &str) -> Result<Vec<FaceBox>, ServiceError> {
    let response: DetectionResponse = serde_json::from_str(body)?;
    Ok(response
        .face_locations
        .into_iter()
        .map(|edges| FaceBox::from_edges(edges.map(|v| v.round() as i32)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::thread;
    use std::time::Duration;

    use rstest::rstest;

    #[test]
    fn test_parse_single_box() {
        let boxes = parse_detection_response(r#"{"face_locations": [[10, 50, 60, 5]]}"#).unwrap();
        assert_eq!(boxes, vec![FaceBox::from_edges([10, 50, 60, 5])]);
    }

    #[test]
    fn test_parse_preserves_service_order() {
        let body = r#"{"face_locations": [[300, 400, 350, 330], [10, 50, 60, 5], [100, 90, 150, 40]]}"#;
        let boxes = parse_detection_response(body).unwrap();
        let tops: Vec<i32> = boxes.iter().map(|b| b.top).collect();
        assert_eq!(tops, vec![300, 10, 100]);
    }

    #[test]
    fn test_parse_empty_list() {
        let boxes = parse_detection_response(r#"{"face_locations": []}"#).unwrap();
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_parse_rounds_fractional_edges() {
        let boxes = parse_detection_response(r#"{"face_locations": [[10.4, 50.6, 60.0, 5.5]]}"#)
            .unwrap();
        assert_eq!(boxes[0].edges(), [10, 51, 60, 6]);
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let body = r#"{"face_locations": [[1, 2, 3, 0]], "elapsed_ms": 12}"#;
        assert_eq!(parse_detection_response(body).unwrap().len(), 1);
    }

    #[rstest]
    #[case::not_json("no faces here")]
    #[case::missing_field(r#"{"boxes": [[1, 2, 3, 4]]}"#)]
    #[case::short_tuple(r#"{"face_locations": [[1, 2, 3]]}"#)]
    #[case::long_tuple(r#"{"face_locations": [[1, 2, 3, 4, 5]]}"#)]
    #[case::wrong_type(r#"{"face_locations": "none"}"#)]
    fn test_parse_malformed(#[case] body: &str) {
        assert!(matches!(
            parse_detection_response(body),
            Err(ServiceError::Parse(_))
        ));
    }

    #[test]
    fn test_detect_posts_base64_png_to_boxes_endpoint() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let handle = thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let url = request.url().to_string();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let response =
                tiny_http::Response::from_string(r#"{"face_locations": [[10, 50, 60, 5]]}"#);
            request.respond(response).unwrap();
            (url, content_type, body)
        });

        let client =
            ServiceClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(5))
                .unwrap();
        let detector = HttpFaceDetector::new(client);
        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 0);

        let boxes = detector.detect(&frame).unwrap();
        let (url, content_type, body) = handle.join().unwrap();

        assert_eq!(boxes, vec![FaceBox::from_edges([10, 50, 60, 5])]);
        assert_eq!(url, "/boxes");
        assert_eq!(
            content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        assert!(body.starts_with("iVBOR")); // base64 of the PNG signature
    }

    #[test]
    fn test_detect_reports_http_status() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let handle = thread::spawn(move || {
            let request = server.recv().unwrap();
            request
                .respond(tiny_http::Response::from_string("boom").with_status_code(500))
                .unwrap();
        });

        let client =
            ServiceClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(5))
                .unwrap();
        let detector = HttpFaceDetector::new(client);
        let err = detector
            .detect(&Frame::new(vec![0u8; 12], 2, 2, 0))
            .unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, ServiceError::Status { status: 500, .. }));
    }
}
