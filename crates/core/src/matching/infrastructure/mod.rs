pub mod http_face_matcher;
