pub mod face_matcher;
