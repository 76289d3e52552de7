pub mod face_image;
pub mod face_matcher;
pub mod face_normalizer;
pub mod gallery;
pub mod match_result;
pub mod shared_gallery;
