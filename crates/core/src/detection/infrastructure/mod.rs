pub mod execution_provider;
pub mod math;
pub mod onnx_face_locator;
pub mod whole_frame_locator;
