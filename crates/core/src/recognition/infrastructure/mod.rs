pub mod file_audit_sink;
pub mod http_face_matcher;
pub mod jpeg_evidence_encoder;
pub mod json_profile_store;
pub mod local_face_matcher;
pub mod model_slot;
pub mod onnx_arcface_embedder;
pub mod onnx_descriptor_extractor;
pub mod onnx_face_locator;
