pub mod audit;
pub mod descriptor_extractor;
pub mod evidence;
pub mod face_descriptor;
pub mod face_matcher;
pub mod outcome;
pub mod profile_store;
pub mod recognition_error;
pub mod recognition_settings;
