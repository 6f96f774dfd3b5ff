pub mod attempt_observer;
pub mod check_in_use_case;
pub mod evaluate_liveness_use_case;
pub mod recognize_face_use_case;
pub mod register_face_use_case;
