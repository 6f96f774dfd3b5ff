//! Liveness scoring and audited face recognition for attendance check-ins.
//!
//! Bounded contexts follow a `domain` / `infrastructure` split; use cases
//! that sequence them live in [`pipeline`].

pub mod liveness;
pub mod pipeline;
pub mod recognition;
pub mod shared;
