//! Client-side view state.
//!
//! DESIGN
//! ======
//! State is a plain value advanced by a pure reducer; the controller owns the
//! single live copy and runs the effects the reducer asks for.

pub mod records;
