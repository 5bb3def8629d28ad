//! # motionlight-app
//!
//! Application layer: use-cases built on top of the domain model.
//!
//! ## Responsibilities
//! - `compiler`: turn a parsed [`ConfigDocument`](motionlight_domain::definition::ConfigDocument)
//!   into an immutable [`Config`](compiler::Config), building templates,
//!   materializing bindings and checking every cross reference
//! - `evaluator`: live matching of one binding against individual person states
//! - `verifier`: exhaustive enumeration of a binding's reachable input space
//! - `report`: coverage reports and their tabular rendering
//!
//! ## Dependency rule
//! Depends on `motionlight-domain` only. Performs no IO; callers hand in
//! already-parsed documents and print the returned tables themselves.

pub mod compiler;
pub mod evaluator;
pub mod report;
pub mod verifier;
