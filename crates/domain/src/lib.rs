//! # motionlight-domain
//!
//! Pure domain model for motionlight, occupancy- and presence-driven
//! lighting rules.
//!
//! ## Responsibilities
//! - Error conventions shared by every layer
//! - **Templates**: declared inputs, strict usage accounting, literal
//!   substitution into rules
//! - **Matchers**: single values, multi-valued states, per-user conditions,
//!   whole-rule conditions
//! - **Users & groups**: an acyclic registry and the fold of member states
//!   into a group state
//! - **Rules & rule sets**: ordered, first-match-wins evaluation
//! - **Light bindings**, **light profiles** and **settings**
//! - Definition types mirroring the rules document
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO. Everything
//! here is immutable once built and safe to share across threads.

pub mod error;
pub mod state;

pub mod binding;
pub mod definition;
pub mod matching;
pub mod profile;
pub mod rules;
pub mod settings;
pub mod template;
pub mod users_groups;
