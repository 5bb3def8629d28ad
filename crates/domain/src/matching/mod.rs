//! Match engine: closed matcher hierarchy evaluated against observed state.
//!
//! Matchers are layered:
//! - [`MatchSingle`] decides whether one observed value is acceptable.
//! - [`MatchMulti`] lifts a [`MatchSingle`] over a single state or a set of
//!   states using a [`MatchMode`].
//! - [`UserStateMatch`] binds a [`MatchMulti`] to one user or group.
//! - [`RuleMatch`] combines room, occupancy and an OR-list of user matches.

mod multi;
mod rule;
mod single;
mod user;

pub use multi::{MatchMode, MatchMulti};
pub use rule::RuleMatch;
pub use single::MatchSingle;
pub use user::UserStateMatch;
