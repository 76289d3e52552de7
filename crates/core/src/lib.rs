//! Face locating, gallery matching and watch-list policy.
//!
//! `recognition` holds the matching core and knows nothing about people
//! beyond numeric ids. `policy` turns match results into verdicts and
//! alerts. `pipeline` wires both to frame sources.

pub mod detection;
pub mod pipeline;
pub mod policy;
pub mod recognition;
pub mod shared;
pub mod video;
