//! Read-only derived views over stored player snapshots (§4.5-4.7): a
//! bucketed history sampler, a session extractor, and a milestone finder
//! with its star/experience conversion.

mod history;
mod milestones;
mod sessions;

pub use history::get_history;
pub use milestones::{exp_to_stars, find_milestones, stars_to_exp, Achievement, Stat};
pub use sessions::get_sessions;
