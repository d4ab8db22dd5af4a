//! Risk checkers run by the classifier.
//!
//! # Design
//! - Every checker is a pure function of the snapshot, the policy and at most
//!   one collaborator; enabling and disabling them is the classifier's job.
//! - Only the hard-link checker touches the filesystem, through [`qbt_flow_torrent_core::HardLinkProbe`].

mod cross_seed;
mod hard_link;
mod hit_and_run;
mod swarm;

pub use cross_seed::cross_seed;
pub use hard_link::{hard_link, resolve_local_path};
pub use hit_and_run::hit_and_run;
pub use swarm::{download_limit, public_tracker, tracker_issue, upload_limit};
