//! Default tag names, scoring coefficients, and environment keys.
//!
//! # Design
//! - Centralize defaults so the documents, the validated policy and the tests agree.

pub(crate) const NO_HARD_LINK_TAG: &str = "noHL";
pub(crate) const HIT_AND_RUN_TAG: &str = "H&R";
pub(crate) const UPLOAD_LIMIT_TAG: &str = "UpLimit";
pub(crate) const DOWNLOAD_LIMIT_TAG: &str = "DownLimit";
pub(crate) const PUBLIC_TAG: &str = "Public";
pub(crate) const TRACKER_ISSUE_TAG: &str = "TrackerIssue";
pub(crate) const UNKNOWN_TRACKER_TAG: &str = "Other";
pub(crate) const CROSS_SEED_TAG: &str = "cross-seed";

pub(crate) const COEF_DAY_SEED_TIME: f64 = 0.5;
pub(crate) const COEF_SEED_RATIO: f64 = 2.0;
pub(crate) const COEF_NUMS_SEEDER: f64 = 0.1;

/// Client that must always be configured.
pub(crate) const LOCAL_CLIENT: &str = "local";
pub(crate) const DOWNLOAD_FOLDER: &str = "/downloads";
pub(crate) const CONFIG_FOLDER: &str = "/config";
pub(crate) const LOG_LEVEL: &str = "info";

pub(crate) const ENV_CONFIG_FOLDER: &str = "QFU_CONFIG_FOLDER";
pub(crate) const ENV_DOWNLOAD_FOLDER: &str = "QFU_DOWNLOAD_FOLDER";
pub(crate) const ENV_CHECK_HARD_LINKS: &str = "QFU_CHECK_HARD_LINKS";
pub(crate) const ENV_CHECK_CROSS_SEED: &str = "QFU_CHECK_CROSS_SEED";
pub(crate) const ENV_LOG_LEVEL: &str = "QFU_LOG_LEVEL";
pub(crate) const ENV_LOG_FORMAT: &str = "QFU_LOG_FORMAT";
