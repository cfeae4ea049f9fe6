//! Purpose: Catalog of the Instagram scraping operations offered by the remote service.
//! Exports: `Operation`, `SpiderSpec`, `DEFAULT_TIMEOUT`, `POLL_INTERVAL`.
//! Role: Static lookup from an operation to the vendor spider that executes it.
//! Invariants: Every `Operation` maps to exactly one spec; ids are vendor-defined constants.

use std::fmt;
use std::time::Duration;

/// Upper bound on how long a task may run before the wait is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
/// Minimum delay between two status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

const SPIDER_NAME: &str = "instagram.com";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    PostsByProfileUrl,
    PostByPostUrl,
    ProfileByUsername,
    ProfileByProfileUrl,
    ReelByUrl,
    AllReelsByUrl,
    ReelsByListUrl,
    CommentsByPostUrl,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SpiderSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub input_keys: &'static [&'static str],
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::PostsByProfileUrl,
        Operation::PostByPostUrl,
        Operation::ProfileByUsername,
        Operation::ProfileByProfileUrl,
        Operation::ReelByUrl,
        Operation::AllReelsByUrl,
        Operation::ReelsByListUrl,
        Operation::CommentsByPostUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::PostsByProfileUrl => "posts_by_profileurl",
            Operation::PostByPostUrl => "post_by_posturl",
            Operation::ProfileByUsername => "profile_by_username",
            Operation::ProfileByProfileUrl => "profile_by_profileurl",
            Operation::ReelByUrl => "reel_by_url",
            Operation::AllReelsByUrl => "all_reels_by_url",
            Operation::ReelsByListUrl => "reels_by_listurl",
            Operation::CommentsByPostUrl => "comments_by_posturl",
        }
    }

    pub fn spider(self) -> SpiderSpec {
        match self {
            Operation::PostsByProfileUrl => SpiderSpec {
                id: "ins_posts_by-profileurl",
                name: SPIDER_NAME,
                description: "Instagram posts by profile URL with date range and post type filtering",
                input_keys: &["profileurl", "resultsLimit", "start_date", "end_date", "post_type"],
            },
            Operation::PostByPostUrl => SpiderSpec {
                id: "ins_posts_by-posturl",
                name: SPIDER_NAME,
                description: "Instagram post details by post URL",
                input_keys: &["posturl"],
            },
            Operation::ProfileByUsername => SpiderSpec {
                id: "ins_profiles_by-username",
                name: SPIDER_NAME,
                description: "Instagram profile information by username",
                input_keys: &["username"],
            },
            Operation::ProfileByProfileUrl => SpiderSpec {
                id: "ins_profiles_by-profileurl",
                name: SPIDER_NAME,
                description: "Instagram profile information by profile URL",
                input_keys: &["profileurl"],
            },
            Operation::ReelByUrl => SpiderSpec {
                id: "ins_reel_by-url",
                name: SPIDER_NAME,
                description: "Instagram reel details by reel URL",
                input_keys: &["url"],
            },
            Operation::AllReelsByUrl => SpiderSpec {
                id: "ins_allreel_by-url",
                name: SPIDER_NAME,
                description: "All reels from a profile URL with filtering options",
                input_keys: &[
                    "url",
                    "num_of_posts",
                    "posts_to_not_include",
                    "start_date",
                    "end_date",
                ],
            },
            Operation::ReelsByListUrl => SpiderSpec {
                id: "ins_reel_by-listurl",
                name: SPIDER_NAME,
                description: "Reels list from a profile URL",
                input_keys: &[
                    "url",
                    "num_of_posts",
                    "posts_to_not_include",
                    "start_date",
                    "end_date",
                ],
            },
            Operation::CommentsByPostUrl => SpiderSpec {
                id: "ins_comment_by-posturl",
                name: SPIDER_NAME,
                description: "Instagram post/reel comments by post URL",
                input_keys: &["posturl"],
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Operation;
    use std::collections::HashSet;

    #[test]
    fn spider_ids_are_unique() {
        let ids: HashSet<_> = Operation::ALL.iter().map(|op| op.spider().id).collect();
        assert_eq!(ids.len(), Operation::ALL.len());
    }

    #[test]
    fn all_spiders_target_instagram() {
        for op in Operation::ALL {
            assert_eq!(op.spider().name, "instagram.com", "{op}");
            assert!(!op.spider().input_keys.is_empty());
        }
    }

    #[test]
    fn operation_names_are_stable() {
        assert_eq!(Operation::ReelsByListUrl.as_str(), "reels_by_listurl");
        assert_eq!(Operation::CommentsByPostUrl.spider().id, "ins_comment_by-posturl");
    }
}
