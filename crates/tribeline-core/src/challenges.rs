//! The compiled-in challenge table.
//!
//! Thresholds and star rewards are product contract. Each entry pairs a
//! display name with exactly one [`PredicateKind`]; the rule engine decides
//! how each kind is read from the document store.

use serde::Serialize;

/// The predicate a challenge is judged by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateKind {
    HasAnyOwnPost,
    /// Profile picture and cover photo both set.
    HasCompleteProfile,
    HasAnyFollowing,
    LikesGivenAtLeast { n: i64 },
    ConsecutiveLoginAtLeast { n: i32 },
    CommentCountAtLeast { n: i64 },
    ShareCountAtLeast { n: i64 },
    /// At least `count` own posts created in the last `window_days` days.
    DistinctPostsInWindow { count: usize, window_days: i64 },
    TribeIsNotDefault,
    FollowerCountAtLeast { n: u64 },
    /// Some own post has at least `n` votes.
    AnyOwnPostVotesAtLeast { n: i64 },
    LikesOrCommentsAtLeast { n: i64 },
    /// Own posts on at least `count` distinct local calendar days in the
    /// last `window_days` days.
    DistinctPostingDaysInWindow { count: usize, window_days: i64 },
    HasPet,
    TribeRoleIs { role: &'static str },
}

impl PredicateKind {
    /// Whether the predicate is answered from the user aggregate alone.
    #[must_use]
    pub fn reads_aggregate(&self) -> bool {
        !matches!(
            self,
            PredicateKind::HasAnyOwnPost
                | PredicateKind::HasAnyFollowing
                | PredicateKind::DistinctPostsInWindow { .. }
                | PredicateKind::FollowerCountAtLeast { .. }
                | PredicateKind::AnyOwnPostVotesAtLeast { .. }
                | PredicateKind::DistinctPostingDaysInWindow { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[serde(rename = "Very Hard")]
    VeryHard,
    Expert,
    Impossible,
}

impl Difficulty {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very Hard",
            Difficulty::Expert => "Expert",
            Difficulty::Impossible => "Impossible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDefinition {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
    pub predicate: PredicateKind,
    pub star_reward: i64,
}

impl ChallengeDefinition {
    /// Message used for the completion notification.
    #[must_use]
    pub fn completion_message(&self) -> String {
        format!("Finished challenge: {}", self.name)
    }
}

pub const CATALOG: &[ChallengeDefinition] = &[
    ChallengeDefinition {
        id: 1,
        name: "First Post",
        description: "Make your first post on the app",
        difficulty: Difficulty::Easy,
        predicate: PredicateKind::HasAnyOwnPost,
        star_reward: 1,
    },
    ChallengeDefinition {
        id: 2,
        name: "Profile Update",
        description: "Complete your profile",
        difficulty: Difficulty::Easy,
        predicate: PredicateKind::HasCompleteProfile,
        star_reward: 1,
    },
    ChallengeDefinition {
        id: 3,
        name: "Follow a Friend",
        description: "Follow your first friend on the app",
        difficulty: Difficulty::Easy,
        predicate: PredicateKind::HasAnyFollowing,
        star_reward: 1,
    },
    ChallengeDefinition {
        id: 4,
        name: "Like those Posts",
        description: "Like 5 posts from other users",
        difficulty: Difficulty::Medium,
        predicate: PredicateKind::LikesGivenAtLeast { n: 5 },
        star_reward: 2,
    },
    ChallengeDefinition {
        id: 5,
        name: "Daily Active",
        description: "Interact with the app for 7 consecutive days",
        difficulty: Difficulty::Medium,
        predicate: PredicateKind::ConsecutiveLoginAtLeast { n: 7 },
        star_reward: 2,
    },
    ChallengeDefinition {
        id: 6,
        name: "Commenter",
        description: "Leave 10 comments on different posts",
        difficulty: Difficulty::Medium,
        predicate: PredicateKind::CommentCountAtLeast { n: 10 },
        star_reward: 2,
    },
    ChallengeDefinition {
        id: 7,
        name: "Engage with Content",
        description: "Share 3 different posts on your timeline",
        difficulty: Difficulty::Hard,
        predicate: PredicateKind::ShareCountAtLeast { n: 3 },
        star_reward: 2,
    },
    ChallengeDefinition {
        id: 8,
        name: "Content Creator",
        description: "Create 3 unique posts in a week",
        difficulty: Difficulty::Hard,
        predicate: PredicateKind::DistinctPostsInWindow {
            count: 3,
            window_days: 7,
        },
        star_reward: 3,
    },
    ChallengeDefinition {
        id: 9,
        name: "Tribal",
        description: "Join a tribe",
        difficulty: Difficulty::Hard,
        predicate: PredicateKind::TribeIsNotDefault,
        star_reward: 3,
    },
    ChallengeDefinition {
        id: 10,
        name: "Influencer",
        description: "Gain 50 followers",
        difficulty: Difficulty::VeryHard,
        predicate: PredicateKind::FollowerCountAtLeast { n: 50 },
        star_reward: 5,
    },
    ChallengeDefinition {
        id: 11,
        name: "Top Contributor",
        description: "Receive 20 likes on a single post",
        difficulty: Difficulty::VeryHard,
        predicate: PredicateKind::AnyOwnPostVotesAtLeast { n: 20 },
        star_reward: 5,
    },
    ChallengeDefinition {
        id: 12,
        name: "Social Butterfly",
        description: "Interact with 30 different posts",
        difficulty: Difficulty::VeryHard,
        predicate: PredicateKind::LikesOrCommentsAtLeast { n: 30 },
        star_reward: 5,
    },
    ChallengeDefinition {
        id: 13,
        name: "Century",
        description: "Like 100 posts",
        difficulty: Difficulty::Expert,
        predicate: PredicateKind::LikesGivenAtLeast { n: 100 },
        star_reward: 7,
    },
    ChallengeDefinition {
        id: 14,
        name: "Content Marathon",
        description: "Post every day for a month",
        difficulty: Difficulty::Expert,
        predicate: PredicateKind::DistinctPostingDaysInWindow {
            count: 30,
            window_days: 30,
        },
        star_reward: 7,
    },
    ChallengeDefinition {
        id: 15,
        name: "Sweet Pet",
        description: "Get yourself a pet",
        difficulty: Difficulty::Expert,
        predicate: PredicateKind::HasPet,
        star_reward: 7,
    },
    ChallengeDefinition {
        id: 16,
        name: "Viral Post",
        description: "Like 1000 posts",
        difficulty: Difficulty::Expert,
        predicate: PredicateKind::LikesGivenAtLeast { n: 1000 },
        star_reward: 7,
    },
    ChallengeDefinition {
        id: 17,
        name: "The Chief",
        description: "Be the leader of your tribe",
        difficulty: Difficulty::Impossible,
        predicate: PredicateKind::TribeRoleIs { role: "leader" },
        star_reward: 15,
    },
];

// Ids are 1..=17 in table order, so lookup is an index.
const _: () = {
    assert!(CATALOG.len() == 17, "challenge table must hold 17 entries");
    let mut i = 0;
    while i < CATALOG.len() {
        assert!(
            CATALOG[i].id as usize == i + 1,
            "challenge ids must be sequential from 1"
        );
        i += 1;
    }
};

/// Look up a challenge by id. Returns `None` outside `1..=17`.
#[must_use]
pub fn find_challenge(id: u32) -> Option<&'static ChallengeDefinition> {
    let index = usize::try_from(id).ok()?.checked_sub(1)?;
    CATALOG.get(index)
}
