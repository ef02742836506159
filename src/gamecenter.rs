//! Game Center resource vocabulary and the leaderboard/achievement catalog.

use serde_json::{Value, json};

use crate::util::relationship;

pub const DEFAULT_LEVELS: u32 = 60;
pub const DEFAULT_LOCALE: &str = "en-US";

/// Points awarded by the final "all levels" achievement.
const ALL_LEVELS_POINTS: u32 = 40;

/// The two kinds of Game Center item this tool manages.
///
/// Every resource name the API uses for an item, its localizations, images,
/// versions and releases hangs off this enum so workflows can be written once
/// for both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Achievement,
    Leaderboard,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Achievement, ItemKind::Leaderboard];

    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Achievement => "achievement",
            ItemKind::Leaderboard => "leaderboard",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ItemKind::Achievement => "achievements",
            ItemKind::Leaderboard => "leaderboards",
        }
    }

    /// Sub-directory that holds this kind's PNG files.
    pub fn image_dir(self) -> &'static str {
        self.plural()
    }

    pub fn collection(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievements",
            ItemKind::Leaderboard => "gameCenterLeaderboards",
        }
    }

    /// Relationship name pointing from a child resource back at the item.
    pub fn item_relationship(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievement",
            ItemKind::Leaderboard => "gameCenterLeaderboard",
        }
    }

    pub fn localization_type(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementLocalizations",
            ItemKind::Leaderboard => "gameCenterLeaderboardLocalizations",
        }
    }

    pub fn localization_relationship(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementLocalization",
            ItemKind::Leaderboard => "gameCenterLeaderboardLocalization",
        }
    }

    pub fn image_type(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementImages",
            ItemKind::Leaderboard => "gameCenterLeaderboardImages",
        }
    }

    pub fn image_relationship(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementImage",
            ItemKind::Leaderboard => "gameCenterLeaderboardImage",
        }
    }

    pub fn version_type(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementVersions",
            ItemKind::Leaderboard => "gameCenterLeaderboardVersions",
        }
    }

    /// Relationship from a v2 version back to its item.
    pub fn version_parent(self) -> &'static str {
        match self {
            ItemKind::Achievement => "achievement",
            ItemKind::Leaderboard => "leaderboard",
        }
    }

    /// Relationship name of a review submission item carrying this version.
    pub fn review_item_relationship(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementVersion",
            ItemKind::Leaderboard => "gameCenterLeaderboardVersion",
        }
    }

    pub fn release_type(self) -> &'static str {
        match self {
            ItemKind::Achievement => "gameCenterAchievementReleases",
            ItemKind::Leaderboard => "gameCenterLeaderboardReleases",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardSpec {
    pub level: u32,
    pub reference_name: String,
    pub vendor_identifier: String,
    pub submission_type: String,
    pub score_sort_type: String,
    pub score_range_start: String,
    pub score_range_end: String,
    pub default_formatter: String,
    pub formatter_suffix: String,
}

impl LeaderboardSpec {
    pub fn best_score(level: u32) -> Self {
        Self {
            level,
            reference_name: format!("Level {level} - Best Score"),
            vendor_identifier: format!("level_{level}_score"),
            submission_type: "BEST_SCORE".into(),
            // Remaining HP: higher is better.
            score_sort_type: "DESC".into(),
            score_range_start: "0".into(),
            score_range_end: "9999".into(),
            default_formatter: "INTEGER".into(),
            formatter_suffix: " pts".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementLocalization {
    pub name: String,
    pub before_earned_description: String,
    pub after_earned_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementSpec {
    /// `None` for the achievement that spans every level.
    pub level: Option<u32>,
    pub reference_name: String,
    pub vendor_identifier: String,
    pub points: u32,
    pub repeatable: bool,
    pub show_before_earned: bool,
    pub localization: AchievementLocalization,
}

impl AchievementSpec {
    pub fn level_complete(level: u32) -> Self {
        Self {
            level: Some(level),
            reference_name: format!("Level {level} Complete"),
            vendor_identifier: format!("level_{level}_complete"),
            points: 1,
            repeatable: false,
            show_before_earned: true,
            localization: AchievementLocalization {
                name: format!("Level {level} Clear"),
                before_earned_description: format!("Complete Level {level}"),
                after_earned_description: format!("Cleared Level {level}!"),
            },
        }
    }

    pub fn all_levels_complete(levels: u32) -> Self {
        Self {
            level: None,
            reference_name: "All Levels Complete".into(),
            vendor_identifier: "all_levels_complete".into(),
            points: ALL_LEVELS_POINTS,
            repeatable: false,
            show_before_earned: true,
            localization: AchievementLocalization {
                name: "Number Master".into(),
                before_earned_description: format!("Complete all {levels} levels"),
                after_earned_description: format!(
                    "Cleared all {levels} levels! You are the Number Master!"
                ),
            },
        }
    }
}

/// Everything `setup` creates and `generate-images` draws, in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub levels: u32,
    pub leaderboards: Vec<LeaderboardSpec>,
    pub achievements: Vec<AchievementSpec>,
}

impl Catalog {
    pub fn for_levels(levels: u32) -> Self {
        let leaderboards = (1..=levels).map(LeaderboardSpec::best_score).collect();
        let mut achievements: Vec<AchievementSpec> =
            (1..=levels).map(AchievementSpec::level_complete).collect();
        achievements.push(AchievementSpec::all_levels_complete(levels));
        Self {
            levels,
            leaderboards,
            achievements,
        }
    }

    pub fn total_points(&self) -> u32 {
        self.achievements.iter().map(|a| a.points).sum()
    }

    pub fn total_items(&self) -> usize {
        self.leaderboards.len() + self.achievements.len()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::for_levels(DEFAULT_LEVELS)
    }
}

pub fn game_center_detail_body(app_id: &str) -> Value {
    json!({
        "data": {
            "type": "gameCenterDetails",
            "relationships": {
                "app": relationship("apps", app_id)
            }
        }
    })
}

pub fn leaderboard_body(detail_id: &str, spec: &LeaderboardSpec) -> Value {
    json!({
        "data": {
            "type": ItemKind::Leaderboard.collection(),
            "attributes": {
                "referenceName": spec.reference_name,
                "vendorIdentifier": spec.vendor_identifier,
                "submissionType": spec.submission_type,
                "scoreSortType": spec.score_sort_type,
                "scoreRangeStart": spec.score_range_start,
                "scoreRangeEnd": spec.score_range_end,
                "defaultFormatter": spec.default_formatter,
            },
            "relationships": {
                "gameCenterDetail": relationship("gameCenterDetails", detail_id)
            }
        }
    })
}

pub fn leaderboard_localization_body(leaderboard_id: &str, spec: &LeaderboardSpec) -> Value {
    let mut attributes = json!({
        "locale": DEFAULT_LOCALE,
        "name": spec.reference_name,
    });
    if !spec.formatter_suffix.is_empty() {
        attributes["formatterSuffix"] = Value::String(spec.formatter_suffix.clone());
    }
    json!({
        "data": {
            "type": ItemKind::Leaderboard.localization_type(),
            "attributes": attributes,
            "relationships": {
                "gameCenterLeaderboard": relationship(ItemKind::Leaderboard.collection(), leaderboard_id)
            }
        }
    })
}

pub fn achievement_body(detail_id: &str, spec: &AchievementSpec) -> Value {
    json!({
        "data": {
            "type": ItemKind::Achievement.collection(),
            "attributes": {
                "referenceName": spec.reference_name,
                "vendorIdentifier": spec.vendor_identifier,
                "points": spec.points,
                "repeatable": spec.repeatable,
                "showBeforeEarned": spec.show_before_earned,
            },
            "relationships": {
                "gameCenterDetail": relationship("gameCenterDetails", detail_id)
            }
        }
    })
}

pub fn achievement_localization_body(achievement_id: &str, loc: &AchievementLocalization) -> Value {
    json!({
        "data": {
            "type": ItemKind::Achievement.localization_type(),
            "attributes": {
                "locale": DEFAULT_LOCALE,
                "name": loc.name,
                "beforeEarnedDescription": loc.before_earned_description,
                "afterEarnedDescription": loc.after_earned_description,
            },
            "relationships": {
                "gameCenterAchievement": relationship(ItemKind::Achievement.collection(), achievement_id)
            }
        }
    })
}

pub fn image_reservation_body(
    kind: ItemKind,
    localization_id: &str,
    file_name: &str,
    file_size: u64,
) -> Value {
    let mut relationships = serde_json::Map::new();
    relationships.insert(
        kind.localization_relationship().to_string(),
        relationship(kind.localization_type(), localization_id),
    );
    json!({
        "data": {
            "type": kind.image_type(),
            "attributes": {
                "fileSize": file_size,
                "fileName": file_name,
            },
            "relationships": relationships
        }
    })
}

pub fn image_commit_body(kind: ItemKind, image_id: &str) -> Value {
    json!({
        "data": {
            "type": kind.image_type(),
            "id": image_id,
            "attributes": { "uploaded": true }
        }
    })
}

pub fn item_version_body(kind: ItemKind, item_id: &str) -> Value {
    let mut relationships = serde_json::Map::new();
    relationships.insert(
        kind.version_parent().to_string(),
        relationship(kind.collection(), item_id),
    );
    json!({
        "data": {
            "type": kind.version_type(),
            "relationships": relationships
        }
    })
}

pub fn review_submission_item_body(submission_id: &str, kind: ItemKind, version_id: &str) -> Value {
    let mut relationships = serde_json::Map::new();
    relationships.insert(
        "reviewSubmission".to_string(),
        relationship("reviewSubmissions", submission_id),
    );
    relationships.insert(
        kind.review_item_relationship().to_string(),
        relationship(kind.version_type(), version_id),
    );
    json!({
        "data": {
            "type": "reviewSubmissionItems",
            "relationships": relationships
        }
    })
}

pub fn game_center_app_version_body(app_store_version_id: &str) -> Value {
    json!({
        "data": {
            "type": "gameCenterAppVersions",
            "relationships": {
                "appStoreVersion": relationship("appStoreVersions", app_store_version_id)
            }
        }
    })
}

pub fn detail_release_request_body(detail_id: &str) -> Value {
    json!({
        "data": {
            "type": "gameCenterDetailReleaseRequests",
            "relationships": {
                "gameCenterDetail": relationship("gameCenterDetails", detail_id)
            }
        }
    })
}

pub fn item_release_body(kind: ItemKind, detail_id: &str, item_id: &str) -> Value {
    let mut relationships = serde_json::Map::new();
    relationships.insert(
        "gameCenterDetail".to_string(),
        relationship("gameCenterDetails", detail_id),
    );
    relationships.insert(
        kind.item_relationship().to_string(),
        relationship(kind.collection(), item_id),
    );
    json!({
        "data": {
            "type": kind.release_type(),
            "relationships": relationships
        }
    })
}
