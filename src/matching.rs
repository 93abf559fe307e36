//! Skill match scoring
//!
//! Scores are computed from the viewer's side: how much of the viewer's own
//! offered+wanted list is covered by skills exchanged with the candidate.
//! The score is not clamped; a candidate offering the same wanted skill under
//! several spellings can push it past 100.

use serde::{Deserialize, Serialize};

use crate::models::PublicUser;

/// The two skill lists a score is computed from
#[derive(Debug, Clone, Copy)]
pub struct SkillSets<'a> {
    pub offered: &'a [String],
    pub wanted: &'a [String],
}

impl<'a> From<&'a PublicUser> for SkillSets<'a> {
    fn from(user: &'a PublicUser) -> Self {
        Self {
            offered: &user.skills_offered,
            wanted: &user.skills_wanted,
        }
    }
}

/// Compatibility of a candidate as seen by the viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchScore {
    /// Candidate's offered skills the viewer wants
    pub can_teach_viewer: Vec<String>,
    /// Viewer's offered skills the candidate wants
    pub viewer_can_teach: Vec<String>,
    pub score: u32,
}

impl MatchScore {
    pub fn is_mutual(&self) -> bool {
        !self.can_teach_viewer.is_empty() && !self.viewer_can_teach.is_empty()
    }
}

fn overlapping(offered: &[String], wanted: &[String]) -> Vec<String> {
    offered
        .iter()
        .filter(|skill| wanted.iter().any(|want| want.to_lowercase() == skill.to_lowercase()))
        .cloned()
        .collect()
}

/// Score `candidate` from `viewer`'s perspective.
pub fn score(viewer: SkillSets<'_>, candidate: SkillSets<'_>) -> MatchScore {
    let can_teach_viewer = overlapping(candidate.offered, viewer.wanted);
    let viewer_can_teach = overlapping(viewer.offered, candidate.wanted);

    let matched = (can_teach_viewer.len() + viewer_can_teach.len()) as f64;
    let possible = (viewer.offered.len() + viewer.wanted.len()).max(1) as f64;
    let score = (100.0 * matched / possible).round() as u32;

    MatchScore {
        can_teach_viewer,
        viewer_can_teach,
        score,
    }
}

/// A candidate placed in one of the match buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    #[serde(flatten)]
    pub user: PublicUser,
    pub match_score: u32,
    /// Skills the candidate can teach the viewer
    pub can_teach_you: Vec<String>,
    /// Skills the viewer can teach the candidate
    pub can_teach_them: Vec<String>,
}

/// Candidates grouped by how they relate to the viewer.
///
/// A candidate may appear in several buckets. Each bucket is ordered by
/// score, highest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchBuckets {
    pub can_teach_you: Vec<MatchCandidate>,
    pub want_to_learn_from_you: Vec<MatchCandidate>,
    pub mutual_matches: Vec<MatchCandidate>,
}

/// Score every candidate against the viewer and sort them into buckets.
///
/// The viewer is skipped if present among the candidates.
pub fn classify(viewer: &PublicUser, candidates: Vec<PublicUser>) -> MatchBuckets {
    let mut buckets = MatchBuckets::default();

    for candidate in candidates.into_iter().filter(|c| c.id != viewer.id) {
        let result = score(viewer.into(), (&candidate).into());
        let entry = MatchCandidate {
            match_score: result.score,
            can_teach_you: result.can_teach_viewer.clone(),
            can_teach_them: result.viewer_can_teach.clone(),
            user: candidate,
        };

        if !result.can_teach_viewer.is_empty() {
            buckets.can_teach_you.push(entry.clone());
        }
        if !result.viewer_can_teach.is_empty() {
            buckets.want_to_learn_from_you.push(entry.clone());
        }
        if result.is_mutual() {
            buckets.mutual_matches.push(entry);
        }
    }

    for bucket in [
        &mut buckets.can_teach_you,
        &mut buckets.want_to_learn_from_you,
        &mut buckets.mutual_matches,
    ] {
        bucket.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    }

    buckets
}
