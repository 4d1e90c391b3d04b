use super::explain::top_dimensions;
use super::types::GameRound;
use crate::catalog::CategoryProfile;
use crate::pcf::PcfState;
use crate::recommender::{Recommender, ScoredItem};
use crate::session::Selection;
use std::collections::HashSet;

/// the end-of-game report (spec §4.6 "Summary"): cumulative accuracy,
/// the wider taste profile, fresh top-5 recommendations, hidden gems
/// outside that top-5, and a short narrative.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub rounds_played: u32,
    pub human_score: i64,
    pub ai_score: i64,
    pub top3_accuracy: f32,
    pub exact_accuracy: f32,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub top_recommendations: Vec<ScoredItem>,
    pub hidden_gems: Vec<(String, f32)>,
    pub narrative: String,
}

const SUMMARY_DIMENSION_COUNT: usize = 6;
const TOP_RECOMMENDATION_COUNT: usize = 5;
const HIDDEN_GEM_COUNT: usize = 8;

pub fn build_summary(
    recommender: &Recommender,
    profile: &CategoryProfile,
    state: &PcfState,
    selected_ids: &[String],
    rounds: &[GameRound],
    human_score: i64,
    ai_score: i64,
) -> GameSummary {
    let rounds_played = rounds.len() as u32;
    let top3_accuracy = ratio(rounds.iter().filter(|r| r.ai_correct == Some(true)).count(), rounds.len());
    let exact_accuracy = ratio(rounds.iter().filter(|r| r.ai_exact == Some(true)).count(), rounds.len());

    let (mut likes, mut dislikes) = top_dimensions(state, recommender, profile);
    likes.truncate(SUMMARY_DIMENSION_COUNT);
    dislikes.truncate(SUMMARY_DIMENSION_COUNT);

    let selected_set: HashSet<String> = selected_ids.iter().cloned().collect();
    let top_recommendations: Vec<ScoredItem> = recommender
        .rank_unused(state, &selected_set)
        .into_iter()
        .take(TOP_RECOMMENDATION_COUNT)
        .collect();
    let top_ids: HashSet<String> = top_recommendations.iter().map(|r| r.item_id.clone()).collect();

    let hidden = recommender.hidden_preferences(state, selected_ids, 5);
    let mut excluded = selected_set.clone();
    excluded.extend(top_ids);
    let hidden_gems: Vec<(String, f32)> = recommender
        .hidden_gems(state, &hidden, &excluded, HIDDEN_GEM_COUNT)
        .into_iter()
        .collect();

    let narrative = narrate(profile, &hidden);

    GameSummary {
        rounds_played,
        human_score,
        ai_score,
        top3_accuracy,
        exact_accuracy,
        likes,
        dislikes,
        top_recommendations,
        hidden_gems,
        narrative,
    }
}

fn ratio(count: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32
    }
}

fn narrate(profile: &CategoryProfile, hidden: &[crate::pcf::HiddenPreference]) -> String {
    let labels: Vec<String> = hidden
        .iter()
        .filter_map(|h| crate::catalog::humanize_feature(&h.feature, profile))
        .take(3)
        .collect();
    match labels.as_slice() {
        [] => "Your picks were consistent enough that no hidden preferences stood out this game.".to_string(),
        [one] => format!("You kept coming back to {one} more than you let on."),
        [one, two] => format!("You kept coming back to {one} and {two} more than you let on."),
        [one, two, three, ..] => {
            format!("You kept coming back to {one}, {two}, and {three} more than you let on.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Item, ItemValue};
    use super::super::types::RoundMetrics;

    fn pen(id: &str) -> Item {
        Item::new(id, "fountain_pens")
            .with_vendor("Pilot")
            .with_price(80.0, 120.0)
            .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
    }

    fn round(correct: bool, exact: bool) -> GameRound {
        let mut r = GameRound::new("g1".into(), 1, vec!["p0".into()]);
        r.ai_correct = Some(correct);
        r.ai_exact = Some(exact);
        r.pre_metrics = RoundMetrics {
            coherence_score: 0.5,
            predicted_prefix_rating: 3.0,
        };
        r
    }

    #[test]
    fn accuracy_and_recommendations_are_well_formed() {
        let items: Vec<Item> = (0..20).map(|i| pen(&format!("p{i}"))).collect();
        let recommender = Recommender::refresh(&items).unwrap();
        let mut state = recommender.init_state();
        recommender.update_with_selection(&mut state, "p0", false);
        let profile = CategoryProfile::fountain_pens();
        let rounds = vec![round(true, false), round(false, false)];

        let summary = build_summary(&recommender, &profile, &state, &["p0".to_string()], &rounds, 10, 10);
        assert_eq!(summary.rounds_played, 2);
        assert!((summary.top3_accuracy - 0.5).abs() < 1e-6);
        assert!((summary.exact_accuracy - 0.0).abs() < 1e-6);
        assert!(summary.top_recommendations.len() <= TOP_RECOMMENDATION_COUNT);
        assert!(!summary.top_recommendations.iter().any(|r| r.item_id == "p0"));
    }
}
