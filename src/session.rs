use crate::Timestamp;

/// an append-only selection event (spec §3). Ordered by `timestamp` within
/// a session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Selection {
    pub session_id: String,
    pub item_id: String,
    pub is_exception: bool,
    pub timestamp: Timestamp,
}

/// a 1-5 rating of how well the prefix-so-far matches the user's taste
/// (spec §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PrefixRating {
    pub session_id: String,
    pub rating: u8,
    pub tags: Vec<String>,
    pub timestamp: Timestamp,
}

/// resolves the prefix key for a session at rating-time `t`: the hyphen-
/// joined item ids of every selection in the session with
/// `timestamp <= t`, ordered by timestamp ascending (spec §3, §4.4). The
/// source toggled between this and a sorted-by-id variant across two
/// recommender copies; this crate always uses the timestamp-ordered
/// definition to match the training-time one (DESIGN.md Open Question 2).
pub fn prefix_key(selections: &[Selection], up_to: Timestamp) -> String {
    let mut relevant: Vec<&Selection> = selections
        .iter()
        .filter(|s| s.timestamp <= up_to)
        .collect();
    relevant.sort_by_key(|s| s.timestamp);
    relevant
        .iter()
        .map(|s| s.item_id.as_str())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_key_forms_a_chain() {
        let selections = vec![
            Selection {
                session_id: "s1".into(),
                item_id: "a".into(),
                is_exception: false,
                timestamp: 10,
            },
            Selection {
                session_id: "s1".into(),
                item_id: "b".into(),
                is_exception: false,
                timestamp: 20,
            },
            Selection {
                session_id: "s1".into(),
                item_id: "c".into(),
                is_exception: false,
                timestamp: 30,
            },
        ];
        assert_eq!(prefix_key(&selections, 10), "a");
        assert_eq!(prefix_key(&selections, 20), "a-b");
        assert_eq!(prefix_key(&selections, 30), "a-b-c");
        // at t=25, only a,b qualify -- c is still a valid prefix extension
        assert_eq!(prefix_key(&selections, 25), "a-b");
    }
}
