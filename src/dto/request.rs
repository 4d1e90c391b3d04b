use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StartGame {
    pub player_name: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOnboarding {
    pub selected_product_ids: Vec<String>,
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPick {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}
