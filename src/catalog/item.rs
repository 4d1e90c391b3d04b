use std::collections::BTreeMap;

/// a single value in an item's category-specific field map. The source
/// duck-types this as dict-vs-object; here every item takes exactly one
/// path through a single typed record plus a small set of value shapes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    Text(String),
    List(Vec<String>),
    Options(BTreeMap<String, Vec<String>>),
    Number(f64),
}

impl ItemValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ItemValue::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ItemValue::List(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_options(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ItemValue::Options(m) => Some(m),
            _ => None,
        }
    }
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ItemValue::Number(n) => Some(*n),
            ItemValue::Text(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// a catalog product, immutable from the core's perspective; re-ingestion
/// replaces the record wholesale rather than patching fields in place.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: String,
    pub category: String,
    pub vendor: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub fields: BTreeMap<String, ItemValue>,
}

impl Item {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            vendor: None,
            price_min: None,
            price_max: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_price(mut self, min: f64, max: f64) -> Self {
        self.price_min = Some(min);
        self.price_max = Some(max);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: ItemValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// price tercile partitioning treats a missing price as zero (spec §4.6).
    pub fn price_min_or_zero(&self) -> f64 {
        self.price_min.unwrap_or(0.0)
    }

    /// single accessor path for any named field, whether it lives in the
    /// catalog-wide columns (vendor, price_min/max) or the category-specific
    /// field map -- callers never need to know which.
    pub fn field_value(&self, key: &str) -> Option<ItemValue> {
        match key {
            "vendor" => self.vendor.clone().map(ItemValue::Text),
            "price_min" => self.price_min.map(ItemValue::Number),
            "price_max" => self.price_max.map(ItemValue::Number),
            _ => self.fields.get(key).cloned(),
        }
    }
}
