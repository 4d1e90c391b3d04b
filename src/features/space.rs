use crate::catalog;
use crate::catalog::Item;
use std::collections::HashMap;

/// `{feature_key -> dense_index}` (insertion-ordered) plus
/// `{numeric_feature_key -> (mean, stddev)}` (spec §3, §4.2).
///
/// Determinism contract: for a fixed catalog (by id), two independent
/// builds yield an identical `feature_order`/`numeric_stats` -- achieved by
/// always iterating the catalog in stable id order rather than trusting
/// caller-supplied ordering (Design Notes §9).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FeatureSpace {
    feature_order: Vec<String>,
    feature_index: HashMap<String, usize>,
    numeric_stats: HashMap<String, (f32, f32)>,
}

impl FeatureSpace {
    pub fn width(&self) -> usize {
        self.feature_order.len()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.feature_index.get(key).copied()
    }

    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.feature_order.get(index).map(String::as_str)
    }

    pub fn numeric_stats(&self, key: &str) -> Option<(f32, f32)> {
        self.numeric_stats.get(key).copied()
    }

    pub fn is_numeric_index(&self, index: usize) -> bool {
        self.key_at(index)
            .is_some_and(|k| k.contains("::num::"))
    }

    fn insert(&mut self, key: String) {
        if !self.feature_index.contains_key(&key) {
            let idx = self.feature_order.len();
            self.feature_index.insert(key.clone(), idx);
            self.feature_order.push(key);
        }
    }

    /// builds a feature space from a catalog, iterating items in stable id
    /// order so that the resulting index is identical across processes.
    pub fn build(items: &[Item]) -> crate::Result<Self> {
        let mut ordered: Vec<&Item> = items.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let mut space = FeatureSpace::default();
        let mut numeric_samples: HashMap<String, Vec<f64>> = HashMap::new();

        for item in &ordered {
            if item.category.trim().is_empty() {
                return Err(crate::Error::schema(format!(
                    "item {} is missing a category",
                    item.id
                )));
            }
            let profile = catalog::profile(&item.category)?;
            let (tokens, numerics) = catalog::extract_tokens_and_numerics(item, &profile);
            for token in tokens {
                space.insert(token);
            }
            for (key, value) in numerics {
                numeric_samples.entry(key).or_default().push(value);
            }
        }

        let mut numeric_keys: Vec<&String> = numeric_samples.keys().collect();
        numeric_keys.sort();
        for key in numeric_keys {
            let samples = &numeric_samples[key];
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            let variance =
                samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
            let mut stddev = variance.sqrt() as f32;
            if stddev == 0.0 {
                stddev = 1.0;
            }
            space.numeric_stats.insert(key.clone(), (mean as f32, stddev));
            space.insert(key.clone());
        }

        Ok(space)
    }

    /// zero-initialized vector of width `|feature_index|`, 1.0 for present
    /// tokens, `(value - mean)/stddev` for present numeric keys. Missing
    /// features are 0.
    pub fn vectorize(&self, item: &Item) -> crate::Result<Vec<f32>> {
        let mut vec = vec![0.0f32; self.width()];
        if item.category.trim().is_empty() {
            return Err(crate::Error::schema(format!(
                "item {} is missing a category",
                item.id
            )));
        }
        let profile = catalog::profile(&item.category)?;
        let (tokens, numerics) = catalog::extract_tokens_and_numerics(item, &profile);
        for token in tokens {
            if let Some(idx) = self.index_of(&token) {
                vec[idx] = 1.0;
            }
        }
        for (key, value) in numerics {
            if let (Some(idx), Some((mean, stddev))) =
                (self.index_of(&key), self.numeric_stats(&key))
            {
                vec[idx] = (value as f32 - mean) / stddev;
            }
        }
        Ok(vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemValue;

    fn pen(id: &str, vendor: &str, price: f64) -> Item {
        Item::new(id, "fountain_pens")
            .with_vendor(vendor)
            .with_price(price, price + 10.0)
            .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
            .with_field("tags", ItemValue::List(vec!["everyday".into()]))
    }

    fn movie(id: &str, studio: &str, year: f64) -> Item {
        Item::new(id, "movies")
            .with_vendor(studio)
            .with_field("studio", ItemValue::Text(studio.into()))
            .with_field("release_year", ItemValue::Number(year))
            .with_field(
                "directors",
                ItemValue::List(vec!["Greta Gerwig".into()]),
            )
    }

    #[test]
    fn build_is_deterministic_and_vectorize_preserves_width() {
        let items = vec![
            pen("p1", "Pilot", 100.0),
            pen("p2", "Lamy", 40.0),
            pen("p3", "Sailor", 220.0),
            movie("m1", "A24", 2019.0),
            movie("m2", "WB", 2023.0),
        ];
        let space_a = FeatureSpace::build(&items).unwrap();
        let space_b = FeatureSpace::build(&items).unwrap();
        assert_eq!(space_a.feature_order, space_b.feature_order);
        assert_eq!(space_a.numeric_stats.len(), space_b.numeric_stats.len());

        assert!(space_a.index_of("cat::fountain_pens::num::price_min_z").is_some());
        assert!(space_a.index_of("cat::movies::num::release_year_z").is_some());

        for item in &items {
            let v = space_a.vectorize(item).unwrap();
            assert_eq!(v.len(), space_a.width());
            assert!(v.iter().map(|x| x.abs()).sum::<f32>() > 0.0);
        }
    }

    #[test]
    fn rejects_missing_category() {
        let mut item = Item::new("bad", "");
        item.category.clear();
        let result = FeatureSpace::build(std::slice::from_ref(&item));
        assert!(result.is_err());
    }
}
