use super::CategoryProfile;
use super::Item;
use std::collections::BTreeMap;

/// lowercase, `/` -> space, `&` -> "and", collapse whitespace (spec §4.1).
pub fn slug(raw: &str) -> String {
    let lower = raw.to_lowercase().replace('/', " ").replace('&', "and");
    lower.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// categorical fields emit zero or one `cat::` token; multi-valued fields
/// emit one `multi::` token per element; `options` emits
/// `multi::option::<opt>|<val>` tokens; numeric fields feed the numeric
/// bucket. Conversion failures for numeric fields are silently dropped.
pub fn extract_tokens_and_numerics(
    item: &Item,
    profile: &CategoryProfile,
) -> (Vec<String>, BTreeMap<String, f64>) {
    let mut tokens = Vec::new();
    let mut numerics = BTreeMap::new();

    for field in &profile.categorical_fields {
        if let Some(value) = item.field_value(field) {
            if let Some(text) = value.as_text() {
                let slugged = slug(text);
                if !slugged.is_empty() {
                    tokens.push(format!(
                        "cat::{}::cat::{}::{}",
                        profile.id, field, slugged
                    ));
                }
            }
        }
    }

    for field in &profile.multi_fields {
        if *field == "options" {
            if let Some(options) = item.field_value(field).and_then(|v| v.as_options().cloned()) {
                for (opt, values) in options {
                    for val in values {
                        tokens.push(format!(
                            "cat::{}::multi::option::{}|{}",
                            profile.id,
                            slug(&opt),
                            slug(&val)
                        ));
                    }
                }
            }
            continue;
        }
        if let Some(values) = item.field_value(field).and_then(|v| v.as_list().map(|s| s.to_vec())) {
            for val in values {
                let slugged = slug(&val);
                if !slugged.is_empty() {
                    tokens.push(format!(
                        "cat::{}::multi::{}::{}",
                        profile.id, field, slugged
                    ));
                }
            }
        }
    }

    for field in &profile.numeric_fields {
        if let Some(value) = item.field_value(field).and_then(|v| v.as_number()) {
            numerics.insert(format!("cat::{}::num::{}_z", profile.id, field), value);
        }
    }

    (tokens, numerics)
}

/// human-readable label for a feature key, or `None` if it is in the
/// profile's redundant set.
pub fn humanize_feature(key: &str, profile: &CategoryProfile) -> Option<String> {
    if profile.redundant_tokens.contains(key) {
        return None;
    }
    let parts: Vec<&str> = key.split("::").collect();
    match parts.as_slice() {
        ["cat", _, "cat", field, slug] => Some(format!("{}: {}", titlecase(field), titlecase(slug))),
        ["cat", _, "multi", "option", rest] => {
            let mut kv = rest.splitn(2, '|');
            let opt = kv.next().unwrap_or_default();
            let val = kv.next().unwrap_or_default();
            Some(format!("{}: {}", titlecase(opt), titlecase(val)))
        }
        ["cat", _, "multi", field, slug] => Some(format!("{}: {}", titlecase(field), titlecase(slug))),
        ["cat", _, "num", field] => Some(titlecase(field.trim_end_matches("_z"))),
        _ => Some(key.to_string()),
    }
}

/// label for a numeric preference dimension given the sign of its weight.
pub fn numeric_preference_label(key: &str, sign: f32) -> String {
    if key.ends_with("price_min_z") || key.ends_with("price_max_z") {
        return if sign >= 0.0 {
            "Higher Price Range".to_string()
        } else {
            "Lower Price Range".to_string()
        };
    }
    let field = key
        .rsplit("::")
        .next()
        .unwrap_or(key)
        .trim_end_matches("_z");
    let direction = if sign >= 0.0 { "Higher" } else { "Lower" };
    format!("{} {}", direction, titlecase(field))
}

fn titlecase(s: &str) -> String {
    s.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemValue;

    #[test]
    fn slugs_and_collapses() {
        assert_eq!(slug("Rock & Roll / Blues"), "rock and roll blues");
    }

    #[test]
    fn extracts_categorical_multi_and_numeric() {
        let profile = CategoryProfile::fountain_pens();
        let item = Item::new("p1", "fountain_pens")
            .with_vendor("Pilot")
            .with_price(120.0, 150.0)
            .with_field("product_type", ItemValue::Text("Fountain Pen".into()))
            .with_field(
                "tags",
                ItemValue::List(vec!["everyday carry".into(), "gold nib".into()]),
            );
        let (tokens, numerics) = extract_tokens_and_numerics(&item, &profile);
        assert!(tokens.contains(&"cat::fountain_pens::cat::vendor::pilot".to_string()));
        assert!(tokens.contains(&"cat::fountain_pens::multi::tags::gold nib".to_string()));
        assert_eq!(numerics["cat::fountain_pens::num::price_min_z"], 120.0);
    }
}
