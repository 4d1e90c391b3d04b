use super::CategoryProfile;
use super::FOUNTAIN_PENS;
use super::MOVIES;
use crate::Error;
use crate::Result;

/// normalizes an incoming category name: empty/null defaults to
/// `fountain_pens`; anything unrecognized is an `Error::Validation`
/// (spec calls this `UnsupportedCategory`).
pub fn normalize(name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        None | Some("") => Ok(FOUNTAIN_PENS.to_string()),
        Some(FOUNTAIN_PENS) => Ok(FOUNTAIN_PENS.to_string()),
        Some(MOVIES) => Ok(MOVIES.to_string()),
        Some(other) => Err(Error::validation(format!(
            "unsupported category: {other}"
        ))),
    }
}

/// looks up the static profile for a normalized category name.
pub fn profile(category: &str) -> Result<CategoryProfile> {
    match category {
        FOUNTAIN_PENS => Ok(CategoryProfile::fountain_pens()),
        MOVIES => Ok(CategoryProfile::movies()),
        other => Err(Error::validation(format!(
            "unsupported category: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_empty_to_fountain_pens() {
        assert_eq!(normalize(None).unwrap(), FOUNTAIN_PENS);
        assert_eq!(normalize(Some("")).unwrap(), FOUNTAIN_PENS);
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(normalize(Some("sneakers")).is_err());
    }
}
