//! Shared range-validation helpers used by all domain validators.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error unless `url` uses one of the `schemes`.
pub(crate) fn validate_scheme(errors: &mut Vec<String>, name: &str, url: &str, schemes: &[&str]) {
    let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
    let host_present = url
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.trim().is_empty());

    match scheme {
        Some(s) if schemes.contains(&s.as_str()) && host_present => {}
        _ => errors.push(format!(
            "{name} = {url:?} must be a {} URL",
            schemes.join("/")
        )),
    }
}
