/// The categories a blog may be filed under.
pub const CATEGORIES: [&str; 3] = ["Career", "Finance", "Travel"];

/// Image file extensions accepted in image URLs.
const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Checks that a string is an `http(s)://` URL that names an image file.
///
/// The extension may be followed by a query string or fragment.
pub fn is_image_url(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    let rest = match lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };

    IMAGE_EXTENSIONS.iter().any(|ext| rest.contains(ext))
}

/// Rejects an optional image URL that is present but not an image URL.
///
/// # Arguments
///
/// * `value` - The optional URL.
/// * `_ctx` - The garde context (unused).
pub fn image_url(value: &Option<String>, _ctx: &()) -> garde::Result {
    match value.as_deref() {
        Some(url) if !url.trim().is_empty() && !is_image_url(url) => Err(garde::Error::new(
            "Invalid image URL (must be a PNG, JPG, JPEG, GIF, SVG, or WEBP URL)",
        )),
        _ => Ok(()),
    }
}

/// Rejects a category outside `CATEGORIES`.
pub fn known_category(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("Category is required"));
    }

    if !CATEGORIES.contains(&value) {
        return Err(garde::Error::new("Invalid category"));
    }

    Ok(())
}

/// Rejects empty or whitespace-only text.
pub fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("This field is required"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_urls() {
        assert!(is_image_url("https://example.com/cat.png"));
        assert!(is_image_url("http://cdn.example.com/a/b/photo.JPEG?w=200"));
        assert!(is_image_url("https://example.com/vector.svg#frag"));
    }

    #[test]
    fn rejects_non_image_urls() {
        assert!(!is_image_url("ftp://example.com/cat.png"));
        assert!(!is_image_url("https://example.com/page.html"));
        assert!(!is_image_url("cat.png"));
    }

    #[test]
    fn category_must_be_known() {
        assert!(known_category("Travel", &()).is_ok());
        assert!(known_category("travel", &()).is_err());
        assert!(known_category("", &()).is_err());
    }

    #[test]
    fn empty_optional_image_is_fine() {
        assert!(image_url(&None, &()).is_ok());
        assert!(image_url(&Some(String::new()), &()).is_ok());
        assert!(image_url(&Some("not a url".to_string()), &()).is_err());
    }
}
