/// File-system key for a city name: lowercased, words joined by `-`.
/// Non-ASCII letters are kept, so "Đà Lạt" becomes "đà-lạt".
pub fn city_slug(city: &str) -> String {
    let mut slug = String::with_capacity(city.len());
    for c in city.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
