use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Notice bodies and other rich-text fields arrive from faculty/admin forms
/// and are rendered back into every user's dashboard, so they go through
/// whitelist-based sanitization: safe tags (like <b>, <p>) survive, dangerous
/// tags (like <script>, <iframe>) and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
