use ammonia;

/// Clean user-supplied HTML (profile bios) using the ammonia library.
///
/// Whitelist based: safe inline tags (like <b>, <em>) survive, dangerous
/// tags (like <script>, <iframe>) are removed together with their content,
/// and event-handler attributes (like onclick) are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
