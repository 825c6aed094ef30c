//! Greeting prompt template.

/// Wish used when the user leaves the field blank.
pub const DEFAULT_WISH: &str = "Make it magical and heartwarming.";

/// Returns the user's wish, or [`DEFAULT_WISH`] when it is absent or blank.
pub fn effective_wish(wish: Option<&str>) -> &str {
    match wish.map(str::trim) {
        Some(w) if !w.is_empty() => w,
        _ => DEFAULT_WISH,
    }
}

/// Builds the instruction sent alongside the photo.
pub fn build_prompt(wish: Option<&str>) -> String {
    format!(
        "You are a festive creative assistant.\n\
         Analyze this photo. Write a warm, cheerful, and personalized Christmas or New Year \
         greeting card message that fits the vibe of the photo.\n\
         \n\
         Specific user wish: {}\n\
         \n\
         Keep it concise (2-3 sentences max) but impactful.\n\
         Return ONLY the message text.",
        effective_wish(wish)
    )
}
