//! Anti-automation challenge detection. Detection only; nothing here tries to
//! get past a challenge.

pub const CHALLENGE_TOKENS: &[&str] = &[
    "captcha",
    "verification",
    "challenge",
    "security check",
    "unusual activity",
];

/// The first challenge token found in the URL or the rendered text.
pub fn detect_challenge(url: &str, page_text: &str) -> Option<&'static str> {
    let url = url.to_lowercase();
    let text = page_text.to_lowercase();
    CHALLENGE_TOKENS
        .iter()
        .copied()
        .find(|token| url.contains(token) || text.contains(token))
}
