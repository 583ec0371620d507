/// Largest count shown verbatim on the badge.
pub const BADGE_MAX: usize = 99;

/// Badge text for an unread count: hidden at zero, verbatim up to 99,
/// `"99+"` beyond.
pub fn badge_text(unread_count: usize) -> Option<String> {
    match unread_count {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{BADGE_MAX}+")),
        n => Some(n.to_string()),
    }
}
