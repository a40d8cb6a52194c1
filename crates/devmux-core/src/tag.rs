//! Window title tagging.
//!
//! tmux rewrites the outer terminal's title from `set-titles-string`, so a
//! session whose string starts with `[devmux:<name>]` stamps every OS window
//! showing it. Discovery only needs substring containment of that prefix.

/// Opening marker of a tag.
pub const TAG_OPEN: &str = "[devmux:";

/// The bracketed tag identifying `session` in a window title.
pub fn window_tag(session: &str) -> String {
    format!("{TAG_OPEN}{session}]")
}

/// Value for tmux `set-titles-string`. `#{pane_title}` keeps the rest of the
/// title live as the active pane's title changes.
pub fn title_format(session: &str) -> String {
    format!("{} #{{pane_title}}", window_tag(session))
}

/// Whether a window title carries the tag for `session`.
pub fn title_matches(title: &str, session: &str) -> bool {
    title.contains(&window_tag(session))
}

/// Extract the session name from the first tag in `title`, if any.
pub fn parse_tag(title: &str) -> Option<&str> {
    let start = title.find(TAG_OPEN)? + TAG_OPEN.len();
    let rest = &title[start..];
    let end = rest.find(']')?;
    let name = &rest[..end];
    if name.is_empty() { None } else { Some(name) }
}
