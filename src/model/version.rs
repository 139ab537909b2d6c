//! Current-version label derived from a page's downloadable files
//!
//! Pages rarely state a version explicitly, so the label is guessed from
//! file names. Files are searched by platform precedence (Windows builds,
//! then any other non-Android build, then Android packages) and the first
//! file carrying a version token wins. Without a token anywhere, the first
//! listed file's raw name is the label.
//!
//! The heuristic is best effort: names with several version-like
//! substrings resolve to the leftmost one.

use super::record::{Downloadable, Platform};
use regex_lite::Regex;
use std::sync::OnceLock;

/// `1.2`, `v0.4.1`, `0_9` (underscore-separated), preceded by a non-alphanumeric char
fn dotted_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^a-z0-9])v?(\d+(?:[._]\d+)+)").expect("static regex")
    })
}

/// `v12` on its own
fn bare_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:^|[^a-z0-9])v(\d+)(?:[^0-9]|$)").expect("static regex"))
}

/// Extract a normalized version token (`v1.2.3`) from one file name.
pub fn version_token(file_name: &str) -> Option<String> {
    if let Some(caps) = dotted_version().captures(file_name) {
        return Some(format!("v{}", caps[1].replace('_', ".")));
    }
    bare_version()
        .captures(file_name)
        .map(|caps| format!("v{}", &caps[1]))
}

fn precedence(platform: Platform) -> u8 {
    match platform {
        Platform::Windows => 0,
        Platform::Android => 2,
        _ => 1,
    }
}

/// Derive the current-version label for a list of downloadables.
///
/// Returns `None` when the page lists no files (browser-only games).
pub fn current_version_label(files: &[Downloadable]) -> Option<String> {
    let first = files.first()?;

    let mut ordered: Vec<&Downloadable> = files.iter().collect();
    // stable: listing order is kept inside each precedence group
    ordered.sort_by_key(|file| precedence(file.platform));

    ordered
        .iter()
        .find_map(|file| version_token(&file.name))
        .or_else(|| Some(first.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, platform: Platform) -> Downloadable {
        Downloadable::new(name, platform, "1 MB")
    }

    #[test]
    fn tokens_from_common_file_names() {
        assert_eq!(version_token("MyGame-1.2.3-win.zip").as_deref(), Some("v1.2.3"));
        assert_eq!(version_token("game_v0_4_win.zip").as_deref(), Some("v0.4"));
        assert_eq!(version_token("proto-v12-linux.tar.gz").as_deref(), Some("v12"));
        assert_eq!(version_token("game_x64_1.0.zip").as_deref(), Some("v1.0"));
        assert_eq!(version_token("Game.zip"), None);
        assert_eq!(version_token("game-win64.zip"), None);
    }

    #[test]
    fn windows_build_wins() {
        let files = vec![
            file("g-1.1-linux.tar.gz", Platform::Linux),
            file("g-1.2-win.zip", Platform::Windows),
        ];
        assert_eq!(current_version_label(&files).as_deref(), Some("v1.2"));
    }

    #[test]
    fn non_android_before_android() {
        let files = vec![
            file("g-2.0.apk", Platform::Android),
            file("g-1.9-linux.tar.gz", Platform::Linux),
        ];
        assert_eq!(current_version_label(&files).as_deref(), Some("v1.9"));
    }

    #[test]
    fn android_only() {
        let files = vec![file("g-2.0.apk", Platform::Android)];
        assert_eq!(current_version_label(&files).as_deref(), Some("v2.0"));
    }

    #[test]
    fn windows_without_token_falls_through() {
        let files = vec![
            file("game.zip", Platform::Windows),
            file("game-0.3-mac.zip", Platform::MacOs),
        ];
        assert_eq!(current_version_label(&files).as_deref(), Some("v0.3"));
    }

    #[test]
    fn falls_back_to_first_raw_name() {
        let files = vec![
            file("game-mac.zip", Platform::MacOs),
            file("game.zip", Platform::Windows),
        ];
        assert_eq!(current_version_label(&files).as_deref(), Some("game-mac.zip"));
    }

    #[test]
    fn no_files_no_label() {
        assert_eq!(current_version_label(&[]), None);
    }
}
