use std::collections::HashSet;

pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "3gp", "rmvb", "rm", "asf", "divx",
    "vob", "ts", "m2ts", "mts", "f4v", "ogv", "mpg", "mpeg",
];

/// Suffix after the last dot, lowercased, when it is 1-4 ASCII alphanumerics.
pub fn recognizable_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 4 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Fallback used when neither the listing nor the page says what an entry is.
pub fn looks_like_directory(name: &str) -> bool {
    !name.is_empty() && recognizable_extension(name).is_none()
}

#[derive(Debug, Clone)]
pub struct MediaFilter {
    extensions: HashSet<String>,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_EXTENSIONS.iter().copied())
    }
}

impl MediaFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// The lowercase media extension of `name`, if it has one.
    pub fn media_extension(&self, name: &str) -> Option<String> {
        recognizable_extension(name).filter(|ext| self.extensions.contains(ext))
    }

    pub fn is_media(&self, name: &str) -> bool {
        self.media_extension(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_case_insensitive() {
        let filter = MediaFilter::default();
        assert_eq!(filter.media_extension("clip.MKV").as_deref(), Some("mkv"));
        assert!(filter.is_media("video.mp4"));
        assert!(!filter.is_media("notes.txt"));
    }

    #[test]
    fn extension_must_be_short_alphanumeric() {
        assert_eq!(recognizable_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(recognizable_extension("Season 1.final_cut"), None);
        assert_eq!(recognizable_extension("noext"), None);
        assert_eq!(recognizable_extension("trailing."), None);
        assert_eq!(recognizable_extension("v1.2 - part.final"), None);
        assert_eq!(recognizable_extension(".mp4").as_deref(), Some("mp4"));
    }

    #[test]
    fn folder_heuristic() {
        assert!(looks_like_directory("S1"));
        assert!(looks_like_directory("第一章 基础"));
        assert!(!looks_like_directory("ep1.mp4"));
        assert!(!looks_like_directory(""));
    }

    #[test]
    fn custom_extension_set() {
        let filter = MediaFilter::new([".MP3", "flac"]);
        assert!(filter.is_media("song.mp3"));
        assert!(filter.is_media("song.FLAC"));
        assert!(!filter.is_media("video.mp4"));
    }
}
