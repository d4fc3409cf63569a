use serde_json::Value;
use url::Url;

use crate::error::Error;

/// Where the host page currently is: path, query and fragment of its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationSnapshot {
    url: Url,
}

impl NavigationSnapshot {
    pub fn parse(href: &str) -> Result<Self, Error> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Fragment without the leading `#`, percent-decoded.
    pub fn fragment(&self) -> Option<String> {
        let raw = self.url.fragment().filter(|f| !f.is_empty())?;
        Some(
            urlencoding::decode(raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string()),
        )
    }
}

/// What the page exposes besides its URL, captured at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    pub title: String,
    /// `href`s of the links on the page.
    pub links: Vec<String>,
    /// Named page-data globals, e.g. `__INITIAL_STATE__`.
    pub embedded: Vec<(String, Value)>,
    /// Text of inline scripts.
    pub scripts: Vec<String>,
    /// Local key/value storage as raw strings.
    pub storage: Vec<(String, String)>,
}

impl PageSnapshot {
    pub fn embedded(&self, name: &str) -> Option<&Value> {
        self.embedded
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_is_decoded() {
        let nav = NavigationSnapshot::parse(
            "https://pan.quark.cn/list#/list/all/abc-%E8%AF%BE%E7%A8%8B",
        )
        .unwrap();
        assert_eq!(nav.fragment().as_deref(), Some("/list/all/abc-课程"));
        assert_eq!(nav.path(), "/list");
    }

    #[test]
    fn query_params_are_read() {
        let nav = NavigationSnapshot::parse("https://pan.quark.cn/list?pdir_fid=abcdef123&x=1").unwrap();
        assert_eq!(nav.query_param("pdir_fid").as_deref(), Some("abcdef123"));
        assert_eq!(nav.query_param("missing"), None);
        assert_eq!(nav.fragment(), None);
    }
}
