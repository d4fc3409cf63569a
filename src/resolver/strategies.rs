//! Ways of working out the current directory id, most trustworthy first.
//!
//! Each strategy only reads the snapshots it is given. The resolver applies
//! the common plausibility filter and owns all caching.

use regex::Regex;
use serde_json::Value;

use super::snapshot::{NavigationSnapshot, PageSnapshot};

/// Id query parameter used by the list API and the page's own links.
pub const DIR_ID_PARAM: &str = "pdir_fid";
const ROOT_SENTINEL: &str = "0";
const MIN_ID_LEN: usize = 6;
const MAX_OBJECT_DEPTH: usize = 3;

const PAGE_DATA_GLOBALS: &[&str] = &["__INITIAL_STATE__", "__NEXT_DATA__", "pageData", "appData"];
const DIR_ID_FIELDS: &[&str] = &[
    "pdir_fid",
    "dir_fid",
    "fid",
    "folder_id",
    "current_dir",
    "currentDir",
];

lazy_static::lazy_static! {
    static ref ID_WITH_LABEL: Regex = Regex::new(r"^([a-zA-Z0-9]{20,})-(.+)$").unwrap();
    static ref BARE_ID: Regex = Regex::new(r"^[a-zA-Z0-9_-]{20,}$").unwrap();
    static ref LEADING_ID: Regex = Regex::new(r"^([a-zA-Z0-9]{20,})").unwrap();
    static ref ROUTE_PATTERNS: Vec<Regex> = [
        r"/list/([a-zA-Z0-9_-]{10,})",
        r"/folder/([a-zA-Z0-9_-]{10,})",
        r"/dir/([a-zA-Z0-9_-]{10,})",
        r"/([a-zA-Z0-9_-]{20,})/",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect();
    static ref SCRIPT_DIR_ID: Regex =
        Regex::new(r#"["']pdir_fid["']\s*:\s*["']([^"']+)["']"#).unwrap();
    static ref LINK_DIR_ID: Regex = Regex::new(r"[?&](?:pdir_fid|fid)=([^&#]+)").unwrap();
    static ref TITLE_ID: Regex = Regex::new(r"([A-Za-z0-9_]{20,})").unwrap();
    static ref WELL_FORMED_ID: Regex = Regex::new(r"^[a-zA-Z0-9_-]{6,}$").unwrap();
}

/// Non-empty, not the root sentinel, and long enough to be a real id.
pub fn is_plausible_id(candidate: &str) -> bool {
    let candidate = candidate.trim();
    candidate != ROOT_SENTINEL && candidate.chars().count() >= MIN_ID_LEN
}

/// Stricter charset check used on ids typed in by the operator.
pub fn is_well_formed_id(candidate: &str) -> bool {
    WELL_FORMED_ID.is_match(candidate)
}

fn plausible(candidate: Option<String>) -> Option<String> {
    candidate.filter(|id| is_plausible_id(id))
}

pub struct ResolutionContext<'a> {
    pub navigation: &'a NavigationSnapshot,
    pub page: &'a PageSnapshot,
    /// Directory id seen on the most recent list-API request since the last navigation.
    pub intercepted: Option<&'a str>,
}

pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String>;

    /// Whether a hit may be kept in the cache.
    fn cacheable(&self) -> bool {
        true
    }
}

pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![
        Box::new(InterceptedRequest),
        Box::new(LocationQuery),
        Box::new(FragmentRoute),
        Box::new(PathRoute),
        Box::new(PageData),
        Box::new(PageLinks),
        Box::new(TitleGuess),
    ]
}

pub struct InterceptedRequest;

impl ResolutionStrategy for InterceptedRequest {
    fn name(&self) -> &'static str {
        "intercepted-request"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        plausible(ctx.intercepted.map(str::to_string))
    }
}

pub struct LocationQuery;

impl ResolutionStrategy for LocationQuery {
    fn name(&self) -> &'static str {
        "location-query"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        plausible(ctx.navigation.query_param(DIR_ID_PARAM))
    }
}

/// `#/list/all/<seg>/.../<seg>`: the last segment names the current folder,
/// usually as `<id>-<label>`. Falls back to id parameters inside the fragment.
pub struct FragmentRoute;

impl ResolutionStrategy for FragmentRoute {
    fn name(&self) -> &'static str {
        "fragment-route"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        let fragment = ctx.navigation.fragment()?;
        let (route, query) = match fragment.split_once('?') {
            Some((route, query)) => (route, Some(query)),
            None => (fragment.as_str(), None),
        };

        let from_route = route
            .strip_prefix("/list/all/")
            .and_then(|segments| segments.rsplit('/').find(|seg| !seg.is_empty()))
            .and_then(extract_id_from_segment)
            .filter(|id| id.len() >= 10);
        if from_route.is_some() {
            return from_route;
        }

        let query = query?;
        ["pdir_fid", "fid", "dir"].iter().find_map(|key| {
            plausible(
                url::form_urlencoded::parse(query.as_bytes())
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| value.into_owned()),
            )
        })
    }
}

pub fn extract_id_from_segment(segment: &str) -> Option<String> {
    if let Some(caps) = ID_WITH_LABEL.captures(segment) {
        return Some(caps[1].to_string());
    }
    if BARE_ID.is_match(segment) {
        return Some(segment.to_string());
    }
    if let Ok(decoded) = urlencoding::decode(segment) {
        if decoded != segment {
            return extract_id_from_segment(&decoded);
        }
    }
    LEADING_ID
        .captures(segment)
        .map(|caps| caps[1].to_string())
}

pub struct PathRoute;

impl ResolutionStrategy for PathRoute {
    fn name(&self) -> &'static str {
        "path-route"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        let path = ctx.navigation.path();
        ROUTE_PATTERNS.iter().find_map(|pattern| {
            plausible(pattern.captures(path).map(|caps| caps[1].to_string()))
        })
    }
}

/// Page-data globals, then inline scripts, then local storage.
pub struct PageData;

impl ResolutionStrategy for PageData {
    fn name(&self) -> &'static str {
        "page-data"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        let page = ctx.page;

        let from_globals = PAGE_DATA_GLOBALS
            .iter()
            .filter_map(|name| page.embedded(name))
            .find_map(|value| find_dir_id_in_object(value, 0));
        if from_globals.is_some() {
            return from_globals;
        }

        let from_scripts = page.scripts.iter().find_map(|text| {
            plausible(SCRIPT_DIR_ID.captures(text).map(|caps| caps[1].to_string()))
        });
        if from_scripts.is_some() {
            return from_scripts;
        }

        page.storage
            .iter()
            .filter(|(key, _)| key.contains("dir") || key.contains("fid"))
            .filter_map(|(_, raw)| serde_json::from_str::<Value>(raw).ok())
            .find_map(|value| find_dir_id_in_object(&value, 0))
    }
}

/// Depth-first search for a strongly named id field, at most three levels down.
pub fn find_dir_id_in_object(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_OBJECT_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            let direct = DIR_ID_FIELDS.iter().find_map(|field| {
                map.get(*field)
                    .and_then(Value::as_str)
                    .filter(|id| *id != ROOT_SENTINEL && id.len() > 5)
                    .map(str::to_string)
            });
            direct.or_else(|| {
                map.values()
                    .find_map(|child| find_dir_id_in_object(child, depth + 1))
            })
        }
        Value::Array(items) => items
            .iter()
            .find_map(|child| find_dir_id_in_object(child, depth + 1)),
        _ => None,
    }
}

pub struct PageLinks;

impl ResolutionStrategy for PageLinks {
    fn name(&self) -> &'static str {
        "page-links"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        ctx.page.links.iter().find_map(|href| {
            plausible(LINK_DIR_ID.captures(href).map(|caps| caps[1].to_string()))
        })
    }
}

/// A long token in the page title. Low confidence, so never cached.
pub struct TitleGuess;

impl ResolutionStrategy for TitleGuess {
    fn name(&self) -> &'static str {
        "title-guess"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<String> {
        TITLE_ID
            .captures(&ctx.page.title)
            .map(|caps| caps[1].to_string())
            .filter(|id| is_well_formed_id(id))
    }

    fn cacheable(&self) -> bool {
        false
    }
}
