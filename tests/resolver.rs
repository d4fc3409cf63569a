use std::sync::Mutex;
use std::time::Duration;

use pan_renumber::host::{seed_roots, HostPage, PageEntry, SnapshotPage};
use pan_renumber::resolver::{NavigationSnapshot, PageSnapshot};
use pan_renumber::DirectoryResolver;

/// Host page whose location can be changed between calls.
struct MovingPage {
    href: Mutex<String>,
}

impl MovingPage {
    fn at(href: &str) -> Self {
        Self {
            href: Mutex::new(href.to_string()),
        }
    }

    fn go(&self, href: &str) {
        *self.href.lock().unwrap() = href.to_string();
    }
}

impl HostPage for MovingPage {
    fn visible_rows(&self) -> Vec<PageEntry> {
        Vec::new()
    }

    fn navigation(&self) -> NavigationSnapshot {
        NavigationSnapshot::parse(&self.href.lock().unwrap()).unwrap()
    }

    fn page_snapshot(&self) -> PageSnapshot {
        PageSnapshot::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_follow_navigation_waits_then_resolves_new_folder() {
    let host = MovingPage::at("https://pan.quark.cn/list?pdir_fid=first-folder-1");
    let mut resolver = DirectoryResolver::default();
    assert_eq!(resolver.resolve_on(&host).unwrap().id, "first-folder-1");

    assert_eq!(resolver.follow_navigation(&host).await, None);

    host.go("https://pan.quark.cn/list?pdir_fid=second-folder-2");
    let started = tokio::time::Instant::now();
    let resolution = resolver.follow_navigation(&host).await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_millis(500));
    assert_eq!(resolution.id, "second-folder-2");
    assert_eq!(resolution.source, "location-query");
}

#[tokio::test(start_paused = true)]
async fn test_cache_short_circuits_until_ttl() {
    let host = MovingPage::at("https://pan.quark.cn/list?pdir_fid=cached-folder-1");
    let mut resolver = DirectoryResolver::default();

    assert_eq!(resolver.resolve_on(&host).unwrap().source, "location-query");
    assert_eq!(resolver.resolve_on(&host).unwrap().source, "cache");

    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(resolver.cached().is_none());
    assert_eq!(resolver.resolve_on(&host).unwrap().source, "location-query");
}

#[test]
fn test_snapshot_capture_resolves_and_seeds() {
    let page = SnapshotPage::from_json(
        r#"{
            "url": "https://pan.quark.cn/list#/list/all/3b87ad5151a84f63bcfa219e25519a3e-Courses",
            "title": "Courses - Quark",
            "rows": [
                {"row_key": "f1", "name": "video.mp4", "is_directory": false},
                {"row_key": "d1", "name": "S1"}
            ],
            "requests": []
        }"#,
    )
    .unwrap();

    let mut resolver = DirectoryResolver::default();
    let resolution = resolver.resolve_on(&page).unwrap();
    assert_eq!(resolution.id, "3b87ad5151a84f63bcfa219e25519a3e");
    assert_eq!(resolution.source, "fragment-route");

    let roots = seed_roots(&page);
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[1].id, "d1");
    assert!(roots[1].is_directory);
}
