//! Preview resource tracking.
//!
//! Preview URLs are a platform-global resource: each one pins its blob until
//! revoked. The [`ResourceTracker`] hands out at most one URL per file and
//! revokes every URL it handed out when released or dropped.

use std::collections::HashMap;

use protocol::{FileHandle, FileId, FileSource};
use tracing::debug;
use uuid::Uuid;

/// URL scheme prefix for locally minted preview URLs.
pub const LOCAL_URL_PREFIX: &str = "blob:pandatools/";

/// Platform facility that mints and revokes dereferenceable preview URLs.
pub trait ObjectUrls {
    /// Creates a URL for `file`. Local file handles always succeed.
    fn create(&mut self, file: &FileHandle) -> String;

    /// Revokes a URL previously returned by [`ObjectUrls::create`].
    fn revoke(&mut self, url: &str);
}

/// In-process URL registry used outside the browser.
///
/// Minted URLs resolve back to the file's source until revoked.
#[derive(Debug, Default)]
pub struct LocalObjectUrls {
    live: HashMap<String, FileSource>,
}

impl LocalObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a live URL to the blob it points at.
    pub fn resolve(&self, url: &str) -> Option<&FileSource> {
        self.live.get(url)
    }

    /// Number of URLs minted and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl ObjectUrls for LocalObjectUrls {
    fn create(&mut self, file: &FileHandle) -> String {
        let url = format!("{LOCAL_URL_PREFIX}{}", Uuid::new_v4());
        self.live.insert(url.clone(), file.source().clone());
        url
    }

    fn revoke(&mut self, url: &str) {
        self.live.remove(url);
    }
}

/// Owns the preview URLs of one viewer session.
#[derive(Debug)]
pub struct ResourceTracker<U: ObjectUrls = LocalObjectUrls> {
    urls: U,
    records: HashMap<FileId, String>,
}

impl<U: ObjectUrls> ResourceTracker<U> {
    pub fn new(urls: U) -> Self {
        Self {
            urls,
            records: HashMap::new(),
        }
    }

    /// Returns the URL for `file`, creating it on first use.
    ///
    /// The same file yields the same URL until [`release_all`](Self::release_all).
    pub fn acquire(&mut self, file: &FileHandle) -> String {
        if let Some(url) = self.records.get(&file.id()) {
            return url.clone();
        }
        let url = self.urls.create(file);
        debug!(file = %file.name(), url = %url, "Created preview resource");
        self.records.insert(file.id(), url.clone());
        url
    }

    /// The URL already held for `file`, without creating one.
    pub fn get(&self, file: &FileHandle) -> Option<&str> {
        self.records.get(&file.id()).map(String::as_str)
    }

    /// Revokes every tracked URL. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let released = self.records.len();
        for (_, url) in self.records.drain() {
            self.urls.revoke(&url);
        }
        if released > 0 {
            debug!(released, "Released preview resources");
        }
        released
    }

    /// Number of URLs currently tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The underlying URL facility.
    pub fn urls(&self) -> &U {
        &self.urls
    }
}

impl<U: ObjectUrls> Drop for ResourceTracker<U> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn image(name: &str) -> FileHandle {
        FileHandle::from_bytes(name, "image/png", vec![0u8; 16])
    }

    /// Records create/revoke calls so tests can check balance after drop.
    #[derive(Clone, Default)]
    struct CountingUrls {
        log: Rc<RefCell<(usize, usize)>>,
    }

    impl ObjectUrls for CountingUrls {
        fn create(&mut self, file: &FileHandle) -> String {
            self.log.borrow_mut().0 += 1;
            format!("test:{}", file.id())
        }

        fn revoke(&mut self, _url: &str) {
            self.log.borrow_mut().1 += 1;
        }
    }

    #[test]
    fn test_acquire_is_idempotent_per_file() {
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let file = image("a.png");

        let first = tracker.acquire(&file);
        let second = tracker.acquire(&file);

        assert_eq!(first, second);
        assert!(first.starts_with(LOCAL_URL_PREFIX));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.urls().live_count(), 1);
    }

    #[test]
    fn test_same_name_files_get_distinct_urls() {
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let a = image("dup.png");
        let b = image("dup.png");

        assert_ne!(tracker.acquire(&a), tracker.acquire(&b));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_release_all_balances() {
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let files: Vec<_> = (0..5).map(|i| image(&format!("{i}.png"))).collect();
        for file in files.iter().chain(files.iter()) {
            tracker.acquire(file);
        }

        assert_eq!(tracker.release_all(), 5);
        assert!(tracker.is_empty());
        assert_eq!(tracker.urls().live_count(), 0);
        assert_eq!(tracker.release_all(), 0);
    }

    #[test]
    fn test_url_changes_after_release() {
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let file = image("a.png");
        let before = tracker.acquire(&file);
        tracker.release_all();
        let after = tracker.acquire(&file);
        assert_ne!(before, after);
        assert!(tracker.urls().resolve(&before).is_none());
        assert!(tracker.urls().resolve(&after).is_some());
    }

    #[test]
    fn test_get_does_not_create() {
        let mut tracker = ResourceTracker::new(LocalObjectUrls::new());
        let file = image("a.png");
        assert!(tracker.get(&file).is_none());
        let url = tracker.acquire(&file);
        assert_eq!(tracker.get(&file), Some(url.as_str()));
    }

    #[test]
    fn test_drop_revokes_everything() {
        let urls = CountingUrls::default();
        let log = Rc::clone(&urls.log);
        {
            let mut tracker = ResourceTracker::new(urls);
            tracker.acquire(&image("a.png"));
            tracker.acquire(&image("b.png"));
        }
        assert_eq!(*log.borrow(), (2, 2));
    }
}
