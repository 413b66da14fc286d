//! In-memory cache in front of a post source
//!
//! The server only wraps its repository in a [`CachedStore`] when asked to.
//! Nothing expires on its own: the directory watcher calls
//! [`CachedStore::invalidate`] whenever the posts change.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::content::{ContentError, Post, PostMeta, PostStore};

#[derive(Debug, Default)]
struct Memo {
    /// Bumped on every invalidation; reads that started earlier are not stored
    generation: u64,
    listing: Option<Vec<PostMeta>>,
    posts: HashMap<String, Post>,
}

/// Memoizes listings and parsed posts of the wrapped store
pub struct CachedStore<S> {
    inner: S,
    memo: RwLock<Memo>,
}

impl<S: PostStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            memo: RwLock::new(Memo::default()),
        }
    }

    /// Forget everything read so far
    pub fn invalidate(&self) {
        let mut memo = self.write();
        memo.generation = memo.generation.wrapping_add(1);
        memo.listing = None;
        memo.posts.clear();
        tracing::debug!("Post cache invalidated");
    }

    // A panic while holding the lock leaves the memo in a consistent state,
    // so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Memo> {
        self.memo.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Memo> {
        self.memo.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: PostStore> PostStore for CachedStore<S> {
    fn list_posts(&self) -> Result<Vec<PostMeta>, ContentError> {
        let generation = {
            let memo = self.read();
            if let Some(listing) = &memo.listing {
                return Ok(listing.clone());
            }
            memo.generation
        };

        let listing = self.inner.list_posts()?;
        let mut memo = self.write();
        if memo.generation == generation {
            memo.listing = Some(listing.clone());
        }
        Ok(listing)
    }

    fn get_post(&self, slug: &str) -> Result<Post, ContentError> {
        let generation = {
            let memo = self.read();
            if let Some(post) = memo.posts.get(slug) {
                return Ok(post.clone());
            }
            memo.generation
        };

        let post = self.inner.get_post(slug)?;
        let mut memo = self.write();
        if memo.generation == generation {
            memo.posts.insert(slug.to_string(), post.clone());
        }
        Ok(post)
    }
}
