//! The read interface shared by the plain and cached post sources

use indexmap::{IndexMap, IndexSet};

use super::{ContentError, Post, PostMeta};

/// Posts grouped by tag; tags keep their first-seen order in the post list
pub type TagIndex = IndexMap<String, Vec<PostMeta>>;

/// A source of posts.
///
/// `list_posts` is newest first. The tag operations are projections over it
/// and only need overriding when a source can answer them more cheaply.
pub trait PostStore: Send + Sync {
    /// All posts, sorted by date descending
    fn list_posts(&self) -> Result<Vec<PostMeta>, ContentError>;

    /// One post with its body
    fn get_post(&self, slug: &str) -> Result<Post, ContentError>;

    /// Distinct tags across all posts
    fn list_tags(&self) -> Result<Vec<String>, ContentError> {
        Ok(collect_tags(&self.list_posts()?))
    }

    /// The posts carrying `tag`, in list order
    fn posts_by_tag(&self, tag: &str) -> Result<Vec<PostMeta>, ContentError> {
        Ok(filter_by_tag(self.list_posts()?, tag))
    }

    fn tag_index(&self) -> Result<TagIndex, ContentError> {
        Ok(build_tag_index(&self.list_posts()?))
    }
}

pub fn collect_tags(posts: &[PostMeta]) -> Vec<String> {
    let tags: IndexSet<&String> = posts.iter().flat_map(|p| &p.tags).collect();
    tags.into_iter().cloned().collect()
}

pub fn filter_by_tag(posts: Vec<PostMeta>, tag: &str) -> Vec<PostMeta> {
    posts.into_iter().filter(|p| p.has_tag(tag)).collect()
}

pub fn build_tag_index(posts: &[PostMeta]) -> TagIndex {
    let mut index = TagIndex::new();
    for post in posts {
        for tag in &post.tags {
            index.entry(tag.clone()).or_default().push(post.clone());
        }
    }
    index
}
