mod index;
mod post;

pub use self::{
    index::{AuthorResolver, BlogIndex, IndexedPost, build_index},
    post::{Author, CoverImage, PostRecord, PostTable, PreviewBlock},
};
