//! Course backend client: load a course document, save the edited content
//! tree and learn which persisted ids replaced the temporary ones.

pub mod http;
pub mod store;

pub use http::HttpCourseStore;
pub use store::{CourseStore, StoreError};
