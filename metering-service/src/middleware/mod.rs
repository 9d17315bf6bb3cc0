pub mod subject;

pub use subject::{Role, SubjectContext};
