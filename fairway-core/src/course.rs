//! Club → course → hole data and the user's selection within it.

pub mod model;
pub mod resolver;
pub mod source;

pub use model::{Club, Course, Dataset, Hole};
pub use resolver::{CourseResolver, DatasetOrigin, LoadReport, Selection};
pub use source::{DatasetSource, EmbeddedSource, FileSource, HttpSource, source_from_location};
