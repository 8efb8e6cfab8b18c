pub mod import;
pub use import::{load_catalog, parse_catalog, ImportError};

pub mod tailoring_file;
pub use tailoring_file::{load_project, load_tailoring, Project, TailoringFileError};
