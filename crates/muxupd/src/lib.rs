pub mod archive;
pub mod category;
pub mod error;
pub mod naming;
pub mod paths;
pub mod registry;
pub mod render;
pub mod session;
pub mod tree;

pub use archive::*;
pub use category::*;
pub use error::*;
pub use naming::*;
pub use paths::*;
pub use registry::*;
pub use render::*;
pub use session::*;
pub use tree::{build as build_tree, split_path, TreeNode};
