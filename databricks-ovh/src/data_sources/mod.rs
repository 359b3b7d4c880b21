pub mod workspaces;

pub use workspaces::WorkspacesDataSource;
