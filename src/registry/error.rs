/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("path already exists: {0}")]
    DuplicatePath(String),

    #[error("path not found: {0}")]
    PathNotFound(String),
}
