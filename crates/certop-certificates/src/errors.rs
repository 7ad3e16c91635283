use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to keep archive file: {0}")]
    Persist(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),
}
