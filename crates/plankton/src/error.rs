pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("{file}: missing column `{column}`")]
    MissingColumn {
        file: &'static str,
        column: &'static str,
    },

    #[error("{file}: no usable rows")]
    Empty { file: &'static str },
}
