use thiserror::Error;

#[derive(Debug, Error)]
pub enum ItemsError {
    #[error("failed to read asset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid asset file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },
    #[error("unknown item flag '{flag}' on item {item}")]
    UnknownFlag { item: u16, flag: String },
    #[error("sprite {sprite} declares neither images nor first_image")]
    MissingImages { sprite: u16 },
}
