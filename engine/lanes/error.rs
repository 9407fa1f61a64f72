#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Network(#[from] network::Error),
    #[error("can't add road {road} to the vector map: {source}")]
    Map {
        road: String,
        #[source]
        source: vector_map::Error,
    },
}
