pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parameter `{name}` out of range: got {value}, expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("graph contains an edge with a missing endpoint: {edge_id}")]
    MissingEndpoint { edge_id: String },

    #[error("no size supplied for vertex `{vertex}`")]
    MissingVertexSize { vertex: String },

    #[error("graph does not contain vertex `{vertex}`")]
    MissingVertex { vertex: String },

    #[error("containment of vertex `{vertex}` is cyclic")]
    CyclicContainment { vertex: String },

    #[error("non-finite or negative-size input rectangle for `{owner}`")]
    NonFiniteInput { owner: String },

    #[error("unknown edge routing algorithm type: `{name}`")]
    UnknownAlgorithmType { name: String },

    #[error("layout algorithm is already running")]
    AlgorithmAlreadyRunning,

    /// Raised at a cancellation checkpoint after `abort()` was requested.
    ///
    /// This variant is control flow, not a failure: `compute()` catches it,
    /// moves the algorithm to `Aborted` and returns `Ok(())` with the partial
    /// result left in place. It never escapes to callers of `compute()`.
    #[error("layout computation was canceled")]
    Canceled,
}
