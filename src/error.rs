/// Error returned by the model builder
///
/// Every variant is a caller precondition violation: shapes, arities or indices that do not agree
/// with the static layout of the model. Nothing is reshaped, clipped or padded to recover.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ModelError {
    #[error("parameter vector has length {actual}, the component layout requires {expected}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("argnum {index} is out of range for {nparams} model parameters")]
    ArgnumOutOfRange { index: usize, nparams: usize },

    #[error("argnum {argnum} refers to a leading non-parameter argument (shift is {shift})")]
    ArgnumBeforeParameters { argnum: usize, shift: usize },

    #[error("beam of shape {beam:?} does not fit into the projected map of shape {map:?}")]
    BeamLargerThanMap {
        beam: (usize, usize),
        map: (usize, usize),
    },

    #[error("beam kernel is empty")]
    EmptyBeam,

    #[error("coordinate grid axis {0} is empty")]
    EmptyGrid(char),

    #[error("coordinate grid axis {0} is not uniformly spaced")]
    NonUniformAxis(char),

    #[error("timestream coordinates have different shapes: dx {dx:?}, dy {dy:?}")]
    CoordinateShapeMismatch { dx: Vec<usize>, dy: Vec<usize> },
}

/// Error returned by the sampler adapter
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum SamplerError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{actual} sampled parameters given, {expected} are expected")]
    SampledCount { expected: usize, actual: usize },

    #[error("frozen parameter index {index} is out of range for {nparams} model parameters")]
    FrozenIndexOutOfRange { index: usize, nparams: usize },

    #[error("frozen parameter index {0} is given more than once")]
    DuplicateFrozenIndex(usize),

    #[error("{values} frozen values given for {indices} frozen indices")]
    FrozenValuesLength { indices: usize, values: usize },

    #[error("TOD arrays have inconsistent shapes: {0}")]
    TodShapeMismatch(String),

    #[error("prior has {actual} components, {expected} sampled parameters are expected")]
    PriorLength { expected: usize, actual: usize },

    #[error("invalid noise model: {0}")]
    InvalidNoise(String),

    #[error("invalid ensemble: {0}")]
    InvalidEnsemble(String),

    #[error("MCMC driver failed: {0}")]
    Mcmc(String),

    #[error(transparent)]
    Prior(#[from] PriorError),
}

/// Error returned when a prior is constructed with invalid parameters
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum PriorError {
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("empty range [{left}, {right}]")]
    EmptyRange { left: f64, right: f64 },

    #[error("mixture prior needs at least one component")]
    EmptyMixture,
}
