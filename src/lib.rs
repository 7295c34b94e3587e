#![doc = include_str!("../README.md")]


pub mod beam;
pub use beam::{DoubleGaussianBeam, pad_beam};

mod config;
pub use config::{GaussianPlacement, ModelOptions, ObservationConfig};

mod error;
pub use error::{ModelError, PriorError, SamplerError};

pub mod fft;
pub use fft::ConvolutionPlan;

mod float_trait;
pub use float_trait::{Dual64, LikeFloat};

mod grad;
pub use grad::{ArgnumShift, Argnums, MODEL_LEADING_ARGS, MODEL_TOD_LEADING_ARGS};

mod grid;
pub use grid::{CoordinateGrid, arange};

pub mod interp;
pub use interp::bilinear;

mod layout;
pub use layout::{ComponentCounts, ParameterBlock, ParameterLayout};

mod model;
pub use model::Model;

pub mod profiles;
pub use profiles::ComponentKind;

pub mod sampler;
pub use sampler::prior;
pub use sampler::{
    EnsembleMcmc, FrozenParameters, Likelihood, LnPrior, LnPrior1D, McmcChain, NoiseModel,
    Posterior, TodContext, WhiteNoise,
};

pub mod units;
pub use units::{Cosmology, dz_factor, y_to_k_rj};

pub use ndarray;
