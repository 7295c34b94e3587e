pub mod ln_prior;
pub mod ln_prior_1d;

pub use ln_prior::{IndComponentsLnPrior, LnPrior, NoneLnPrior};
pub use ln_prior_1d::{
    LnPrior1D, LnPrior1DTrait, LogNormalLnPrior1D, LogUniformLnPrior1D, MixLnPrior1D,
    NoneLnPrior1D, NormalLnPrior1D, UniformLnPrior1D,
};
