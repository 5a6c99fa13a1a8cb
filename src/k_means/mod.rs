mod algorithm;
mod engine;
mod errors;
mod hyperparams;
mod init;
mod state;

pub use algorithm::*;
pub use engine::*;
pub use errors::*;
pub use hyperparams::*;
pub use init::*;
