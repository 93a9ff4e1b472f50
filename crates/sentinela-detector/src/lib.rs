/*!
 * Sentinela Detector
 *
 * Motor de detecção que classifica transações pendentes quanto ao risco de
 * exploração MEV (front-running, sandwich, disputa anormal de gás) antes de
 * serem mineradas.
 */

mod analysis;
mod alert;
mod clock;
mod config;
mod decoder;
mod engine;
mod feed;
mod gas_window;
mod impact;
mod oracle;
mod risk;
mod sandwich_buffer;
mod sinks;
pub mod traits;

pub use analysis::*;
pub use alert::*;
pub use clock::*;
pub use config::*;
pub use decoder::*;
pub use engine::*;
pub use feed::*;
pub use gas_window::*;
pub use impact::*;
pub use oracle::*;
pub use risk::*;
pub use sandwich_buffer::*;
pub use sinks::*;
pub use traits::*;
