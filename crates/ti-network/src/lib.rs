//! ti-network: DC network model for temporal instanton analysis.
//!
//! Provides:
//! - Network data structures (buses, lines, wind farms, generators)
//! - Incremental builder with validation
//! - Assembly of the shared power-balance block and the per-line thermal block
//! - Solution layout and per-step decomposition
//!
//! # Example
//!
//! ```
//! use ti_core::units::{degc, m, s};
//! use ti_network::{NetworkBuilder, NetworkInstance, ThermalParams};
//!
//! let mut b = NetworkBuilder::new(1, s(60.0));
//! let wind = b.add_bus("wind", vec![0.0]);
//! let load = b.add_bus("load", vec![1.0]);
//! let thermal = ThermalParams { gain: 1.0, decay: 0.01, forced: degc(60.0), limit: degc(75.0) };
//! b.add_line("tie", wind, load, 0.1, m(500.0), thermal);
//! b.add_wind_farm("farm", wind, vec![1.0], 0.2);
//! b.add_generator("gen", load, 1.0, vec![0.0]);
//! let net = b.build().unwrap();
//!
//! let instance = NetworkInstance::assemble(&net);
//! assert_eq!(instance.layout.len(), 1 * (1 + 2 + 1) + 1);
//! ```

pub mod assemble;
pub mod builder;
pub mod error;
pub mod layout;
pub mod model;
pub mod thermal;
pub(crate) mod validate;

pub use assemble::NetworkInstance;
pub use builder::NetworkBuilder;
pub use error::{NetworkError, NetworkResult};
pub use layout::{InstantonProfile, SolutionLayout};
pub use model::{Bus, Generator, Line, Network, WindFarm};
pub use thermal::{ThermalParams, decay_weights};
