//! Road network description in, vector map out.

mod config;
mod converter;

pub use crate::config::{ConversionConfig, Error as ConfigError};
pub use crate::converter::{convert, load_network, load_network_file, Error, Output};
