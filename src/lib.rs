//! termplot: plot scalar metrics in the terminal.
//!
//! Reads event-log folders, CSV tables, JSON-lines records or CSV streamed on
//! stdin, lays the series out as a grid of subplots and renders them with a
//! text, raster or raster-in-terminal backend. In follow mode the plot is
//! redrawn whenever the monitored input changes.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod logging;
pub mod smoothing;

pub mod monitor;
pub mod render;
pub mod source;

pub mod runner;
