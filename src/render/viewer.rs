//! Raster-in-terminal backend: PNG piped into `timg` or `kitty icat`.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::{BackendKind, PlotConfig, PlotOption};

use super::color::PlotColor;
use super::raster::RasterPlotter;
use super::scene::Scene;
use super::{check_capabilities, clear_terminal, Plotter, RenderError};

/// Options the raster-in-terminal backend cannot honor.
pub const UNSUPPORTED: [PlotOption; 3] = [
    PlotOption::TerminalWidth,
    PlotOption::TerminalHeight,
    PlotOption::Output,
];

/// A terminal image viewer that reads PNG from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// `timg -`
    Timg,
    /// `kitty +kitten icat`
    Kitty,
}

impl Viewer {
    /// Executable name.
    pub fn program(self) -> &'static str {
        match self {
            Self::Timg => "timg",
            Self::Kitty => "kitty",
        }
    }

    fn args(self) -> &'static [&'static str] {
        match self {
            Self::Timg => &["-"],
            Self::Kitty => &["+kitten", "icat"],
        }
    }

    /// First viewer found on `path` (a `PATH`-style list), preferring timg.
    pub fn detect_in(path: &OsStr) -> Option<Self> {
        [Self::Timg, Self::Kitty]
            .into_iter()
            .find(|viewer| find_program(viewer.program(), path).is_some())
    }

    /// First viewer found on the process `PATH`.
    pub fn detect() -> Option<Self> {
        Self::detect_in(&std::env::var_os("PATH")?)
    }
}

/// Full path of `program` in a `PATH`-style directory list.
pub fn find_program(program: &str, path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

/// Raster charts shown inline by a terminal image viewer.
#[derive(Debug)]
pub struct RasterTerminalPlotter {
    raster: RasterPlotter,
    viewer: Viewer,
}

impl RasterTerminalPlotter {
    /// Create the backend with the first viewer found on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnsupportedOption`] for terminal size overrides or
    /// `--output`, and [`RenderError::ViewerUnavailable`] without a viewer.
    pub fn new(config: &PlotConfig) -> Result<Self, RenderError> {
        check_capabilities(BackendKind::RasterTerminal, &UNSUPPORTED, config)?;
        let viewer = Viewer::detect().ok_or(RenderError::ViewerUnavailable)?;
        debug!(viewer = viewer.program(), "using terminal image viewer");
        Ok(Self {
            raster: RasterPlotter::unchecked(config),
            viewer,
        })
    }

    /// Viewer the PNG is piped to.
    pub fn viewer(&self) -> Viewer {
        self.viewer
    }
}

impl Plotter for RasterTerminalPlotter {
    fn kind(&self) -> BackendKind {
        BackendKind::RasterTerminal
    }

    fn scene(&self) -> &Scene {
        self.raster.scene()
    }

    fn scene_mut(&mut self) -> &mut Scene {
        self.raster.scene_mut()
    }

    fn palette(&self) -> Vec<PlotColor> {
        self.raster.palette()
    }

    fn clear_terminal_printed_lines(&mut self) -> Result<(), RenderError> {
        clear_terminal(&mut std::io::stdout())
    }

    fn show(&mut self) -> Result<(), RenderError> {
        let png = self.raster.render_png()?;
        let mut child = Command::new(self.viewer.program())
            .args(self.viewer.args())
            .stdin(Stdio::piped())
            .spawn()?;
        // Always reap the viewer, even if it stopped reading early.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Ok(()),
        };
        let status = child.wait()?;
        written?;
        if !status.success() {
            return Err(RenderError::Draw(format!(
                "{} exited with {status}",
                self.viewer.program()
            )));
        }
        Ok(())
    }

    fn write_image(&mut self, out: &mut dyn Write) -> Result<(), RenderError> {
        self.raster.write_image(out)
    }
}
