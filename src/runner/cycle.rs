//! One render cycle: source → consolidated layout → plotter → sink.

use tracing::debug;

use super::RunError;
use crate::config::PlotConfig;
use crate::render::Plotter;
use crate::smoothing::savgol;
use crate::source::DataSource;

/// Draw every Figure of `source` and emit the result through `plotter`.
///
/// Rows are consolidated groups, columns are Figures. Each subplot gets a
/// fresh color sequence.
///
/// # Errors
///
/// Propagates source and render errors; a [`crate::source::SourceError::NonNumeric`]
/// names the series the caller should exclude.
pub fn draw_cycle(
    plotter: &mut dyn Plotter,
    source: &mut DataSource,
    config: &PlotConfig,
) -> Result<(), RunError> {
    let stats = source.consolidated_stats();
    debug!(rows = stats.len(), cols = source.len(), "render cycle");

    plotter.clear_current_figure();
    plotter.create_subplot(stats.len(), source.len())?;

    let x_label = config.x_axis.as_str();
    let label_series = config.labels_series();
    for index in 0..source.len() {
        let col = index.saturating_add(1);
        let figure = source.figure(index)?;
        let title = config.figure_title(figure.title());

        for (row, group) in (1..).zip(stats.iter()) {
            plotter.target_subplot(row, col)?;
            if row == 1 {
                plotter.set_title(&title)?;
            }

            let mut colors = plotter.colors(config.no_iter_color);
            for name in &group.names {
                if !figure.scalar_names().contains(name) {
                    continue;
                }
                let Some(color) = colors.next() else {
                    debug!(series = %name, "palette exhausted; series not drawn");
                    break;
                };
                let mut series = figure.get_series(&config.x_axis, name)?;
                if let Some(factor) = config.smooth {
                    series.y = savgol(&series.y, factor, config.smooth_poly_order);
                }
                let label = label_series.then_some(name.as_str());
                if config.as_scatter {
                    plotter.scatter(&series, label, color)?;
                } else {
                    plotter.plot(&series, label, color)?;
                }
            }

            plotter.post_setup(config, x_label, &group.key, row, col)?;
        }
    }

    if config.as_raw_bytes {
        // stdout carries only the image bytes.
        let mut out = std::io::stdout().lock();
        plotter.write_image(&mut out)?;
    } else {
        plotter.clear_terminal_printed_lines()?;
        plotter.show()?;
    }
    plotter.close();
    Ok(())
}
