use trueno_viz::output::{TerminalEncoder, TerminalMode};
use trueno_viz::plots::{LossCurve, MetricSeries};
use trueno_viz::prelude::{Rgba, WithDimensions};

use crate::error::{PipelineError, Result};
use crate::model::TrainingHistory;

const CHART_WIDTH: u32 = 96;
const CHART_HEIGHT: u32 = 32;

/// Render one 2-series epoch chart (train + validation) to a
/// terminal string. Epochs run left to right starting at 1.
fn render_chart(train: &[f32], validation: &[f32], lower_is_better: bool) -> Result<String> {
    let render_err = |message: String| PipelineError::Render(message);

    let mut curve = LossCurve::new()
        .add_series(MetricSeries::new("Training", Rgba::rgb(66, 133, 244)))
        .add_series(MetricSeries::new("Validation", Rgba::rgb(255, 128, 0)))
        .dimensions(CHART_WIDTH, CHART_HEIGHT)
        .margin(2)
        .best_markers(true)
        .lower_is_better(lower_is_better)
        .build()
        .map_err(|e| render_err(format!("{:?}", e)))?;

    for (t, v) in train.iter().zip(validation.iter()) {
        curve.push_all(&[*t, *v]);
    }

    // a series constant across every epoch gives the plot a
    // degenerate value domain; a saturated metric is still a valid
    // run, so show a note instead of aborting
    let fb = match curve.to_framebuffer() {
        Ok(fb) => fb,
        Err(_) => return Ok(String::from("(series constant across epochs; nothing to chart)")),
    };
    let encoder = TerminalEncoder::new()
        .mode(TerminalMode::UnicodeHalfBlock)
        .width(CHART_WIDTH)
        .height(CHART_HEIGHT / 2); // terminal cells are ~2:1

    Ok(encoder.render(&fb))
}

/// The two epoch charts: (loss, accuracy), each with training and
/// validation series.
pub fn render_history(history: &TrainingHistory) -> Result<(String, String)> {
    let loss_chart = render_chart(&history.loss, &history.val_loss, true)?;
    let accuracy_chart = render_chart(&history.accuracy, &history.val_accuracy, false)?;
    Ok((loss_chart, accuracy_chart))
}

/// Display both charts. Terminal-only; nothing is persisted.
pub fn print_history(history: &TrainingHistory) -> Result<()> {
    let (loss_chart, accuracy_chart) = render_history(history)?;
    println!("Training and validation loss (epochs 1..={})", history.epochs());
    println!("{}", loss_chart);
    println!(
        "Training and validation accuracy (epochs 1..={})",
        history.epochs()
    );
    println!("{}", accuracy_chart);
    Ok(())
}
