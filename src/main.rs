use imdb_sentiment::config::Config;
use imdb_sentiment::pipeline;

/// One-shot training run with the tutorial's fixed hyperparameters.
/// Expects the corpus files under `data/`; any failure aborts.
fn main() {
    tracing_subscriber::fmt::init();
    println!("imdb_sentiment {}", env!("CARGO_PKG_VERSION"));

    let cfg = Config::default();
    match pipeline::run(&cfg) {
        Ok(outcome) => {
            println!(
                "[test loss: {:.4}, test accuracy: {:.4}]",
                outcome.evaluation.loss, outcome.evaluation.accuracy
            );
        }
        Err(e) => {
            eprintln!("run failed: {}", e);
            std::process::exit(1);
        }
    }
}
