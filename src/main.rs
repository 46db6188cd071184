use review_topics::network::HttpFetcher;
use review_topics::ops::telemetry;
use review_topics::{PipelineConfig, ReviewTopicPipeline};
use std::path::PathBuf;
use std::process::ExitCode;

// * review-topics <config.json> <job-name> [output-dir]
#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <config.json> <job-name> [output-dir]", args[0]);
        return ExitCode::from(2);
    }

    match run(&args[1], &args[2], args.get(3).map(PathBuf::from)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    config_path: &str,
    job_name: &str,
    output_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::from_file(config_path)?;
    let fetcher = HttpFetcher::with_timeout(config.scrape.page_timeout())?;
    let pipeline = ReviewTopicPipeline::from_config(fetcher, &config)?;

    let result = pipeline.run(job_name).await?;

    let dir = output_dir.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let html_path = dir.join(format!("{}.html", job_name));
    let png_path = dir.join(format!("{}.png", job_name));
    std::fs::write(&html_path, &result.visualization_html)?;
    std::fs::write(&png_path, result.word_cloud_png())?;

    tracing::info!(
        job = job_name,
        records = result.records.len(),
        topics = result.selection.best.topic_count,
        html = %html_path.display(),
        png = %png_path.display(),
        "Artifacts written"
    );

    Ok(())
}
