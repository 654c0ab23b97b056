use anyhow::{Context, Result};
use clap::Parser;
use memesmith::cli::ProviderOptions;
use memesmith::config::setup_logging;
use memesmith::models::{ApiKeys, GenerationRequest, HumorStyle};
use std::path::PathBuf;

/// Make one meme from the command line.
///
///   generate_meme "forgetting my own name during a math exam" --style absurd
#[derive(Parser, Debug)]
#[command(name = "generate_meme")]
#[command(about = "Generate a captioned meme for a topic and save it as PNG")]
struct Args {
    /// What the meme is about
    topic: String,

    /// Humor style
    #[arg(long, value_enum, default_value = "sarcastic")]
    style: HumorStyle,

    /// Groq API key for captions
    #[arg(required = true, long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: String,

    /// Stability AI API key for backgrounds
    #[arg(required = true, long, env = "STABILITY_API_KEY", hide_env_values = true)]
    stability_api_key: String,

    #[command(flatten)]
    providers: ProviderOptions,

    /// Where to write the PNG
    #[arg(long, short, default_value = "meme.png")]
    out: PathBuf,

    /// Replace the output file if it exists
    #[arg(long)]
    force: bool,

    /// Debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| *err)?;

    let request = GenerationRequest::new(&args.topic, args.style)?;
    let keys = ApiKeys::new(&args.groq_api_key, &args.stability_api_key);
    let pipeline = args.providers.build_pipeline()?;

    let generation = pipeline
        .generate(&keys, &request)
        .await
        .context("Meme generation failed")?;

    let caption = generation.caption();
    eprintln!("{}", caption.setup);
    if !caption.punchline.is_empty() {
        eprintln!("{}", caption.punchline);
    }
    generation.write_png(&args.out, args.force)?;
    eprintln!("Saved: {}", args.out.display());
    Ok(())
}
