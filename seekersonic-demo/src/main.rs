mod cli;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    // `--hardware <asset root>` plays through the default output device,
    // otherwise the engagement runs headless on synthesized cues.
    let args: Vec<String> = std::env::args().collect();
    let mode = match args.get(1).map(String::as_str) {
        Some("--hardware") => {
            let root = args.get(2).cloned().unwrap_or_else(|| "assets".to_string());
            cli::Mode::Hardware { root }
        }
        Some(other) => anyhow::bail!("Unknown argument '{}'. Usage: seekersonic-demo [--hardware <asset root>]", other),
        None => cli::Mode::Headless,
    };

    cli::run_engagement(mode)
}
