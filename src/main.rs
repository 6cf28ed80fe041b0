use anyhow::Context;
use clap::Parser;
use post_aggregator::domain::model::Post;
use post_aggregator::utils::error::{AggregatorError, ErrorSeverity};
use post_aggregator::utils::{logger, validation::Validate};
use post_aggregator::{
    CliConfig, Command, DirectoryLoader, LocalStorage, PostQuery, PostService, Settings, TomlConfig,
};
use std::sync::Arc;

fn exit_with(e: &AggregatorError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn print_posts(posts: &[Arc<Post>]) -> anyhow::Result<()> {
    let view: Vec<&Post> = posts.iter().map(Arc::as_ref).collect();
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let file = match cli.config.as_deref().map(TomlConfig::from_file).transpose() {
        Ok(file) => file,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    let settings = Settings::resolve(&cli, file.as_ref());

    if settings.json_logs {
        logger::init_json_logger(settings.verbose, settings.log_level.as_deref());
    } else {
        logger::init_cli_logger(settings.verbose, settings.log_level.as_deref());
    }
    tracing::debug!("Effective settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        exit_with(&e);
    }

    let loader = DirectoryLoader::new(LocalStorage::default());
    let directory = match loader.load(&settings.data_file).await {
        Ok((directory, _report)) => Arc::new(directory),
        Err(e) => exit_with(&e),
    };
    let service = PostService::from_config(directory, &settings);

    match cli.command {
        Command::Timeline { user_id } => print_posts(&service.get_timeline(user_id).await)?,
        Command::Feed { user_id } => print_posts(&service.get_feed(user_id).await)?,
        Command::Following { user_id } => {
            let ids = service.list_following(user_id).await;
            println!("{}", serde_json::to_string(&ids)?);
        }
        Command::Latest { user_id } => {
            let latest = service.latest_post(user_id).await;
            let view = latest.as_deref();
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Summary => {
            let summary = service.directory().summary();
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to render summary")?
            );
        }
    }

    Ok(())
}
