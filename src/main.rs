//! Entry point for the LuSkill application.
//! Handles CLI parsing, configuration, and dispatches the metric run and its reports.

use clap::Parser;
use lu_skill::cli::Args;
use lu_skill::io::CsvSource;
use lu_skill::orchestrator::MetricOrchestrator;
use lu_skill::report::{print_table, write_json, write_taylor_json};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.max_level())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!(
        r#"
------------------------------------------------------------------
             _            ____  _    _ _ _
            | |   _   _  / ___|| | _(_) | |
            | |  | | | | \___ \| |/ / | | |
            | |__| |_| |  ___) |   <| | | |
            |_____\__,_| |____/|_|\_\_|_|_|
         Land-cover skill metrics: KGE, RMSD, DAV
------------------------------------------------------------------
                        "#
    );

    let config = args.to_config()?;
    info!(root = %config.data_root.display(), "reading input data");

    let source = CsvSource::new(config.data_root.clone());
    let orchestrator = MetricOrchestrator::new(config)?;
    let table = orchestrator.run(&source);

    print_table(&table);

    if let Some(path) = &args.output_json {
        write_json(&table, path)?;
        println!("✅ Saved results to {}", path.display());
    }
    if let Some(path) = &args.taylor_json {
        write_taylor_json(&table, path)?;
        println!("✅ Saved Taylor-diagram samples to {}", path.display());
    }

    Ok(())
}
