use clap::Parser;
use dotenv::dotenv;
use statarb::cli::{Cli, Commands, DataSource, OptimizeCliConfig, SelectPairsCliConfig};
use statarb::commands::{
    run_cointegration, run_evaluation, run_optimize, run_pipeline, run_replay, run_select_pairs,
};
use statarb::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.verbose, cli.json_logs)?;

    match &cli.command {
        Commands::SelectPairs {
            data,
            min_correlation,
            significance,
            no_johansen,
            raw_prices,
            min_half_life,
            max_half_life,
            max_pairs,
            output,
        } => {
            let args = SelectPairsCliConfig {
                min_correlation: *min_correlation,
                significance: *significance,
                no_johansen: *no_johansen,
                raw_prices: *raw_prices,
                min_half_life: *min_half_life,
                max_half_life: *max_half_life,
                max_pairs: *max_pairs,
            };
            run_select_pairs(&DataSource::from(data), &args, output)?;
        }
        Commands::Cointegration { data, pair } => {
            run_cointegration(&DataSource::from(data), pair)?;
        }
        Commands::Optimize {
            data,
            pair,
            method,
            steps,
            trials,
            seed,
            train_ratio,
            min_trades,
            config,
            output,
        } => {
            let args = OptimizeCliConfig {
                method: method.clone(),
                steps: *steps,
                trials: *trials,
                seed: *seed,
                train_ratio: *train_ratio,
                min_trades: *min_trades,
            };
            run_optimize(
                &DataSource::from(data),
                pair,
                &args,
                config.as_deref(),
                output,
            )?;
        }
        Commands::Run {
            data,
            pair,
            config,
            output_dir,
        } => {
            run_evaluation(&DataSource::from(data), pair, config.as_deref(), output_dir)?;
        }
        Commands::Replay {
            data,
            pair,
            config,
            signals_out,
            channel_capacity,
        } => {
            run_replay(
                &DataSource::from(data),
                pair,
                config.as_deref(),
                signals_out,
                *channel_capacity,
            )
            .await?;
        }
        Commands::Pipeline {
            data,
            output_dir,
            trials,
            seed,
        } => {
            run_pipeline(&DataSource::from(data), output_dir, *trials, *seed)?;
        }
    }

    Ok(())
}
