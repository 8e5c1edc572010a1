//! credit-risk
//!
//! Command-line interface for the fuzzy loan risk model.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use credit_risk::config::RiskConfig;
use credit_risk::credit::{CreditModel, Explanation};
use credit_risk::fuzzy::DefuzzificationMethod;
use credit_risk::logging::init_logging;
use credit_risk::server::{run_server, CalculateResponse};

#[derive(Parser)]
#[command(name = "credit-risk")]
#[command(version = env!("CREDIT_RISK_VERSION"))]
#[command(about = "Fuzzy-logic loan risk assessment", long_about = None)]
struct Cli {
    /// Configuration file (skips the default search path)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Defuzzification method (overrides configuration)
    #[arg(long, global = true, value_enum)]
    defuzz: Option<DefuzzArg>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess a single loan application
    Evaluate {
        /// Monthly income
        #[arg(long, allow_negative_numbers = true)]
        income: f64,

        /// Monthly debt
        #[arg(long, allow_negative_numbers = true)]
        debt: f64,

        /// Work experience in months
        #[arg(long, allow_negative_numbers = true)]
        experience: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Show fuzzified inputs and rule activations
        #[arg(long)]
        explain: bool,
    },

    /// Run the HTTP service
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// HTML file to serve at /
        #[arg(long, value_name = "FILE")]
        index_page: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Print a commented default configuration file instead
        #[arg(long)]
        init: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DefuzzArg {
    /// Weighted mean over the sampled risk universe
    Centroid,
    /// Area-weighted centroid of the piecewise-linear output set
    AreaCentroid,
}

impl From<DefuzzArg> for DefuzzificationMethod {
    fn from(arg: DefuzzArg) -> Self {
        match arg {
            DefuzzArg::Centroid => DefuzzificationMethod::Centroid,
            DefuzzArg::AreaCentroid => DefuzzificationMethod::AreaCentroid,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Config { init: true } = cli.command {
        print!("{}", RiskConfig::default_config_content());
        return Ok(());
    }

    let mut config = RiskConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(method) = cli.defuzz {
        config.model.defuzzification = method.into();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    match cli.command {
        Command::Evaluate {
            income,
            debt,
            experience,
            json,
            explain,
        } => {
            init_logging(&config.logging);
            let model = CreditModel::new(config.model.defuzzification)?;
            let explanation = model.explain(income, debt, experience)?;
            print_explanation(&explanation, json, explain)?;
        }

        Command::Serve {
            host,
            port,
            index_page,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(path) = index_page {
                config.server.index_page = Some(path);
            }

            init_logging(&config.logging);
            let model = CreditModel::new(config.model.defuzzification)?;

            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(run_server(model, config.server))?;
        }

        Command::Config { .. } => {
            print!("{}", config.to_toml()?);
            eprintln!();
            eprintln!("# Search path (first existing file wins):");
            for path in RiskConfig::config_paths() {
                let marker = if path.exists() { "*" } else { " " };
                eprintln!("# {} {}", marker, path.display());
            }
        }
    }

    Ok(())
}

fn print_explanation(explanation: &Explanation, json: bool, explain: bool) -> Result<()> {
    let assessment = &explanation.assessment;

    if json {
        let rendered = if explain {
            serde_json::to_string_pretty(explanation)?
        } else {
            serde_json::to_string_pretty(&CalculateResponse::new(None, assessment))?
        };
        println!("{}", rendered);
        return Ok(());
    }

    if explain {
        match &explanation.inference {
            Some(inference) => {
                println!("Fuzzified inputs:");
                for input in &inference.fuzzified {
                    let degrees: Vec<String> = input
                        .degrees
                        .iter()
                        .map(|(label, degree)| format!("{}={:.3}", label, degree))
                        .collect();
                    let dominant = input.dominant.as_deref().unwrap_or("none");
                    println!(
                        "  {} = {} ({}): {}",
                        input.variable,
                        input.value,
                        dominant,
                        degrees.join(", ")
                    );
                }
                println!("Rule activations:");
                for activation in &inference.activations {
                    let marker = if activation.strength > 0.0 { "*" } else { " " };
                    let name = activation
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("#{}", activation.rule));
                    println!(
                        "  {} {} -> {} ({:.3})",
                        marker, name, activation.consequent, activation.strength
                    );
                }
                println!("Centroid: {:.4}", inference.centroid);
            }
            None => println!("Experience gate applied; no inference run"),
        }
    }

    println!("{}", assessment);
    Ok(())
}
