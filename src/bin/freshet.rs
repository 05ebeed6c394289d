use clap::{CommandFactory, Parser};
use freshet::io::deck_io::DeckIO;
use freshet::io::echo::EchoFile;
use freshet::io::report_io;
use freshet::misc::cli_helpers::describe_cli_api;
use std::fs;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "freshet")]
#[command(about = "Distributed rainfall-runoff and sediment transport engine")]
#[command(version = env!("FRESHET_VERSION"))]
struct Cli {
    /// Path to the master input deck (.ini)
    deck: Option<String>,
    /// Write the mass balance report to this file
    #[arg(short, long)]
    mass_balance: Option<String>,
    /// Verify the mass balance report against a reference file
    #[arg(short, long)]
    verify_mass_balance: Option<String>,
    /// Report execution time profile
    #[arg(short = 'p', long)]
    profile: bool,
    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
    /// Print the CLI description as JSON and exit
    #[arg(long)]
    get_api: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.get_api {
        let command = Cli::command();
        let api_description = describe_cli_api(&command);
        println!("{}", serde_json::to_string_pretty(&api_description).unwrap());
        return;
    }

    let deck_path = match &cli.deck {
        Some(p) => p.clone(),
        None => {
            eprintln!("Error: no input deck given (freshet <deck.ini>)");
            std::process::exit(2);
        }
    };

    let total_start = Instant::now();

    // Load the deck
    let load_start = Instant::now();
    if !cli.quiet {
        println!("Loading deck: {}", deck_path);
    }
    let mut model = match DeckIO::new().read_model_file(deck_path.as_str()) {
        Ok(model) => model,
        Err(s) => {
            eprintln!("Error: {}", s);
            std::process::exit(1);
        }
    };

    let echo = EchoFile::new(model.output.echo_file.clone());

    if let Err(e) = model.configure() {
        eprintln!("Error: {}", e);
        echo.write_error("configuration", &e);
        std::process::exit(1);
    }
    echo.write_header(&model, &deck_path);
    let load_time = load_start.elapsed();

    // Run
    if !cli.quiet {
        println!("Running simulation...");
    }
    let sim_start = Instant::now();
    if let Err(e) = model.run() {
        eprintln!("Error: {}", e);
        echo.write_error("simulation", &e);
        std::process::exit(1);
    }
    let sim_time = sim_start.elapsed();

    // Outputs
    let output_start = Instant::now();
    if let Err(e) = report_io::write_outputs(&model) {
        eprintln!("Error: {}", e);
        echo.write_error("output", &e);
        std::process::exit(1);
    }

    // Mass balance reporting and verification; a .json path gets the
    // serialized totals instead of the text report
    let mut mb_report = String::new();
    if let Some(f) = &cli.mass_balance {
        let contents = if f.ends_with(".json") {
            match model.mass_balance_json() {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    String::new()
                }
            }
        } else {
            mb_report = model.generate_mass_balance_report();
            mb_report.clone()
        };
        if let Err(e) = fs::write(f, &contents) {
            eprintln!("Error: {}", e);
        }
    }
    if let Some(f) = &cli.verify_mass_balance {
        match fs::read_to_string(f) {
            Ok(mb_verification) => {
                if mb_report.is_empty() {
                    mb_report = model.generate_mass_balance_report();
                }
                let red = "\x1b[31m";
                let green = "\x1b[32m";
                let reset = "\x1b[0m";
                if mb_report.trim() == mb_verification.trim() {
                    println!("Mass balance verification: {green}VERIFIED!{reset}");
                } else {
                    eprintln!("Mass balance verification: {red}FAILED!{reset}");
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    if mb_report.is_empty() {
        mb_report = model.generate_mass_balance_report();
    }
    echo.write_mass_balance(&mb_report);
    let output_time = output_start.elapsed();

    let total_time = total_start.elapsed();

    if !cli.quiet {
        println!("Done!");
    }

    if cli.profile {
        let misc_time = total_time.saturating_sub(load_time + sim_time + output_time);
        println!("\n=== Execution Profile ===");
        println!("  Loading time:    {:>10.3} ms", load_time.as_secs_f64() * 1000.0);
        println!("  Simulation time: {:>10.3} ms", sim_time.as_secs_f64() * 1000.0);
        println!("  Output time:     {:>10.3} ms", output_time.as_secs_f64() * 1000.0);
        println!("  Misc:            {:>10.3} ms", misc_time.as_secs_f64() * 1000.0);
        println!("  ─────────────────────────");
        println!("  Total time:      {:>10.3} ms", total_time.as_secs_f64() * 1000.0);
    }
}
