use clap::Parser;
use redbox_bridge::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(_stats) => {
            // Success - details have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit. External command
            // failures pass the child's own exit code through.
            eprintln!("Error: {error}");
            process::exit(error.exit_code());
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("ReDBox Bridge - ReDBox to DSpace metadata transfer");
    println!("==================================================");
    println!();
    println!("Crosswalk ReDBox research-dataset metadata into DSpace BMET CSV");
    println!("batches and reconcile them with an existing DSpace collection.");
    println!();
    println!("USAGE:");
    println!("    redbox-bridge <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    extract      Extract ReDBox dataset records into a BMET CSV crosswalk");
    println!("    reconcile    Merge a ReDBox extract with a DSpace export into an import batch");
    println!("    help         Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Extract marked dataset records to a crosswalk CSV:");
    println!("    redbox-bridge extract --storage /srv/redbox/storage -o redbox_export.csv");
    println!();
    println!("    # Export the DSpace collection, merge, and write the import batch:");
    println!("    redbox-bridge reconcile --source-csv redbox_export.csv \\");
    println!("                            --archive-csv dspace_export.csv \\");
    println!("                            --export -o batch.csv");
    println!();
    println!("    # Hand the merged batch straight to the DSpace import tool:");
    println!("    redbox-bridge reconcile --source-csv redbox_export.csv --import -o batch.csv");
    println!();
    println!("For detailed help on any command, use:");
    println!("    redbox-bridge <COMMAND> --help");
}
