mod library;
mod run;

use clap::Command;

use mirvar_core::MirvarError;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "mirvar";
    pub const BIN_NAME: &str = "mirvar";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Detect and quantify miRNAs, isomiRs and polymiRs from small RNA sequencing data, accounting for the impact of genetic variants on polymiR expression.")
        .subcommand_required(true)
        .subcommand(run::cli::create_run_cli())
        .subcommand(library::cli::create_library_cli())
}

fn main() {
    let app = build_parser();
    let matches = app.get_matches();

    let result = match matches.subcommand() {
        //
        // FULL SAMPLE RUN
        //
        Some((run::cli::RUN_CMD, matches)) => run::handlers::run_sample(matches),

        //
        // LIBRARY PREPARATION ONLY
        //
        Some((library::cli::LIBRARY_CMD, matches)) => library::handlers::prepare(matches),

        _ => unreachable!("Subcommand not found"),
    };

    if let Err(err) = result {
        eprintln!("ERROR: {:#}", err);
        let code = err
            .downcast_ref::<MirvarError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}
