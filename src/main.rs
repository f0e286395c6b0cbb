use std::env;
use std::process;

use mutabilis::commands;
use mutabilis::config::Config;

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = Config::new(&args).unwrap_or_else(|err| {
        eprintln!("Problem parsing arguments: {err}");
        process::exit(1);
    });

    match config.mode.as_str() {
        "access" => commands::run_access(&config),
        "memory" => commands::run_memory(&config),
        "sanity" => commands::run_sanity(&config),
        "next" => commands::run_next(&config),
        _ => unreachable!("Config::new rejects unknown modes"),
    }
}
