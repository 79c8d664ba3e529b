// ABOUTME: Example answering a JSON clause list against a DTB file
// ABOUTME: Prints the query result, including dtb-size, as pretty JSON

use dtb_query::{Clause, DtbQuery, QueryConfig};
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("usage: {} <file.dtb> <clauses.json> [config.json]", args[0]);
        process::exit(2);
    }

    match run(&args[1], &args[2], args.get(3).map(String::as_str)) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error querying DTB: {e}");
            process::exit(1);
        }
    }
}

fn run(
    dtb_path: &str,
    clauses_path: &str,
    config_path: Option<&str>,
) -> Result<String, Box<dyn std::error::Error>> {
    let dtb_data =
        fs::read(dtb_path).map_err(|e| format!("Failed to read DTB file '{dtb_path}': {e}"))?;

    let clauses_text = fs::read_to_string(clauses_path)
        .map_err(|e| format!("Failed to read clause file '{clauses_path}': {e}"))?;
    let clauses: Vec<Clause> = serde_json::from_str(&clauses_text)?;

    let config = match config_path {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => QueryConfig::default(),
    };

    let engine = DtbQuery::with_config(&dtb_data, config)?;
    let result = engine.resolve(&clauses)?;
    Ok(serde_json::to_string_pretty(&result)?)
}
