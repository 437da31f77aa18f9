use std::{env, process::ExitCode, time::Instant};

use ipcount::count_unique_in_file;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("usage: ipcount <file>");
        return ExitCode::FAILURE;
    };

    eprintln!("counting unique addresses in {file_path}");
    let start = Instant::now();
    match count_unique_in_file(file_path) {
        Ok(count) => {
            let elapsed = start.elapsed();
            println!("unique IPv4 addresses: {count}");
            eprintln!("done in {elapsed:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error reading {file_path}: {err}");
            ExitCode::FAILURE
        }
    }
}
