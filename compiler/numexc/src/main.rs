//! Numex CLI
//!
//! Compile and evaluate numex expressions and DSL kernels from the shell.

use numexc::commands::{check_command, dump_command, eval_command, nd_command, Options};
use numexc::{init_tracing, EvalConfig, VERSION};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let config = EvalConfig::from_env();

    let result = match command.as_str() {
        "eval" | "nd" | "dump" | "check" => {
            if args.len() < 3 {
                print_command_usage(command);
                std::process::exit(1);
            }
            let options = match Options::parse(&args[2..]) {
                Ok(options) => options,
                Err(message) => {
                    eprintln!("{message}");
                    print_command_usage(command);
                    std::process::exit(1);
                }
            };
            match command.as_str() {
                "eval" => eval_command(&options, &config),
                "nd" => nd_command(&options, &config),
                "dump" => dump_command(&options),
                _ => check_command(&options),
            }
        }
        "--version" | "-V" | "version" => {
            println!("numex {VERSION}");
            return;
        }
        "--help" | "-h" | "help" => {
            print_usage();
            return;
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match result {
        Ok(text) => println!("{}", text.trim_end()),
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

fn print_command_usage(command: &str) {
    match command {
        "eval" => {
            eprintln!("Usage: numex eval <expr> [--var name:dtype=v1,v2,...]... [options]");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --dtype=<dtype>     Output dtype (default: auto)");
            eprintln!("  --parallel[=<n>]    Evaluate ranges of n elements concurrently");
        }
        "nd" => {
            eprintln!("Usage: numex nd <expr> --shape=<dims> --chunks=<dims> --blocks=<dims> [options]");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --nchunk=<i>        Chunk index (default: 0)");
            eprintln!("  --nblock=<i>        Block index within the chunk (default: 0)");
            eprintln!("  --var name:dtype=.. Block values in row-major order");
            eprintln!("  --dtype=<dtype>     Output dtype (default: auto)");
        }
        "dump" => eprintln!("Usage: numex dump <expr> [--var name:dtype]... [--dtype=<dtype>]"),
        _ => eprintln!("Usage: numex check <file.dsl> [--var name:dtype]... [--dtype=<dtype>]"),
    }
}

fn print_usage() {
    println!("numex {VERSION} - numeric expression compiler");
    println!();
    println!("Usage: numex <command> [options]");
    println!();
    println!("Commands:");
    println!("  eval <expr>     Evaluate over flat --var arrays");
    println!("  nd <expr>       Evaluate one block of a chunked N-dimensional array");
    println!("  dump <expr>     Print the compiled tree or program");
    println!("  check <file>    Compile a DSL file and report its output dtype");
    println!("  version         Print the version");
    println!();
    println!("Environment:");
    println!("  RUST_LOG             Enable tracing (e.g. numex_nd=debug)");
    println!("  NUMEX_LOG_TREE=1     Hierarchical tracing output");
    println!("  NUMEX_DISABLE_SIMD   Force the scalar math backend");
    println!("  NUMEX_ULP            1 (precise) or 3.5 (relaxed)");
    println!("  NUMEX_SUM_RUN_LIMIT  Most runs for a ragged-block sum before packing");
}
