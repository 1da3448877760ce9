use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use jsonx::{CompileOptions, compile_with, output_path_for};

const USAGE: &str = "Usage: jsonx [--pretty] [--stdout] [--output <path>] [<input.jsonx>]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    to_stdout: bool,
    help: bool,
    options: CompileOptions,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--pretty" | "-p" => parsed.options.pretty = true,
            "--stdout" => parsed.to_stdout = true,
            "--output" | "-o" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("Missing path after {arg}"))?;
                parsed.output = Some(PathBuf::from(path));
            }
            "--help" | "-h" => parsed.help = true,
            flag if flag.starts_with('-') => bail!("Unknown option '{flag}'\n{USAGE}"),
            _ => {
                if parsed.input.is_some() {
                    bail!("Only one input file is supported");
                }
                parsed.input = Some(PathBuf::from(arg));
            }
        }
    }

    if parsed.to_stdout && parsed.output.is_some() {
        bail!("--stdout and --output cannot be combined");
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let source = if let Some(path) = &args.input {
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let label = args
        .input
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    let json = compile_with(&source, &args.options).with_context(|| format!("Compiling {label}"))?;

    let destination = match (&args.input, args.output, args.to_stdout) {
        (_, Some(output), _) => Some(output),
        (Some(input), None, false) => Some(output_path_for(input)),
        _ => None,
    };

    match destination {
        Some(path) => {
            fs::write(&path, &json).with_context(|| format!("Writing {}", path.display()))?;
            println!("{}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("Writing stdout")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_input_and_flags() {
        let args = parse(&["-p", "config.jsonx"]).expect("parse failed");
        assert_eq!(
            args,
            Args {
                input: Some(PathBuf::from("config.jsonx")),
                output: None,
                to_stdout: false,
                help: false,
                options: CompileOptions { pretty: true },
            }
        );
    }

    #[test]
    fn parses_explicit_output() {
        let args = parse(&["in.jsonx", "--output", "out.json"]).expect("parse failed");
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn help_is_not_an_error() {
        let args = parse(&["--help"]).expect("parse failed");
        assert!(args.help);
        assert!(parse(&["-h", "in.jsonx"]).expect("parse failed").help);
    }

    #[test]
    fn rejects_second_input() {
        let err = parse(&["a.jsonx", "b.jsonx"]).expect_err("expected failure");
        assert!(err.to_string().contains("Only one input file"));
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = parse(&["--verbose"]).expect_err("expected failure");
        assert!(err.to_string().contains("Unknown option '--verbose'"));
    }

    #[test]
    fn requires_output_path() {
        let err = parse(&["-o"]).expect_err("expected failure");
        assert!(err.to_string().contains("Missing path after -o"));
    }
}
