use std::io::{self, Write};
use std::process;

use clap::Parser;

use circleai::common::io::read_text;
use circleai::common::{init_tracing, io_error_msg, reset_sigpipe};
use circleai::deliver::{JsonLineSink, ResultMessage, RetryPolicy, deliver_with_retry};
use circleai::unwrap::{
    DecodeConfig, MAX_PROCESSING_LENGTH, MAX_UNWRAPS, decode_selection, render_error,
    render_report,
};

const TOOL: &str = "circleai-decode";

#[derive(Parser)]
#[command(
    name = "circleai-decode",
    about = "Decode a Base64 selection, unwrapping nested layers.",
    after_help = "With no FILE, or when FILE is -, read standard input.\n\n\
        The selection is trimmed, repaired (whitespace, padding, a truncated final\n\
        group) and decoded. While the result is itself valid Base64 it is decoded\n\
        again, up to --max-unwraps extra layers. UTF-16 payloads are detected from\n\
        NUL bytes.",
    version
)]
struct Cli {
    /// Characters of input processed; longer input is truncated and reported
    #[arg(long = "max-length", value_name = "CHARS", default_value_t = MAX_PROCESSING_LENGTH)]
    max_length: usize,

    /// Nested layers unwrapped after the first decode
    #[arg(long = "max-unwraps", value_name = "N", default_value_t = MAX_UNWRAPS)]
    max_unwraps: usize,

    /// Do not mark embedded Base64 strings in the result
    #[arg(long = "no-highlight")]
    no_highlight: bool,

    /// Print the result as a JSON result message instead of a text report
    #[arg(long = "json")]
    json: bool,

    /// Log decode steps to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// File to decode (reads stdin if omitted or -)
    file: Option<String>,
}

impl Cli {
    fn config(&self) -> DecodeConfig {
        DecodeConfig {
            max_length: self.max_length,
            max_unwraps: self.max_unwraps,
            highlight: !self.no_highlight,
            ..DecodeConfig::default()
        }
    }
}

fn main() {
    reset_sigpipe();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let input = match read_text(cli.file.as_deref()) {
        Ok(text) => text,
        Err(e) => {
            match cli.file.as_deref() {
                Some(name) if name != "-" => eprintln!("{TOOL}: {name}: {}", io_error_msg(&e)),
                _ => eprintln!("{TOOL}: {}", io_error_msg(&e)),
            }
            process::exit(1);
        }
    };

    let config = cli.config();
    let decoded = decode_selection(&input, &config);
    let failed = decoded.is_err();

    let result = if cli.json {
        let message = match &decoded {
            Ok(outcome) => ResultMessage::decode(render_report(outcome, &config)),
            Err(e) => ResultMessage::error(render_error(e)),
        };
        let stdout = io::stdout();
        let mut sink = JsonLineSink::new(stdout.lock());
        deliver_with_retry(&mut sink, &message, RetryPolicy::once()).map_err(|e| e.last)
    } else {
        match &decoded {
            Ok(outcome) => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                writeln!(out, "{}", render_report(outcome, &config)).and_then(|_| out.flush())
            }
            Err(e) => {
                eprintln!("{TOOL}: {e}");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        if e.kind() == io::ErrorKind::BrokenPipe {
            process::exit(0);
        }
        eprintln!("{TOOL}: {}", io_error_msg(&e));
        process::exit(1);
    }

    if failed {
        process::exit(1);
    }
}
