use std::io::{self, Write};
use std::path::Path;
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;

use circleai::common::io::{bytes_to_text, read_file, read_text};
use circleai::common::{init_tracing, reset_sigpipe};
use circleai::provider::{Provider, Settings, Task, api_error, build_request, response_text};

const TOOL: &str = "circleai-request";

#[derive(Parser)]
#[command(
    name = "circleai-request",
    about = "Shape an LLM provider request for a selection, or read a provider reply.",
    after_help = "Prints the HTTP request (method, URL, headers, JSON body) that the\n\
        selected provider expects. Nothing is sent. With --response, the saved\n\
        reply body is parsed with the provider's response shape and its text is\n\
        printed instead.",
    version
)]
struct Cli {
    /// What to ask the model
    #[arg(short = 't', long = "task", value_enum, default_value_t = Task::Explain)]
    task: Task,

    /// Settings JSON as saved by the settings form (camelCase keys)
    #[arg(short = 's', long = "settings", value_name = "FILE")]
    settings: Option<String>,

    /// Provider (overrides the settings file)
    #[arg(short = 'p', long = "provider", value_enum)]
    provider: Option<Provider>,

    /// API key (overrides the settings file)
    #[arg(long = "api-key", env = "CIRCLEAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name (overrides the settings file)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// Base URL of a custom provider
    #[arg(long = "custom-url", value_name = "URL")]
    custom_url: Option<String>,

    /// The custom provider speaks the OpenAI chat API
    #[arg(long = "openai-compatible")]
    openai_compatible: bool,

    /// Sampling temperature, 0 to 1
    #[arg(long = "temperature")]
    temperature: Option<f64>,

    /// Maximum tokens in the reply, 1 to 4096
    #[arg(long = "max-tokens")]
    max_tokens: Option<u32>,

    /// Print the API key instead of masking it
    #[arg(long = "show-key")]
    show_key: bool,

    /// Parse this saved reply body instead of building a request
    #[arg(long = "response", value_name = "FILE")]
    response: Option<String>,

    /// HTTP status the saved reply came with
    #[arg(long = "status", default_value_t = 200, requires = "response")]
    status: u16,

    /// HTTP reason phrase the saved reply came with
    #[arg(long = "reason", default_value = "", requires = "response")]
    reason: String,

    /// Log to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Selection text
    text: Option<String>,

    /// Read the selection from FILE (- for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE", conflicts_with = "text")]
    file: Option<String>,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let data = read_file(Path::new(path))
                    .with_context(|| format!("cannot read settings {path}"))?;
                serde_json::from_slice::<Settings>(&data)
                    .with_context(|| format!("invalid settings {path}"))?
            }
            None => Settings::default(),
        };
        if let Some(provider) = self.provider {
            settings.api_provider = provider;
        }
        if let Some(key) = &self.api_key {
            settings.api_key = key.clone();
        }
        if let Some(model) = &self.model {
            settings.model = Some(model.clone());
        }
        if let Some(url) = &self.custom_url {
            settings.custom_url = Some(url.clone());
        }
        if self.openai_compatible {
            settings.openai_compatible = true;
        }
        if let Some(t) = self.temperature {
            settings.temperature = t;
        }
        if let Some(n) = self.max_tokens {
            settings.max_tokens = n;
        }
        Ok(settings)
    }

    fn selection(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if self.task == Task::ConnectionTest {
            return Ok(String::new());
        }
        let text = read_text(self.file.as_deref()).context("cannot read selection")?;
        Ok(text.trim().to_string())
    }
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let settings = cli.settings()?;

    if let Some(path) = &cli.response {
        let body = bytes_to_text(
            read_file(Path::new(path)).with_context(|| format!("cannot read response {path}"))?,
        );
        if !(200..300).contains(&cli.status) {
            return Err(api_error(settings.api_provider, cli.status, &cli.reason, &body).into());
        }
        let text = response_text(&settings, &body)?;
        writeln!(out, "{text}")?;
        return Ok(());
    }

    let text = cli.selection()?;
    if text.is_empty() && cli.task != Task::ConnectionTest {
        bail!("no selection text given");
    }

    let request = build_request(&settings, cli.task, &text)?;
    let request = if cli.show_key {
        request
    } else {
        request.redacted()
    };
    serde_json::to_writer_pretty(&mut *out, &request)?;
    writeln!(out)?;
    Ok(())
}

fn main() {
    reset_sigpipe();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&cli, &mut out) {
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::BrokenPipe
        {
            process::exit(0);
        }
        eprintln!("{TOOL}: {e:#}");
        process::exit(1);
    }
}
