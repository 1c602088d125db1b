use std::{io::Write, path::PathBuf};

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use shellfish::{config::Config, prelude::*};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Run a pipeline of programs without going through a shell.
///
/// Stages are separated by a literal `|` argument, e.g.
/// `shellfish -- ls -l '|' grep toml`.
#[derive(Debug, Parser)]
#[command(name = "shellfish", version)]
struct Cli {
    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Text fed to the first stage as its entire stdin
    #[arg(long, value_name = "TEXT")]
    input: Option<String>,

    /// Write the last stage's stdout to FILE instead of printing it
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Append to --output instead of truncating it
    #[arg(long, requires = "output")]
    append: bool,

    /// Decode captured output as text
    #[arg(long)]
    text: bool,

    /// Treat a non-zero return code as an error
    #[arg(long)]
    check: bool,

    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "STAGE"
    )]
    words: Vec<String>,
}

fn build(registry: &Registry, words: &[String]) -> Result<Stmt> {
    let mut pipeline = None::<Stmt>;

    for stage in words.split(|word| word == "|") {
        let (name, args) = stage
            .split_first()
            .ok_or_else(|| eyre!("empty pipeline stage"))?;

        let cmd = registry.lookup(name)?.with_args(args);

        pipeline = Some(match pipeline.take() {
            Some(left) => left.pipe(cmd).into(),
            None => cmd.into(),
        });
    }

    pipeline.ok_or_else(|| eyre!("no command given"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log.as_deref().unwrap_or("warn")))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .with(filter)
        .with(tracing_error::ErrorLayer::default())
        .init();

    let mut stmt = build(&config.registry(), &cli.words)?;

    if let Some(input) = cli.input {
        stmt.set_stdin(Endpoint::literal(input));
    }
    if cli.text || config.text {
        stmt.set_text_mode(true);
    }
    if let Some(path) = cli.output {
        stmt.set_stdout(if cli.append {
            Endpoint::append(path)
        } else {
            Endpoint::file(path)
        });
    }

    tracing::debug!(statement = %stmt, "running");

    let res = execute(&mut stmt).await?;

    {
        let mut stdout = std::io::stdout().lock();
        if let Some(out) = &res.stdout {
            stdout.write_all(out.as_bytes())?;
        }
        stdout.flush()?;

        let mut stderr = std::io::stderr().lock();
        for err in res.upstream.iter().filter_map(|stage| stage.stderr.as_ref()) {
            stderr.write_all(err.as_bytes())?;
        }
        if let Some(err) = &res.stderr {
            stderr.write_all(err.as_bytes())?;
        }
    }

    if cli.check && !res.success() {
        return Err(ShellfishError::ProcessExit {
            code: res.return_code,
            statement: stmt.to_string(),
            stdout: res.stdout,
        }
        .into());
    }

    drop(guard);
    std::process::exit(res.return_code)
}
