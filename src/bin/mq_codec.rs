//! Decode, encode or check fixed-width MQ messages from the command line.
//!
//! Usage:
//!   mq_codec decode --schema FILE [--section NAME] [--config FILE] [--json]
//!                   [--clean | --clean-occurrences]                          < message.txt
//!   mq_codec encode --schema FILE --section NAME [--config FILE]            < message.json
//!   mq_codec check  --schema FILE                                           < message.txt
//!
//! The schema is JSON when the file ends in `.json`, layout notation otherwise. Without
//! `--section`, decode picks the section from the header (return code, message type).
//! `--clean` drops blank and all-zero fields and padding children from the decoded body;
//! `--clean-occurrences` only drops padding children. The header is never cleaned.
//! Diagnostics are logged to stderr; set `RUST_LOG` to see more (default `warn`).

use anyhow::{bail, Context};
use mqcodec::{
    check_frame, clean_message, decode_frame, dump_record, parse_layout, CleanMode, Codec,
    CodecConfig, Message, Schema,
};
use std::io::{self, Read, Write};
use std::path::Path;

struct Options {
    command: String,
    schema: String,
    section: Option<String>,
    config: Option<String>,
    json: bool,
    clean: Option<CleanMode>,
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn take_value(args: &mut Vec<String>, flag: &str) -> anyhow::Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    args.remove(pos);
    if pos >= args.len() {
        bail!("{} requires a value", flag);
    }
    Ok(Some(args.remove(pos)))
}

fn parse_args() -> anyhow::Result<Options> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json = take_flag(&mut args, "--json");
    let clean = match (
        take_flag(&mut args, "--clean"),
        take_flag(&mut args, "--clean-occurrences"),
    ) {
        (true, true) => bail!("--clean and --clean-occurrences are exclusive"),
        (true, false) => Some(CleanMode::Aggressive),
        (false, true) => Some(CleanMode::OccurrencesOnly),
        (false, false) => None,
    };
    let schema = take_value(&mut args, "--schema")?.context("--schema FILE is required")?;
    let section = take_value(&mut args, "--section")?;
    let config = take_value(&mut args, "--config")?;
    let command = match args.as_slice() {
        [cmd] => cmd.clone(),
        [] => bail!("missing command (decode, encode or check)"),
        _ => bail!("unexpected arguments: {}", args.join(" ")),
    };
    Ok(Options {
        command,
        schema,
        section,
        config,
        json,
        clean,
    })
}

fn load_schema(path: &str) -> anyhow::Result<Schema> {
    let src = std::fs::read_to_string(path).with_context(|| format!("{}: read failed", path))?;
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        Schema::from_json(&src).with_context(|| format!("{}: invalid JSON schema", path))
    } else {
        parse_layout(&src).map_err(|e| anyhow::anyhow!("{}: {}", path, e))
    }
}

fn load_config(path: Option<&str>) -> anyhow::Result<CodecConfig> {
    match path {
        None => Ok(CodecConfig::default()),
        Some(p) => {
            let src = std::fs::read_to_string(p).with_context(|| format!("{}: read failed", p))?;
            CodecConfig::from_json(&src).with_context(|| format!("{}: invalid config", p))
        }
    }
}

/// Raw message from stdin, without the line terminator a shell or editor appends.
fn read_raw() -> anyhow::Result<String> {
    let mut src = String::new();
    io::stdin().read_to_string(&mut src)?;
    let trimmed = src.trim_end_matches(['\r', '\n']).len();
    src.truncate(trimmed);
    Ok(src)
}

fn run(opts: Options) -> anyhow::Result<()> {
    let schema = load_schema(&opts.schema)?;
    let config = load_config(opts.config.as_deref())?;
    let codec = Codec::with_config(schema, config);
    let mut stdout = io::stdout();

    match opts.command.as_str() {
        "decode" => {
            let raw = read_raw()?;
            let (section, message) = match &opts.section {
                Some(section) => (section.clone(), codec.decode(section, &raw)?),
                None => {
                    let frame = decode_frame(&codec, &raw)?;
                    (frame.section, Message::new(frame.header, frame.body))
                }
            };
            let message = match opts.clean {
                Some(mode) => clean_message(&message, mode),
                None => message,
            };
            if opts.json {
                serde_json::to_writer_pretty(&mut stdout, &message)?;
                writeln!(stdout)?;
            } else {
                writeln!(stdout, "[header]")?;
                writeln!(stdout, "{}", dump_record(&message.header))?;
                writeln!(stdout, "[{}]", section)?;
                writeln!(stdout, "{}", dump_record(&message.body))?;
            }
        }
        "encode" => {
            let section = opts.section.as_deref().context("encode requires --section NAME")?;
            let mut src = String::new();
            io::stdin().read_to_string(&mut src)?;
            let message: Message = serde_json::from_str(&src).context("stdin: invalid message JSON")?;
            let raw = codec.encode(section, &message)?;
            writeln!(stdout, "{}", raw)?;
        }
        "check" => {
            let raw = read_raw()?;
            check_frame(codec.schema(), &raw)?;
            writeln!(stdout, "ok")?;
        }
        other => bail!("unknown command: {}", other),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    let opts = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("mq_codec: {:#}", e);
            eprintln!("usage: mq_codec decode|encode|check --schema FILE [--section NAME] [--config FILE] [--json] [--clean | --clean-occurrences]");
            std::process::exit(1);
        }
    };
    if let Err(e) = run(opts) {
        eprintln!("mq_codec: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
