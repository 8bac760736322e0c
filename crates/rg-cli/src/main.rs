#![forbid(unsafe_code)]

//! relgraph CLI - render and validate entity relationship graphs.
//!
//! # Commands
//!
//! - `render`: Draw the graph as SVG, HTML, JSON, DOT or a plain edge listing
//! - `parse`: Output a parse summary (or the full graph) as JSON
//! - `validate`: Check input for errors and report diagnostics

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rg_core::{ArtifactFormat, GraphRenderer, LabelStyle, RelGraphError, RenderOptions};
use rg_parser::{ParseResult, parse_evidence_json, parse_source};
use rg_render_svg::{HtmlRenderer, LayoutConfig, SvgRenderConfig, SvgRenderer};
use rg_render_text::{DotRenderer, JsonRenderer, TextRenderer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// relgraph CLI - render and validate entity relationship graphs.
#[derive(Debug, Parser)]
#[command(
    name = "relgraph",
    version,
    about = "relgraph CLI - render and validate entity relationship graphs",
    long_about = "Reads entity records (`[id], TYPE:label`) and relationship records\n\
        (`[source] RELATION [target]`), builds a directed graph and renders it."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a relationship graph.
    Render(RenderArgs),

    /// Parse records and output a JSON summary.
    Parse {
        /// Input file path, "-" for stdin, or inline records.
        #[arg(default_value = "-")]
        input: String,

        /// Output the full graph instead of a summary
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate records and report diagnostics.
    Validate {
        /// Input file path, "-" for stdin, or inline records.
        #[arg(default_value = "-")]
        input: String,

        /// Output diagnostics as JSON
        #[arg(long)]
        json: bool,

        /// Exit with non-zero status on warnings (not just errors)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Input file path, "-" for stdin, or inline records. Defaults to the
    /// config file's `input`, then stdin.
    input: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file path. If omitted, writes to stdout.
    #[arg(short, long)]
    output: Option<String>,

    /// How entity type and label are joined (compact, spaced)
    #[arg(long)]
    label_style: Option<LabelStyle>,

    /// Layout simulation steps
    #[arg(long)]
    iterations: Option<usize>,

    /// Canvas width in pixels
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Canvas height in pixels
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// TOML run configuration. Command-line flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a JSON render summary to stderr
    #[arg(long)]
    json: bool,
}

/// Output format for render command.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    /// SVG vector graphics
    Svg,
    /// Standalone HTML page with the SVG drawing
    Html,
    /// Nodes and edges as JSON
    Json,
    /// Graphviz DOT
    Dot,
    /// One line per relationship
    Text,
}

impl From<OutputFormat> for ArtifactFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Svg => Self::Svg,
            OutputFormat::Html => Self::Html,
            OutputFormat::Json => Self::Json,
            OutputFormat::Dot => Self::Dot,
            OutputFormat::Text => Self::Text,
        }
    }
}

/// Settings loaded from a `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunConfig {
    input: Option<String>,
    output: Option<String>,
    format: Option<ArtifactFormat>,
    label_style: Option<LabelStyle>,
    layout: LayoutConfig,
}

/// Render settings after merging the config file with command-line flags.
#[derive(Debug, Clone, PartialEq)]
struct RenderPlan {
    input: String,
    output: Option<String>,
    format: ArtifactFormat,
    options: RenderOptions,
    layout: LayoutConfig,
}

/// Result of rendering a graph.
#[derive(Debug, Serialize)]
struct RenderResult {
    format: String,
    node_count: usize,
    edge_count: usize,
    output_bytes: usize,
    width: f32,
    height: f32,
    parse_time_ms: f64,
    render_time_ms: f64,
    total_time_ms: f64,
    warnings: Vec<String>,
}

/// Result of validating records.
#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    node_count: usize,
    edge_count: usize,
    warnings: Vec<ValidationWarning>,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
struct ValidationWarning {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationError {
    code: String,
    message: String,
    /// One-based record number, for record-level errors.
    record: Option<usize>,
    /// One-based source line of that record.
    line: Option<usize>,
    /// Byte offset into the input, for list literal errors.
    offset: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Render(args) => cmd_render(&args),

        Command::Parse {
            input,
            full,
            pretty,
        } => cmd_parse(&input, full, pretty),

        Command::Validate {
            input,
            json,
            strict,
        } => cmd_validate(&input, json, strict),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Treat as inline records
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            io::stdout()
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn load_run_config(path: &Path) -> Result<RunConfig> {
    let text = std::fs::read_to_string(path)
        .context(format!("Failed to read config: {}", path.display()))?;
    parse_run_config(&text).context(format!("Invalid config: {}", path.display()))
}

fn parse_run_config(text: &str) -> Result<RunConfig> {
    Ok(toml::from_str(text)?)
}

// =============================================================================
// Command: render
// =============================================================================

fn resolve_render_plan(args: &RenderArgs, config: RunConfig) -> RenderPlan {
    let mut layout = config.layout;
    if let Some(iterations) = args.iterations {
        layout.iterations = iterations;
    }
    if let Some(width) = args.width {
        layout.width = width as f32;
    }
    if let Some(height) = args.height {
        layout.height = height as f32;
    }

    let label_style = args.label_style.or(config.label_style).unwrap_or_default();

    RenderPlan {
        input: args
            .input
            .clone()
            .or(config.input)
            .unwrap_or_else(|| "-".to_string()),
        output: args.output.clone().or(config.output),
        format: args
            .format
            .map(ArtifactFormat::from)
            .or(config.format)
            .unwrap_or_default(),
        options: RenderOptions::default().with_label_style(label_style),
        layout,
    }
}

fn build_renderer(plan: &RenderPlan) -> Box<dyn GraphRenderer> {
    let svg_config = || {
        SvgRenderConfig::default()
            .with_label_style(plan.options.label_style)
            .with_layout(plan.layout)
    };

    match plan.format {
        ArtifactFormat::Svg => Box::new(SvgRenderer::new(svg_config())),
        ArtifactFormat::Html => Box::new(HtmlRenderer::new(svg_config())),
        ArtifactFormat::Json => Box::new(JsonRenderer::new(plan.options)),
        ArtifactFormat::Dot => Box::new(DotRenderer::new(plan.options)),
        ArtifactFormat::Text => Box::new(TextRenderer::new(plan.options)),
    }
}

fn cmd_render(args: &RenderArgs) -> Result<()> {
    let total_start = Instant::now();

    let config = match &args.config {
        Some(path) => load_run_config(path)?,
        None => RunConfig::default(),
    };
    let plan = resolve_render_plan(args, config);
    debug!(?plan, "resolved render settings");

    // Parse
    let parse_start = Instant::now();
    let source = load_input(&plan.input)?;
    let parsed = parse_source(&source).context("Failed to parse records")?;
    let parse_time = parse_start.elapsed();

    debug!(
        "Parsed: nodes={}, edges={}, warnings={}",
        parsed.graph.node_count(),
        parsed.graph.edge_count(),
        parsed.warnings.len()
    );

    for warning in &parsed.warnings {
        warn!("Parse warning: {warning}");
    }

    // Render
    let render_start = Instant::now();
    let renderer = build_renderer(&plan);
    let artifact = renderer
        .render(&parsed.graph)
        .context(format!("Failed to render {}", plan.format))?;
    let render_time = render_start.elapsed();

    let total_time = total_start.elapsed();

    if args.json {
        let result = RenderResult {
            format: plan.format.to_string(),
            node_count: parsed.graph.node_count(),
            edge_count: parsed.graph.edge_count(),
            output_bytes: artifact.content.len(),
            width: plan.layout.width,
            height: plan.layout.height,
            parse_time_ms: parse_time.as_secs_f64() * 1000.0,
            render_time_ms: render_time.as_secs_f64() * 1000.0,
            total_time_ms: total_time.as_secs_f64() * 1000.0,
            warnings: parsed.warnings.clone(),
        };

        let json_str = serde_json::to_string_pretty(&result)?;
        eprintln!("{json_str}");
    }

    write_output(plan.output.as_deref(), &artifact.content)?;

    info!(
        "Rendered {} nodes, {} edges as {} in {:.2}ms",
        parsed.graph.node_count(),
        parsed.graph.edge_count(),
        plan.format,
        total_time.as_secs_f64() * 1000.0
    );

    Ok(())
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(input: &str, full: bool, pretty: bool) -> Result<()> {
    let source = load_input(input)?;
    let parsed = parse_source(&source).context("Failed to parse records")?;

    let output = if full {
        if pretty {
            serde_json::to_string_pretty(&parsed)?
        } else {
            serde_json::to_string(&parsed)?
        }
    } else if pretty {
        let value: serde_json::Value = serde_json::from_str(&parse_evidence_json(&parsed))?;
        serde_json::to_string_pretty(&value)?
    } else {
        parse_evidence_json(&parsed)
    };

    println!("{output}");

    for warning in &parsed.warnings {
        warn!("Parse warning: {warning}");
    }

    Ok(())
}

// =============================================================================
// Command: validate
// =============================================================================

fn validate_source(source: &str, strict: bool) -> ValidateResult {
    match parse_source(source) {
        Ok(parsed) => validation_of(&parsed, strict),
        Err(err) => ValidateResult {
            valid: false,
            node_count: 0,
            edge_count: 0,
            warnings: Vec::new(),
            errors: vec![validation_error(&err)],
        },
    }
}

fn validation_of(parsed: &ParseResult, strict: bool) -> ValidateResult {
    let warnings: Vec<ValidationWarning> = parsed
        .warnings
        .iter()
        .map(|msg| ValidationWarning {
            code: categorize_warning(msg).to_string(),
            message: msg.clone(),
        })
        .collect();

    ValidateResult {
        valid: !strict || warnings.is_empty(),
        node_count: parsed.graph.node_count(),
        edge_count: parsed.graph.edge_count(),
        warnings,
        errors: Vec::new(),
    }
}

fn validation_error(err: &RelGraphError) -> ValidationError {
    let (record, line, offset) = match err {
        RelGraphError::MalformedRecord(malformed) => {
            (Some(malformed.index + 1), malformed.line, None)
        }
        RelGraphError::Source(source) => (None, None, Some(source.offset)),
        RelGraphError::DanglingReference(_) | RelGraphError::Render(_) => (None, None, None),
    };
    ValidationError {
        code: err.code().as_str().to_string(),
        message: err.to_string(),
        record,
        line,
        offset,
    }
}

fn categorize_warning(msg: &str) -> &'static str {
    if msg.contains("redeclared") {
        "relgraph/warning/redeclared-entity"
    } else {
        "relgraph/warning/other"
    }
}

fn cmd_validate(input: &str, json_output: bool, strict: bool) -> Result<()> {
    let source = load_input(input)?;
    let result = validate_source(&source, strict);

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        if result.valid {
            println!("✓ Valid relationship graph");
        } else {
            println!("✗ Invalid input");
        }

        println!("  Entities: {}", result.node_count);
        println!("  Relationships: {}", result.edge_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                let location = match (err.record, err.line, err.offset) {
                    (Some(record), Some(line), _) => format!(" (record {record}, line {line})"),
                    (Some(record), None, _) => format!(" (record {record})"),
                    (None, _, Some(offset)) => format!(" (byte {offset})"),
                    _ => String::new(),
                };
                println!("  [{}] {}{}", err.code, err.message, location);
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warn in &result.warnings {
                println!("  [{}] {}", warn.code, warn.message);
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rg_core::{ArtifactFormat, LabelStyle};

    use super::{
        Cli, Command, RunConfig, categorize_warning, parse_run_config, resolve_render_plan,
        validate_source,
    };

    fn render_args(argv: &[&str]) -> super::RenderArgs {
        let cli = Cli::try_parse_from(argv.iter().copied()).expect("valid arguments");
        match cli.command {
            Command::Render(args) => args,
            other => panic!("expected render command, got {other:?}"),
        }
    }

    #[test]
    fn run_config_reads_partial_layout_table() {
        let config = parse_run_config(
            r#"
input = "graph.txt"
format = "dot"
label_style = "spaced"

[layout]
iterations = 50
"#,
        )
        .expect("valid config");
        assert_eq!(config.input.as_deref(), Some("graph.txt"));
        assert_eq!(config.format, Some(ArtifactFormat::Dot));
        assert_eq!(config.label_style, Some(LabelStyle::Spaced));
        assert_eq!(config.layout.iterations, 50);
        assert_eq!(config.layout.width, 800.0);
    }

    #[test]
    fn run_config_rejects_unknown_keys() {
        assert!(parse_run_config("colour = \"red\"").is_err());
    }

    #[test]
    fn flags_override_config_values() {
        let config = parse_run_config(
            "input = \"a.txt\"\nformat = \"dot\"\n[layout]\nwidth = 400.0\niterations = 10\n",
        )
        .expect("valid config");
        let args = render_args(&[
            "relgraph",
            "render",
            "b.txt",
            "-f",
            "json",
            "--iterations",
            "0",
            "--label-style",
            "spaced",
        ]);
        let plan = resolve_render_plan(&args, config);
        assert_eq!(plan.input, "b.txt");
        assert_eq!(plan.format, ArtifactFormat::Json);
        assert_eq!(plan.layout.iterations, 0);
        assert_eq!(plan.layout.width, 400.0);
        assert_eq!(plan.options.label_style, LabelStyle::Spaced);
    }

    #[test]
    fn defaults_read_stdin_as_svg() {
        let plan = resolve_render_plan(&render_args(&["relgraph", "render"]), RunConfig::default());
        assert_eq!(plan.input, "-");
        assert_eq!(plan.output, None);
        assert_eq!(plan.format, ArtifactFormat::Svg);
        assert_eq!(plan.options.label_style, LabelStyle::Compact);
    }

    #[test]
    fn validation_reports_record_number_and_code() {
        let result = validate_source("[1], T:a\n[1] not-a-valid-line\n", false);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "relgraph/error/malformed-record");
        assert_eq!(result.errors[0].record, Some(2));
        assert_eq!(result.errors[0].line, Some(2));
    }

    #[test]
    fn validation_counts_lines_past_comments_and_blanks() {
        let source = "# header\n\n[1], T:a\n\n[1] not-a-valid-line\n";
        let result = validate_source(source, false);
        assert_eq!(result.errors[0].record, Some(2));
        assert_eq!(result.errors[0].line, Some(5));
        assert!(result.errors[0].message.starts_with("line 5: "));

        let redeclared = validate_source("# header\n[1], T:a\n\n[1], T:b\n", false);
        assert_eq!(
            redeclared.warnings[0].message,
            "Line 4: entity [1] redeclared; later declaration wins"
        );
    }

    #[test]
    fn strict_validation_fails_on_redeclaration() {
        let source = "[1], T:a\n[1], T:b\n";
        assert!(validate_source(source, false).valid);
        let strict = validate_source(source, true);
        assert!(!strict.valid);
        assert_eq!(strict.warnings[0].code, "relgraph/warning/redeclared-entity");
    }

    #[test]
    fn warnings_are_categorized() {
        assert_eq!(categorize_warning("something else"), "relgraph/warning/other");
    }
}
