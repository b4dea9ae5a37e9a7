use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use metatemplate_cli::{Config, Settings, build_cmd, index_cmd, parse_assignment, preview_cmd};
use metatemplate_compiler::{CssStrategy, Language};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LanguageArg {
    Typescript,
    Javascript,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CssArg {
    StyledComponents,
    ImportCss,
    None,
}

#[derive(Parser)]
#[command(name = "metatemplate", version, about = "Compile HTML + CSS templates into other formats")]
struct Cli {
    /// Path to a config file (default: ./metatemplate.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile templates into every requested format.
    Build {
        /// .html files or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output directory (default: target/metatemplate)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Format id, repeatable (default: all)
        #[arg(long = "format")]
        formats: Vec<String>,
        /// Language for React formats
        #[arg(long, value_enum)]
        react_language: Option<LanguageArg>,
        /// CSS strategy for React formats
        #[arg(long, value_enum)]
        react_css: Option<CssArg>,
    },
    /// Regenerate index files from an existing output directory.
    Index {
        out_dir: PathBuf,
        #[arg(long = "format")]
        formats: Vec<String>,
    },
    /// Render a template with values as plain HTML.
    Preview {
        input: PathBuf,
        /// key=value, repeatable
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// JSON object of values
        #[arg(long)]
        values_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Build {
            inputs,
            out_dir,
            formats,
            react_language,
            react_css,
        } => {
            let mut settings = Settings::resolve(&config, &formats, out_dir.as_deref())?;
            if react_language.is_some() || react_css.is_some() {
                let mut react = settings.compile.react.unwrap_or_default();
                if let Some(language) = react_language {
                    react.language = match language {
                        LanguageArg::Typescript => Language::TypeScript,
                        LanguageArg::Javascript => Language::JavaScript,
                    };
                }
                if let Some(css) = react_css {
                    react.css = match css {
                        CssArg::StyledComponents => CssStrategy::StyledComponents,
                        CssArg::ImportCss => CssStrategy::ImportCss,
                        CssArg::None => CssStrategy::None,
                    };
                }
                settings.compile.react = Some(react);
            }
            for path in build_cmd(&inputs, &settings)? {
                println!("Generated: {}", path.display());
            }
        }
        Commands::Index { out_dir, formats } => {
            let settings = Settings::resolve(&config, &formats, Some(&out_dir))?;
            for path in index_cmd(&settings.out_dir, &settings.formats, &settings.compile)? {
                println!("Generated: {}", path.display());
            }
        }
        Commands::Preview {
            input,
            values,
            values_file,
        } => {
            println!("{}", preview_cmd(&input, values_file.as_deref(), &values)?);
        }
    }
    Ok(())
}
