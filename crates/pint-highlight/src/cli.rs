//! Command-line front end for `pint-highlight`.
//!
//! Reads source code (or a rendered HTML document with `--document`) from a
//! file or stdin and writes highlighted HTML to stdout.

use std::io::Read;
use std::process::ExitCode;

use facet::Facet;
use pint_highlight::{parse_grammar, render_code_blocks, validate, Options, Registry};

/// Command-line arguments.
#[derive(Facet)]
struct Args {
    /// File to read; stdin when absent.
    #[facet(named, default, short = 'i')]
    input: Option<String>,

    /// Language to highlight with; auto-detected when absent.
    #[facet(named, default, short = 'l')]
    language: Option<String>,

    /// Treat the input as an HTML document and highlight its code blocks.
    #[facet(named, default, short = 'd')]
    document: bool,

    /// Validate every registered grammar and exit.
    #[facet(named, default, short = 'c')]
    check: bool,

    /// Print the selected grammar (Pint by default) as JSON and exit.
    #[facet(named, default)]
    dump: bool,

    /// Extra grammar to register, as a JSON file.
    #[facet(named, default, short = 'g')]
    grammar: Option<String>,

    /// Options file in JSON.
    #[facet(named, default)]
    config: Option<String>,

    /// Log registration and detection details to stderr.
    #[facet(named, default, short = 'v')]
    verbose: bool,
}

fn main() -> ExitCode {
    let args: Args = match facet_args::from_std_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut registry = Registry::with_builtin_languages()?;
    if let Some(path) = &args.config {
        registry.configure(Options::from_json(&std::fs::read_to_string(path)?)?);
    }
    if let Some(path) = &args.grammar {
        registry.register(parse_grammar(&std::fs::read_to_string(path)?)?)?;
    }

    if args.check {
        return Ok(check(&registry));
    }

    if args.dump {
        let name = args.language.as_deref().unwrap_or("pint");
        let grammar = registry
            .get_language(name)
            .ok_or_else(|| format!("unknown language `{name}`"))?;
        println!("{}", grammar.to_json());
        return Ok(ExitCode::SUCCESS);
    }

    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let output = if args.document {
        render_code_blocks(&input, &registry)
    } else {
        let result = match &args.language {
            Some(language) => registry.highlight(&input, language)?,
            None => registry.highlight_auto(&input),
        };
        tracing::debug!(language = %result.language, relevance = result.relevance, "highlighted");
        result.to_html(registry.options().class_prefix())
    };
    print!("{output}");
    Ok(ExitCode::SUCCESS)
}

fn check(registry: &Registry) -> ExitCode {
    let mut failed = false;
    for name in registry.languages() {
        let Some(grammar) = registry.get_language(name) else {
            continue;
        };
        match validate(grammar) {
            Ok(()) => println!("ok: {name}"),
            Err(e) => {
                println!("error: {name}: {e}");
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
