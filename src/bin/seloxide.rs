//! Command line front end: run one CSS or `XPath` query over a document.
//!
//! ```text
//! seloxide 'li::text' page.html
//! curl -s https://example.com | seloxide --xpath '//title/text()'
//! seloxide 'a::attr(href)' page.html --re '^https://(.*)$'
//! ```

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use regex::RegexBuilder;
use tracing_subscriber::EnvFilter;

use seloxide::{Error, SelectionBuilder, SelectionList};

/// Select parts of an HTML document with CSS or XPath.
#[derive(Parser, Debug)]
#[command(name = "seloxide", version, about, long_about = None)]
struct Cli {
    /// A CSS selector, or an XPath expression if --xpath is given.
    #[arg(value_name = "EXPRESSION")]
    expr: String,

    /// Input file. Reads standard input when missing.
    #[arg(value_name = "FILE")]
    file: Option<String>,

    /// Treat EXPRESSION as XPath.
    #[arg(long)]
    xpath: bool,

    /// Apply a case-insensitive regular expression to the results.
    #[arg(long = "re", value_name = "PATTERN")]
    pattern: Option<String>,

    /// Input encoding.
    #[arg(long, value_name = "ENCODING", default_value = "utf-8")]
    encoding: String,

    /// Print the result representation instead of plain text.
    #[arg(long)]
    repr: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("seloxide: {msg}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(file: Option<&str>) -> io::Result<Vec<u8>> {
    match file {
        Some(path) if path != "-" => fs::read(path),
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(cli: &Cli) -> Result<Vec<String>, String> {
    let body = read_input(cli.file.as_deref()).map_err(|e| {
        format!(
            "{}: failed to read: {e}",
            cli.file.as_deref().unwrap_or("<stdin>")
        )
    })?;
    let sel = SelectionBuilder::new()
        .body(body)
        .encoding(cli.encoding.as_str())
        .build()
        .map_err(|e| e.to_string())?;

    let result: SelectionList = if cli.xpath {
        sel.xpath(&cli.expr)
    } else {
        sel.css(&cli.expr)
    }
    .map_err(|e: Error| e.to_string())?;

    if let Some(pattern) = &cli.pattern {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| format!("invalid --re pattern: {e}"))?;
        let matches = result.re(&regex, true);
        if cli.repr {
            return Ok(vec![format!("{matches:?}")]);
        }
        return Ok(matches);
    }
    if cli.repr {
        return Ok(vec![format!("{result:?}")]);
    }
    Ok(result.getall())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "seloxide", "li", "page.html", "--xpath", "--re", "a+", "--encoding", "latin1",
            "--repr",
        ]);
        assert_eq!(cli.expr, "li");
        assert_eq!(cli.file.as_deref(), Some("page.html"));
        assert!(cli.xpath && cli.repr);
        assert_eq!(cli.pattern.as_deref(), Some("a+"));
        assert_eq!(cli.encoding, "latin1");
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["seloxide", "p::text"]);
        assert!(cli.file.is_none());
        assert_eq!(cli.encoding, "utf-8");
        assert!(!cli.xpath);
    }
}
