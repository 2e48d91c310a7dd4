use std::path::PathBuf;

use plugin::{LineOffset, Rewritten, category_rewrite, init_logging, row_label};
use sugar::desugar;
use tracing::info;

const USAGE: &str = "usage: bess-desugar [--header] [--rows] [--arrows] <file>

Prints the text a language backend sees for a BESS script.

  --header   prepend the star-import header line like the plugin does
  --rows     list rows touched by a rewrite
  --arrows   list the positions of pipeline arrows
  -h, --help show this message";

#[derive(Debug, Default)]
struct Options {
    header: bool,
    rows: bool,
    arrows: bool,
    path: Option<PathBuf>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--header" => options.header = true,
            "--rows" => options.rows = true,
            "--arrows" => options.arrows = true,
            flag if flag.starts_with('-') && flag != "-" => {
                return Err(format!("unknown option: {flag}"));
            }
            _ if options.path.is_some() => return Err("more than one input file".to_string()),
            path => options.path = Some(PathBuf::from(path)),
        }
    }
    if options.path.is_none() {
        return Err("missing input file".to_string());
    }
    Ok(Some(options))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{USAGE}");
            return Ok(());
        }
        Err(message) => {
            eprintln!("{message}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    let Some(path) = options.path else {
        return Ok(());
    };

    let source = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(&path)?
    };

    let rewritten = if options.header {
        Rewritten::from_source(&source)
    } else {
        let desugared = desugar(&source);
        Rewritten {
            text: desugared.text,
            offset: LineOffset::identity(),
            sugar_rows: desugared.sugar_rows,
            arrows: desugared.arrows,
        }
    };
    if options.header && !rewritten.offset.header_injected() {
        info!(
            "{} {} already starts with the header line",
            category_rewrite(),
            path.display()
        );
    }

    print!("{}", rewritten.text);

    if options.rows {
        println!();
        println!("{} rows:", category_rewrite());
        for row in rewritten.sugar_rows.iter() {
            println!("{}", row_label(row));
        }
    }
    if options.arrows {
        println!();
        println!("{} arrows:", category_rewrite());
        for arrow in &rewritten.arrows {
            println!("{}:{}", row_label(arrow.row), arrow.col);
        }
    }
    Ok(())
}
