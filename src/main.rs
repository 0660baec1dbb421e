// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::process;

use pico_args::Arguments;

const HELP: &str = "\
svgres resolves an SVG document into a tree of shapes.

USAGE:
  svgres [OPTIONS] <in-svg>

OPTIONS:
  -h, --help                Prints help information
  -V, --version             Prints version information

  --dpi DPI                 Sets the resolution
                            [default: 96] [possible values: 10..4000]
  --font-size SIZE          Sets the default font size
                            [default: 12] [possible values: 1..192]
  --default-width LENGTH    Sets the fallback viewport width
                            [default: 100]
  --default-height LENGTH   Sets the fallback viewport height
                            [default: 100]
  --strict-namespaces       Ignores elements without the SVG namespace

  --quiet                   Disables warnings

ARGS:
  <in-svg>                  Input file
";

#[derive(Debug)]
struct Args {
    dpi: u32,
    font_size: u32,
    default_width: u32,
    default_height: u32,
    strict_namespaces: bool,
    quiet: bool,
    input: String,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = Arguments::from_env();

    if input.contains(["-h", "--help"]) {
        print!("{}", HELP);
        process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    Ok(Args {
        dpi: input.opt_value_from_fn("--dpi", parse_dpi)?.unwrap_or(96),
        font_size: input
            .opt_value_from_fn("--font-size", parse_font_size)?
            .unwrap_or(12),
        default_width: input
            .opt_value_from_fn("--default-width", parse_length)?
            .unwrap_or(100),
        default_height: input
            .opt_value_from_fn("--default-height", parse_length)?
            .unwrap_or(100),
        strict_namespaces: input.contains("--strict-namespaces"),
        quiet: input.contains("--quiet"),
        input: input.free_from_str()?,
    })
}

fn parse_dpi(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| "invalid number")?;

    if (10..=4000).contains(&n) {
        Ok(n)
    } else {
        Err("DPI out of bounds".to_string())
    }
}

fn parse_font_size(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| "invalid number")?;

    if (1..=192).contains(&n) {
        Ok(n)
    } else {
        Err("font size out of bounds".to_string())
    }
}

fn parse_length(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| "invalid length")?;

    if n > 0 {
        Ok(n)
    } else {
        Err("LENGTH cannot be zero".to_string())
    }
}

fn main() {
    let args = match collect_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {}.", e);
            process::exit(1);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            log::set_max_level(log::LevelFilter::Warn);
        }
    }

    if let Err(e) = process(&args) {
        eprintln!("Error: {}.", e);
        process::exit(1);
    }
}

fn process(args: &Args) -> Result<(), String> {
    let opt = svgres::Options {
        dpi: args.dpi as f64,
        font_size: args.font_size as f64,
        default_size: svgres::Size::new(args.default_width as f64, args.default_height as f64)
            .unwrap(),
        strict_namespaces: args.strict_namespaces,
        ..svgres::Options::default()
    };

    let data = std::fs::read(&args.input).map_err(|e| e.to_string())?;
    let tree = svgres::Tree::from_data(&data, &opt).map_err(|e| e.to_string())?;

    println!(
        "size: {}x{}",
        tree.size.width(),
        tree.size.height()
    );
    print_node(&tree.root, 0);

    Ok(())
}

fn print_node(node: &svgres::Node, depth: usize) {
    let indent = "  ".repeat(depth);

    match *node.borrow() {
        svgres::NodeKind::Group(ref g) => {
            let mut details = String::new();
            if !g.id.is_empty() {
                details.push_str(&format!(" id={:?}", g.id));
            }
            if g.clip_path.is_some() {
                details.push_str(" +clip");
            }
            if let Some(ref filter) = g.filter {
                details.push_str(&format!(" +filter[{}]", filter.primitives.len()));
            }

            println!("{}group{}", indent, details);
        }
        svgres::NodeKind::Shape(ref s) => {
            let paints = match (&s.fill, &s.stroke) {
                (Some(_), Some(_)) => "fill+stroke",
                (Some(_), None) => "fill",
                (None, Some(_)) => "stroke",
                (None, None) => "none",
            };

            println!(
                "{}shape segments={} paint={}{}",
                indent,
                s.data.len(),
                paints,
                if s.id.is_empty() {
                    String::new()
                } else {
                    format!(" id={:?}", s.id)
                }
            );
        }
    }

    for child in node.children() {
        print_node(&child, depth + 1);
    }
}

static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}): {}", target, record.args()),
                log::Level::Warn => eprintln!("Warning (in {}): {}", target, record.args()),
                _ => {}
            }
        }
    }

    fn flush(&self) {}
}
