use clap::{Args as ClapArgs, Parser, Subcommand};
use docfield_core::{
    FieldPath, FieldUpdate, MissingKey, PlaceholderRenderer, RenderOpts, Values,
    apply_field_func, apply_field_templates,
};
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "docfield",
    about = "Render templated string fields inside JSON documents by field path",
    version
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Render fields as templates; prints or writes with --out / --in-place
    Render(RenderArgs),
    /// Print the string value(s) a field path resolves to
    Get(GetArgs),
}

#[derive(ClapArgs, Debug)]
struct RenderArgs {
    /// JSON file, or a directory whose *.json files are all rendered
    path: PathBuf,
    /// Field path, e.g. spec.containers.[].image (repeatable)
    #[arg(long = "field", required = true)]
    fields: Vec<String>,
    /// Substitution value as name=value (repeatable)
    #[arg(long = "set", value_parser = parse_key_val)]
    values: Vec<(String, String)>,
    /// Optional output .json path to write; otherwise prints to stdout
    #[arg(long, conflicts_with = "in_place")]
    out: Option<PathBuf>,
    /// Overwrite the input file(s)
    #[arg(long, default_value_t = false)]
    in_place: bool,
    /// Render unknown names as empty strings instead of failing
    #[arg(long, default_value_t = false)]
    lenient: bool,
}

#[derive(ClapArgs, Debug)]
struct GetArgs {
    /// JSON file to load
    path: PathBuf,
    /// Field path, e.g. spec.args.[]
    #[arg(long)]
    field: String,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{}`", s))?;
    if k.is_empty() {
        return Err(format!("empty name in `{}`", s));
    }
    Ok((k.to_string(), v.to_string()))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Render(a) => cmd_render(a),
        Cmd::Get(a) => cmd_get(a),
    }
}

fn parse_fields(fields: &[String]) -> Vec<FieldPath> {
    fields
        .iter()
        .map(|f| {
            f.parse::<FieldPath>().unwrap_or_else(|e| {
                eprintln!("invalid --field: {}", e);
                std::process::exit(3);
            })
        })
        .collect()
}

fn cmd_render(args: RenderArgs) {
    let paths = parse_fields(&args.fields);
    let values: Values = args.values.into_iter().collect();
    let renderer = PlaceholderRenderer::new(RenderOpts {
        missing_key: if args.lenient { MissingKey::Empty } else { MissingKey::Error },
    });

    let p = args.path.as_path();
    if p.is_dir() {
        if args.out.is_some() {
            eprintln!("--out needs a single file input; use --in-place for directories");
            std::process::exit(3);
        }
        let files = docfield_core::find_json_files(p);
        info!(dir = %p.display(), files = files.len(), "rendering directory");
        let mut rendered = serde_json::Map::new();
        for f in &files {
            let v = render_file(f, &paths, &values, &renderer);
            if args.in_place {
                write_or_exit(f, &v);
            } else {
                let name = f.strip_prefix(p).unwrap_or(f).to_string_lossy().replace('\\', "/");
                rendered.insert(name, v);
            }
        }
        if !args.in_place {
            print_json(&serde_json::Value::Object(rendered));
        }
    } else if p.is_file() {
        let v = render_file(p, &paths, &values, &renderer);
        match (args.out, args.in_place) {
            (Some(out), _) => write_or_exit(&out, &v),
            (None, true) => write_or_exit(p, &v),
            (None, false) => print_json(&v),
        }
    } else {
        eprintln!("error: not found: {}", p.display());
        std::process::exit(2);
    }
}

fn render_file(
    path: &Path,
    fields: &[FieldPath],
    values: &Values,
    renderer: &PlaceholderRenderer,
) -> serde_json::Value {
    let mut v = docfield_core::load_json_file(path).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });
    apply_field_templates(&mut v, fields, values, renderer).unwrap_or_else(|e| {
        error!(file = %path.display(), "render failed");
        eprintln!("error: {}: {}", path.display(), e);
        std::process::exit(4);
    });
    v
}

fn cmd_get(args: GetArgs) {
    let field = parse_fields(std::slice::from_ref(&args.field)).remove(0);
    let mut v = docfield_core::load_json_file(&args.path).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });
    let mut found = Vec::new();
    apply_field_func(&mut v, &field, |s| {
        found.push(s.to_string());
        Ok::<_, Infallible>(FieldUpdate::Keep)
    })
    .unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(4);
    });
    if found.is_empty() {
        eprintln!("not found: {}", args.field);
        std::process::exit(3);
    }
    for s in found {
        println!("{}", s);
    }
}

fn print_json(v: &serde_json::Value) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(5);
        }
    }
}

fn write_or_exit(path: &Path, v: &serde_json::Value) {
    docfield_core::write_json_to_file(path, v).unwrap_or_else(|e| {
        eprintln!("error writing: {}", e);
        std::process::exit(5);
    });
}
