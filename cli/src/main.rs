use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use clap::Parser;
use log::LevelFilter;
use parse::{declarations_block, parse_file};
use render::{LatexStyle, MatrixEnvironment, RenderOptions, render_all, template};

/// Writes the formulas of a MATLAB script into a LaTeX template.
#[derive(Parser)]
#[command(version)]
struct Options {
    /// Script to convert.
    #[arg(required_unless_present = "directory", conflicts_with = "directory")]
    source: Option<PathBuf>,

    /// Convert every `.m` file in this directory into a `.tex` file next to it.
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// LaTeX document containing a `%labtotextstart` line.
    #[arg(short, long)]
    template: PathBuf,

    /// Defaults to the source path with a `.tex` extension.
    #[arg(short, long, conflicts_with = "directory")]
    output: Option<PathBuf>,

    /// Write calls to anonymous functions as calls instead of substituting
    /// their bodies.
    #[arg(long)]
    no_inline: bool,

    #[arg(long, default_value_t = MatrixEnvironment::Bmatrix)]
    matrix: MatrixEnvironment,

    /// Lines between `% begin - <TAG>` and `% end` are left out.
    #[arg(long, default_value = declarations_block::DEFAULT_TAG)]
    declarations_tag: String,

    /// Log more, repeat for even more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct Converter {
    template: Vec<String>,
    declarations_tag: String,
    render: RenderOptions,
}

impl Converter {
    fn convert(&self, source: &Path, output: &Path) -> anyhow::Result<()> {
        let text = fs::read_to_string(source)
            .with_context(|| format!("failed to read `{}`", source.display()))?;
        let lines = text.lines().collect::<Vec<_>>();

        let block = declarations_block::extract(&lines, &self.declarations_tag);
        if !block.declarations.is_empty() {
            log::info!(
                "{}: leaving out {} declaration lines",
                source.display(),
                block.declarations.len()
            );
        }

        let file = parse_file(&block.remaining)
            .with_context(|| format!("failed to parse `{}`", source.display()))?;
        let rendered = render_all(&file, &self.render);
        let document = template::splice(&self.template, &rendered)?;

        let mut contents = document.join("\n");
        contents.push('\n');
        fs::write(output, contents)
            .with_context(|| format!("failed to write `{}`", output.display()))?;
        log::info!("{} -> {}", source.display(), output.display());
        Ok(())
    }

    /// Converts the `.m` files of `directory`, continuing past failures.
    fn convert_directory(&self, directory: &Path) -> anyhow::Result<()> {
        let mut sources = fs::read_dir(directory)
            .with_context(|| format!("failed to read directory `{}`", directory.display()))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        sources.retain(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "m"));
        sources.sort();

        let mut failed = 0;
        for source in &sources {
            if let Err(error) = self.convert(source, &source.with_extension("tex")) {
                log::error!("{error:#}");
                failed += 1;
            }
        }

        if failed > 0 {
            bail!("{failed} of {} files could not be converted", sources.len());
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let options = Options::parse();

    let level = match options.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let template = fs::read_to_string(&options.template)
        .with_context(|| format!("failed to read `{}`", options.template.display()))?;
    let converter = Converter {
        template: template.lines().map(String::from).collect(),
        declarations_tag: options.declarations_tag,
        render: RenderOptions {
            inline_anonymous_functions: !options.no_inline,
            style: LatexStyle {
                matrix: options.matrix,
                ..LatexStyle::default()
            },
        },
    };

    match (options.directory, options.source) {
        (Some(directory), _) => converter.convert_directory(&directory),
        (None, Some(source)) => {
            let output = options
                .output
                .unwrap_or_else(|| source.with_extension("tex"));
            converter.convert(&source, &output)
        }
        (None, None) => bail!("no source file given"),
    }
}
