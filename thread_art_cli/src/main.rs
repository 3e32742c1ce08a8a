use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use num_traits::AsPrimitive;
use thread_art::{
    verboser::{Message, Verboser},
    Background, Computation, Config, Float, Target,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image path.
    #[arg()]
    input: PathBuf,

    /// TOML file with run parameters. Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of pulls.
    #[arg(short, long)]
    pulls: Option<usize>,

    /// Keep one perimeter pixel out of this many as a peg.
    #[arg(short, long)]
    nail_step: Option<usize>,

    /// Side in pixels the image is resized to.
    #[arg(short, long)]
    side_len: Option<usize>,

    /// Ink per pull, negative darkens.
    #[arg(long, allow_hyphen_values = true)]
    strength: Option<f64>,

    #[arg(short, long)]
    background: Option<BackgroundArg>,

    /// Radius multiplier along the rows.
    #[arg(long)]
    r1: Option<f64>,

    /// Radius multiplier along the columns.
    #[arg(long)]
    r2: Option<f64>,

    #[arg(long)]
    dampening: Option<f64>,

    /// Minimum ring distance, in pegs, between linked pegs.
    #[arg(long)]
    min_peg_distance: Option<usize>,

    #[arg(long)]
    allow_self_pull: bool,

    /// Save a snapshot every this many pulls, 0 disables them.
    #[arg(short, long, default_value_t = 50)]
    interval: usize,

    /// Physical board side used to estimate the thread length.
    #[arg(long, default_value_t = 70.0)]
    board_size_cm: f64,

    /// Precision of calculations (Single/Double).
    #[arg(long, default_value_t = Precision::Single)]
    precision: Precision,

    /// Also write Final.svg.
    #[arg(long)]
    svg: bool,

    #[arg(long, default_value_t = 0.5)]
    svg_line_width: f64,
}

#[derive(Clone, Copy, Debug)]
enum Precision {
    Single,
    Double,
}

impl ValueEnum for Precision {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Single, Self::Double]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Single => clap::builder::PossibleValue::new("Single")
                .alias("single")
                .alias("f32"),
            Self::Double => clap::builder::PossibleValue::new("Double")
                .alias("double")
                .alias("f64"),
        })
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("Single"),
            Self::Double => f.write_str("Double"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum BackgroundArg {
    Black,
    White,
}

impl ValueEnum for BackgroundArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Black, Self::White]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Black => clap::builder::PossibleValue::new("Black").alias("black"),
            Self::White => clap::builder::PossibleValue::new("White").alias("white"),
        })
    }
}

impl From<BackgroundArg> for Background {
    fn from(value: BackgroundArg) -> Self {
        match value {
            BackgroundArg::Black => Background::Black,
            BackgroundArg::White => Background::White,
        }
    }
}

/// Reports progress through `tracing`, one event per `interval` pulls.
struct TracingVerboser {
    interval: usize,
}

impl Verboser for TracingVerboser {
    fn verbose(&mut self, message: Message) {
        match message {
            Message::PlacingPegs(count) => tracing::info!(count, "pegs placed"),
            Message::Computing(_) => {}
            Message::Pulled(step, peg) => {
                if self.interval > 0 && step % self.interval == 0 {
                    tracing::info!(step, peg, "pulled");
                }
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
    let args = Args::parse();
    let folder = run(&args)?;
    tracing::info!(folder = %folder.display(), "done");
    Ok(())
}

fn run(args: &Args) -> Result<PathBuf> {
    let config = load_config(args)?;
    match args.precision {
        Precision::Single => with_precision::<f32>(args, config),
        Precision::Double => with_precision::<f64>(args, config),
    }
}

fn with_precision<S: Float>(args: &Args, config: Config<f64>) -> Result<PathBuf>
where
    f32: AsPrimitive<S>,
    f64: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    isize: AsPrimitive<S>,
    S: AsPrimitive<u8>,
{
    let config = config.map(|value| -> S { value.as_() });
    config.validate()?;

    let image = image::open(&args.input)
        .with_context(|| format!("Failed opening {}", args.input.display()))?;

    let base = args
        .input
        .parent()
        .unwrap_or(Path::new("."))
        .join("Output");
    let folder = unique_output_folder(&base);
    fs::create_dir_all(&folder)
        .with_context(|| format!("Output directory {} can not be created", folder.display()))?;
    let target = Target::from_image(&image, config.side_len, config.dampening)?;
    let computation = thread_art::compute(
        target,
        config,
        &mut TracingVerboser {
            interval: args.interval,
        },
    )?;

    save_snapshots(&computation, &folder, args.interval)?;
    let final_path = folder.join("Final.jpg");
    computation
        .build_luma(usize::MAX)?
        .save(&final_path)
        .with_context(|| format!("Failed saving {}", final_path.display()))?;

    let sequence_path = folder.join("thread_sequence.txt");
    fs::write(
        &sequence_path,
        computation.build_instructions(args.board_size_cm.as_()),
    )
    .with_context(|| format!("Failed saving {}", sequence_path.display()))?;

    if args.svg {
        let svg_path = folder.join("Final.svg");
        svg::save(&svg_path, &computation.build_svg(args.svg_line_width.as_()))
            .with_context(|| format!("Failed saving {}", svg_path.display()))?;
    }

    tracing::info!(
        pulls = computation.pulls(),
        unique_pegs = computation.unique_pegs(),
        "outputs written"
    );
    Ok(folder)
}

/// File config, or defaults, with every flag given on the command line on
/// top.
fn load_config(args: &Args) -> Result<Config<f64>> {
    let mut config: Config<f64> = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed reading {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(pulls) = args.pulls {
        config.pull_budget = pulls;
    }
    if let Some(nail_step) = args.nail_step {
        config.nail_step = nail_step;
    }
    if let Some(side_len) = args.side_len {
        config.side_len = side_len;
    }
    if let Some(strength) = args.strength {
        config.line_strength = strength;
    }
    if let Some(background) = args.background {
        config.background = background.into();
    }
    if let Some(r1) = args.r1 {
        config.r1_multiplier = r1;
    }
    if let Some(r2) = args.r2 {
        config.r2_multiplier = r2;
    }
    if let Some(dampening) = args.dampening {
        config.dampening = dampening;
    }
    if let Some(min_peg_distance) = args.min_peg_distance {
        config.min_peg_distance = min_peg_distance;
    }
    if args.allow_self_pull {
        config.allow_self_pull = true;
    }
    Ok(config)
}

/// `base` if it is free, otherwise the first free `base_1`, `base_2`, ...
fn unique_output_folder(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let name = base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (1..)
        .map(|counter| base.with_file_name(format!("{name}_{counter}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| base.to_path_buf())
}

/// Pull counts at which a snapshot is taken.
fn snapshot_steps(pulls: usize, interval: usize) -> Vec<usize> {
    if interval == 0 {
        return Vec::new();
    }
    (interval..=pulls).step_by(interval).collect()
}

fn save_snapshots<S: Float>(
    computation: &Computation<S>,
    folder: &Path,
    interval: usize,
) -> Result<()>
where
    isize: AsPrimitive<S>,
    S: AsPrimitive<u8>,
{
    for step in snapshot_steps(computation.pulls(), interval) {
        let path = folder.join(format!("{step}.jpg"));
        computation
            .build_luma(step + 1)?
            .save(&path)
            .with_context(|| format!("Failed saving snapshot {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("thread_art").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn output_folder_gets_a_suffix_when_taken() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("Output");
        assert_eq!(unique_output_folder(&base), base);
        fs::create_dir(&base).unwrap();
        assert_eq!(unique_output_folder(&base), dir.path().join("Output_1"));
        fs::create_dir(dir.path().join("Output_1")).unwrap();
        assert_eq!(unique_output_folder(&base), dir.path().join("Output_2"));
    }

    #[test]
    fn snapshots_follow_the_interval() {
        assert_eq!(snapshot_steps(120, 50), vec![50, 100]);
        assert_eq!(snapshot_steps(50, 50), vec![50]);
        assert_eq!(snapshot_steps(49, 50), Vec::<usize>::new());
        assert_eq!(snapshot_steps(120, 0), Vec::<usize>::new());
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "pull_budget = 10\nbackground = \"black\"\nline_strength = 0.3\n",
        )
        .unwrap();
        let config = load_config(&args(&[
            "in.png",
            "--config",
            path.to_str().unwrap(),
            "--pulls",
            "20",
            "--r2",
            "0.5",
        ]))
        .unwrap();
        assert_eq!(config.pull_budget, 20);
        assert_eq!(config.background, Background::Black);
        assert_eq!(config.line_strength, 0.3);
        assert_eq!(config.r2_multiplier, 0.5);
        assert_eq!(config.nail_step, 4);
    }

    #[test]
    fn negative_strength_flag_parses() {
        let config = load_config(&args(&["in.png", "--strength", "-0.25"])).unwrap();
        assert_eq!(config.line_strength, -0.25);
        assert_eq!(
            config,
            Config {
                line_strength: -0.25,
                ..Default::default()
            }
        );
    }

    #[test]
    fn run_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("gradient.png");
        RgbImage::from_fn(40, 32, |x, _| {
            let value = (x * 6) as u8;
            Rgb([value, value, value])
        })
        .save(&input)
        .unwrap();

        let args = args(&[
            input.to_str().unwrap(),
            "--side-len",
            "32",
            "--pulls",
            "30",
            "--interval",
            "10",
            "--svg",
            "--precision",
            "double",
        ]);
        let folder = run(&args).unwrap();
        assert_eq!(folder, dir.path().join("Output"));
        for name in ["10.jpg", "Final.jpg", "thread_sequence.txt", "Final.svg"] {
            assert!(folder.join(name).exists(), "{name} is missing");
        }
        let final_image = image::open(folder.join("Final.jpg")).unwrap();
        assert_eq!((final_image.width(), final_image.height()), (32, 32));
        let text = fs::read_to_string(folder.join("thread_sequence.txt")).unwrap();
        assert!(text.starts_with("Estimated total thread length: "));
        assert!(text.contains("\nThread pull sequence:\n0-"));

        let second = run(&args).unwrap();
        assert_eq!(second, dir.path().join("Output_1"));
    }

    #[test]
    fn missing_input_leaves_no_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.png");
        assert!(run(&args(&[input.to_str().unwrap()])).is_err());
        assert!(!dir.path().join("Output").exists());
    }
}
