//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与过渡效果的无头模拟。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `kinds`: 列出全部过渡名称
//! - `simulate <name> [duration] [fps]`: 无头运行一次过渡，报告 finish 与换场发生的帧

use std::path::PathBuf;
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};
use tracing::{Level, info};

use scene_transition::{Director, StageConfig, TransitionKind, TransitionRequest};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 输出 debug 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,

    /// 列出全部过渡名称
    Kinds,

    /// 无头运行一次过渡
    Simulate {
        /// 过渡名称（如 slide_in_l、FlipX、fade-tr）
        name: String,

        /// 时长（秒），默认取配置
        duration: Option<f32>,

        /// 帧率
        #[arg(default_value_t = 60.0)]
        fps: f32,

        /// 舞台配置文件（JSON）
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    if let Err(e) = real_main(cli.command) {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::CheckAll => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        Commands::Kinds => {
            for kind in TransitionKind::ALL {
                println!("{kind}");
            }
        }
        Commands::Simulate {
            name,
            duration,
            fps,
            config,
        } => {
            let config = config.map(StageConfig::load).unwrap_or_default();
            let report = simulate(config, &name, duration, fps)?;
            println!("{report}");
        }
    }

    Ok(())
}

//=============================================================================
// simulate 命令实现
//=============================================================================

/// 模拟结果
struct SimulationReport {
    kind: TransitionKind,
    duration: f32,
    fps: f32,
    /// 进入舞台之后第几帧 finish
    finish_frame: Option<u64>,
    /// 进入舞台之后第几帧换场
    swap_frame: Option<u64>,
    /// 过渡期间单帧最多的绘制命令数
    peak_commands: usize,
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |n| n.to_string());
        writeln!(f, "transition:    {}", self.kind)?;
        writeln!(f, "duration:      {:.3}s @ {} fps", self.duration, self.fps)?;
        writeln!(f, "finish frame:  {}", frame(self.finish_frame))?;
        writeln!(f, "swap frame:    {}", frame(self.swap_frame))?;
        write!(f, "peak commands: {}", self.peak_commands)
    }
}

fn simulate(
    config: StageConfig,
    name: &str,
    duration: Option<f32>,
    fps: f32,
) -> anyhow::Result<SimulationReport> {
    if !(fps.is_finite() && fps > 0.0) {
        anyhow::bail!("fps must be positive, got {fps}");
    }
    let kind: TransitionKind = name.parse()?;
    let mut request = TransitionRequest::new(kind);
    if let Some(duration) = duration {
        request = request.with_duration(duration);
    }
    let duration = request
        .duration
        .unwrap_or(config.transitions.default_duration);
    let dt = 1.0 / fps;
    let max_frames = ((duration.max(0.0) * fps).ceil() as u64).saturating_add(fps as u64 + 2);

    let mut director = Director::new(config);
    let outgoing = director.create_scene();
    director.run_with_scene(outgoing);
    director.tick(dt);

    let incoming = director.create_scene();
    let root = director.transition_to(&request, incoming)?;
    director.tick(dt);
    info!(transition = %kind, duration, fps, "Simulating");

    let mut report = SimulationReport {
        kind,
        duration,
        fps,
        finish_frame: None,
        swap_frame: None,
        peak_commands: 0,
    };
    for frame in 1..=max_frames {
        let commands = director.tick(dt).commands.len();
        report.peak_commands = report.peak_commands.max(commands);
        let finished = director
            .transition(root)
            .is_some_and(|t| t.finish_count() > 0);
        if finished && report.finish_frame.is_none() {
            report.finish_frame = Some(frame);
        }
        if director.running_scene() == Some(incoming) {
            report.swap_frame = Some(frame);
            break;
        }
    }

    if report.swap_frame.is_none() {
        anyhow::bail!("{kind} did not swap within {max_frames} frames");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulate_slide() {
        let report = simulate(StageConfig::default(), "slideinl", Some(1.0), 60.0).unwrap();
        assert_eq!(report.finish_frame, Some(60));
        assert_eq!(report.swap_frame, Some(61));
    }

    #[test]
    fn test_simulate_unknown_name() {
        assert!(simulate(StageConfig::default(), "wipe", None, 60.0).is_err());
    }
}
