//! # Runner 模块
//!
//! 把 `Action` 值树编译为带状态的执行树，并按归一化时间推进。

use crate::graph::{Camera, NodeId, SceneGraph, TileGrid};
use crate::math::{Size, Vec2};

use super::{Action, Signal};

/// 完成判定的时间容差（秒），吸收逐帧累加 `dt` 的浮点误差
const TIME_EPSILON: f32 = 1e-4;

/// 执行上下文
pub(crate) struct ActionContext<'a> {
    pub graph: &'a mut SceneGraph,
    pub target: NodeId,
    pub viewport: Size,
    pub signals: &'a mut Vec<Signal>,
}

/// 动作开始时目标节点的快照
#[derive(Debug, Clone)]
struct StartState {
    position: Vec2,
    scale_x: f32,
    scale_y: f32,
    rotation: f32,
    opacity: u8,
    tile_order: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildState {
    Idle,
    Running,
    Done,
}

#[derive(Debug)]
enum RunNode {
    Interval {
        action: Action,
        start: Option<StartState>,
    },
    Instant {
        action: Action,
        fired: bool,
    },
    Sequence {
        children: Vec<RunNode>,
        durations: Vec<f32>,
        states: Vec<ChildState>,
        total: f32,
    },
    Spawn {
        children: Vec<RunNode>,
        durations: Vec<f32>,
        total: f32,
    },
    Ease {
        easing: super::EasingFunction,
        inner: Box<RunNode>,
    },
    Reverse {
        inner: Box<RunNode>,
    },
}

impl RunNode {
    fn compile(action: &Action) -> Self {
        match action {
            Action::Sequence(actions) => {
                let durations: Vec<f32> = actions.iter().map(Action::duration).collect();
                RunNode::Sequence {
                    children: actions.iter().map(RunNode::compile).collect(),
                    states: vec![ChildState::Idle; actions.len()],
                    total: durations.iter().sum(),
                    durations,
                }
            }
            Action::Spawn(actions) => {
                let durations: Vec<f32> = actions.iter().map(Action::duration).collect();
                RunNode::Spawn {
                    children: actions.iter().map(RunNode::compile).collect(),
                    total: durations.iter().copied().fold(0.0, f32::max),
                    durations,
                }
            }
            Action::Ease { easing, inner } => RunNode::Ease {
                easing: *easing,
                inner: Box::new(RunNode::compile(inner)),
            },
            Action::ReverseTime(inner) => RunNode::Reverse {
                inner: Box::new(RunNode::compile(inner)),
            },
            instant if instant.is_instant() => RunNode::Instant {
                action: instant.clone(),
                fired: false,
            },
            interval => RunNode::Interval {
                action: interval.clone(),
                start: None,
            },
        }
    }

    fn start(&mut self, ctx: &mut ActionContext<'_>) {
        match self {
            RunNode::Interval { action, start } => {
                *start = snapshot(action, ctx);
            }
            RunNode::Instant { fired, .. } => *fired = false,
            RunNode::Sequence { states, .. } => {
                states.iter_mut().for_each(|s| *s = ChildState::Idle);
            }
            RunNode::Spawn { children, .. } => {
                for child in children {
                    child.start(ctx);
                }
            }
            RunNode::Ease { inner, .. } | RunNode::Reverse { inner } => inner.start(ctx),
        }
    }

    fn stop(&mut self, ctx: &mut ActionContext<'_>) {
        match self {
            RunNode::Sequence {
                children, states, ..
            } => {
                for (child, state) in children.iter_mut().zip(states.iter_mut()) {
                    if *state == ChildState::Running {
                        child.stop(ctx);
                        *state = ChildState::Done;
                    }
                }
            }
            RunNode::Spawn { children, .. } => {
                for child in children {
                    child.stop(ctx);
                }
            }
            RunNode::Ease { inner, .. } | RunNode::Reverse { inner } => inner.stop(ctx),
            RunNode::Interval { .. } | RunNode::Instant { .. } => {}
        }
    }

    fn update(&mut self, t: f32, ctx: &mut ActionContext<'_>) {
        match self {
            RunNode::Interval { action, start } => {
                if let Some(start) = start {
                    apply_interval(action, start, t, ctx);
                }
            }
            RunNode::Instant { action, fired } => {
                if !*fired {
                    *fired = true;
                    fire_instant(action, ctx);
                }
            }
            RunNode::Sequence {
                children,
                durations,
                states,
                total,
            } => {
                if children.is_empty() {
                    return;
                }
                let (index, local) = locate(durations, *total, t);

                // 补完已跨越的子动作
                for i in 0..index {
                    match states[i] {
                        ChildState::Idle => {
                            children[i].start(ctx);
                            children[i].update(1.0, ctx);
                            children[i].stop(ctx);
                        }
                        ChildState::Running => {
                            children[i].update(1.0, ctx);
                            children[i].stop(ctx);
                        }
                        ChildState::Done => continue,
                    }
                    states[i] = ChildState::Done;
                }
                // 时间倒退时回卷后面的子动作
                for i in (index + 1..children.len()).rev() {
                    if states[i] == ChildState::Running {
                        children[i].update(0.0, ctx);
                        children[i].stop(ctx);
                        states[i] = ChildState::Idle;
                    }
                }

                if states[index] != ChildState::Running {
                    children[index].start(ctx);
                    states[index] = ChildState::Running;
                }
                children[index].update(local, ctx);
            }
            RunNode::Spawn {
                children,
                durations,
                total,
            } => {
                for (child, &duration) in children.iter_mut().zip(durations.iter()) {
                    let local = if *total <= 0.0 || duration <= 0.0 {
                        1.0
                    } else {
                        (t * *total / duration).min(1.0)
                    };
                    child.update(local, ctx);
                }
            }
            RunNode::Ease { easing, inner } => inner.update(easing.apply(t), ctx),
            RunNode::Reverse { inner } => inner.update(1.0 - t, ctx),
        }
    }
}

/// 定位 `t` 所在的子动作及其局部时间
fn locate(durations: &[f32], total: f32, t: f32) -> (usize, f32) {
    let last = durations.len() - 1;
    if total <= 0.0 {
        return (last, 1.0);
    }
    let time = t * total;
    let mut acc = 0.0;
    for (i, &duration) in durations.iter().enumerate() {
        if time < acc + duration || i == last {
            let local = if duration > 0.0 {
                ((time - acc) / duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            return (i, local);
        }
        acc += duration;
    }
    (last, 1.0)
}

fn snapshot(action: &Action, ctx: &mut ActionContext<'_>) -> Option<StartState> {
    let node = ctx.graph.get_mut(ctx.target)?;
    let mut tile_order = Vec::new();
    if let Action::Grid { effect, .. } = action {
        let size = effect.grid_size();
        if node.grid.as_ref().is_none_or(|grid| grid.size() != size) {
            node.grid = Some(TileGrid::new(size));
        }
        tile_order = effect.tile_order();
    }
    Some(StartState {
        position: node.position,
        scale_x: node.scale_x,
        scale_y: node.scale_y,
        rotation: node.rotation,
        opacity: node.opacity,
        tile_order,
    })
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn opacity_at(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn apply_interval(action: &Action, start: &StartState, t: f32, ctx: &mut ActionContext<'_>) {
    let viewport = ctx.viewport;
    let Some(node) = ctx.graph.get_mut(ctx.target) else {
        return;
    };
    match *action {
        Action::MoveTo { to, .. } => node.position = start.position.lerp(to, t),
        Action::MoveBy { delta, .. } => node.position = start.position + delta.scaled(t),
        Action::JumpBy {
            delta,
            height,
            jumps,
            ..
        } => {
            let frac = (t * jumps as f32) % 1.0;
            let y = height * 4.0 * frac * (1.0 - frac) + delta.y * t;
            node.position = start.position + Vec2::new(delta.x * t, y);
        }
        Action::ScaleTo { to, .. } => {
            node.scale_x = lerp(start.scale_x, to, t);
            node.scale_y = lerp(start.scale_y, to, t);
        }
        Action::ScaleBy { factor, .. } => {
            node.scale_x = lerp(start.scale_x, start.scale_x * factor, t);
            node.scale_y = lerp(start.scale_y, start.scale_y * factor, t);
        }
        Action::RotateBy { degrees, .. } => node.rotation = start.rotation + degrees * t,
        Action::FadeTo { opacity, .. } => {
            node.opacity = opacity_at(lerp(start.opacity as f32, opacity as f32, t));
        }
        Action::FadeIn { .. } => node.opacity = opacity_at(255.0 * t),
        Action::FadeOut { .. } => node.opacity = opacity_at(255.0 * (1.0 - t)),
        Action::OrbitCamera(orbit) => {
            let radius = (orbit.radius + orbit.delta_radius * t) * Camera::Z_EYE;
            let zenith = (orbit.angle_z + orbit.delta_angle_z * t).to_radians();
            let azimuth = (orbit.angle_x + orbit.delta_angle_x * t).to_radians();
            node.camera.set_eye_spherical(radius, zenith, azimuth);
        }
        Action::Grid { effect, .. } => {
            if let Some(grid) = node.grid.as_mut() {
                effect.apply(t, grid, viewport, &start.tile_order);
            }
        }
        _ => {}
    }
}

fn fire_instant(action: &Action, ctx: &mut ActionContext<'_>) {
    match action {
        Action::Show => ctx.graph.set_visible(ctx.target, true),
        Action::Hide => ctx.graph.set_visible(ctx.target, false),
        Action::Call(signal) => ctx.signals.push(*signal),
        Action::StopGrid => {
            ctx.graph.stop_grid(ctx.target);
        }
        _ => {}
    }
}

/// 顶层执行器：累加时间并驱动执行树
#[derive(Debug)]
pub(crate) struct ActionRunner {
    root: RunNode,
    duration: f32,
    elapsed: f32,
}

impl ActionRunner {
    pub fn new(action: &Action) -> Self {
        Self {
            root: RunNode::compile(action),
            duration: action.duration(),
            elapsed: 0.0,
        }
    }

    /// 捕获起始状态
    pub fn start(&mut self, ctx: &mut ActionContext<'_>) {
        self.root.start(ctx);
    }

    /// 推进 `dt` 秒，返回是否已完成
    ///
    /// 时长为 0 的动作在第一次推进时即完成。
    pub fn step(&mut self, dt: f32, ctx: &mut ActionContext<'_>) -> bool {
        self.elapsed += dt.max(0.0);
        let t = if self.duration <= 0.0 || self.elapsed + TIME_EPSILON >= self.duration {
            1.0
        } else {
            self.elapsed / self.duration
        };
        self.root.update(t, ctx);
        if t >= 1.0 {
            self.root.stop(ctx);
            true
        } else {
            false
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::EasingFunction;

    const VIEWPORT: Size = Size::new(1280.0, 720.0);

    fn run_to_end(
        action: &Action,
        graph: &mut SceneGraph,
        target: NodeId,
        dt: f32,
    ) -> (usize, Vec<Signal>) {
        let mut signals = Vec::new();
        let mut runner = ActionRunner::new(action);
        let mut ctx = ActionContext {
            graph,
            target,
            viewport: VIEWPORT,
            signals: &mut signals,
        };
        runner.start(&mut ctx);
        let mut ticks = 0;
        loop {
            ticks += 1;
            if runner.step(dt, &mut ctx) {
                break;
            }
            assert!(ticks < 10_000, "action never completed");
        }
        (ticks, signals)
    }

    #[test]
    fn test_move_by_completes_in_sixty_ticks() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let action = Action::move_by(1.0, Vec2::new(100.0, -50.0));

        let (ticks, _) = run_to_end(&action, &mut graph, node, 1.0 / 60.0);
        assert_eq!(ticks, 60);
        assert_eq!(graph.get(node).unwrap().position, Vec2::new(100.0, -50.0));
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let signal = Signal::new(node, "done");
        let action = Action::sequence(vec![
            Action::scale_to(0.0, 0.5),
            Action::delay(0.0),
            Action::call(signal),
        ]);

        let (ticks, signals) = run_to_end(&action, &mut graph, node, 1.0 / 60.0);
        assert_eq!(ticks, 1);
        assert_eq!(signals, vec![signal]);
        assert_eq!(graph.get(node).unwrap().scale(), 0.5);
    }

    #[test]
    fn test_sequence_fires_call_once_at_end() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let signal = Signal::new(node, "finish");
        let action = Action::sequence(vec![
            Action::delay(0.5),
            Action::Hide,
            Action::delay(0.5),
            Action::call(signal),
        ]);

        let (_, signals) = run_to_end(&action, &mut graph, node, 0.1);
        assert_eq!(signals.len(), 1);
        assert!(!graph.get(node).unwrap().visible);
    }

    #[test]
    fn test_sequence_starts_children_lazily() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        // 第二段 MoveBy 从第一段结束的位置开始
        let action = Action::sequence(vec![
            Action::move_to(0.5, Vec2::new(10.0, 0.0)),
            Action::move_by(0.5, Vec2::new(5.0, 5.0)),
        ]);

        run_to_end(&action, &mut graph, node, 0.05);
        assert_eq!(graph.get(node).unwrap().position, Vec2::new(15.0, 5.0));
    }

    #[test]
    fn test_spawn_ends_with_longest_branch() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let action = Action::spawn(vec![
            Action::rotate_by(0.5, 90.0),
            Action::scale_to(1.0, 2.0),
        ]);

        let mut signals = Vec::new();
        let mut runner = ActionRunner::new(&action);
        let mut ctx = ActionContext {
            graph: &mut graph,
            target: node,
            viewport: VIEWPORT,
            signals: &mut signals,
        };
        runner.start(&mut ctx);
        assert!(!runner.step(0.5, &mut ctx));
        assert_eq!(ctx.graph.get(node).unwrap().rotation, 90.0);
        assert!(runner.step(0.5, &mut ctx));
        assert_eq!(ctx.graph.get(node).unwrap().scale(), 2.0);
    }

    #[test]
    fn test_jump_by_peaks_between_jumps() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let action = Action::jump_by(1.0, Vec2::new(-100.0, 0.0), 25.0, 2);

        let mut signals = Vec::new();
        let mut runner = ActionRunner::new(&action);
        let mut ctx = ActionContext {
            graph: &mut graph,
            target: node,
            viewport: VIEWPORT,
            signals: &mut signals,
        };
        runner.start(&mut ctx);
        // t = 0.25 → 第一跳顶点
        runner.step(0.25, &mut ctx);
        let position = ctx.graph.get(node).unwrap().position;
        assert!((position.y - 25.0).abs() < 1e-4);
        assert!((position.x + 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_reverse_time_runs_backwards() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let action = Action::reverse_time(Action::move_to(1.0, Vec2::new(100.0, 0.0)));

        let mut signals = Vec::new();
        let mut runner = ActionRunner::new(&action);
        let mut ctx = ActionContext {
            graph: &mut graph,
            target: node,
            viewport: VIEWPORT,
            signals: &mut signals,
        };
        runner.start(&mut ctx);
        runner.step(0.25, &mut ctx);
        assert_eq!(ctx.graph.get(node).unwrap().position.x, 75.0);
        runner.step(0.75, &mut ctx);
        assert_eq!(ctx.graph.get(node).unwrap().position.x, 0.0);
    }

    #[test]
    fn test_ease_out_is_non_linear() {
        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let action = Action::ease(
            EasingFunction::EaseOut(2.0),
            Action::move_to(1.0, Vec2::new(100.0, 0.0)),
        );

        let mut signals = Vec::new();
        let mut runner = ActionRunner::new(&action);
        let mut ctx = ActionContext {
            graph: &mut graph,
            target: node,
            viewport: VIEWPORT,
            signals: &mut signals,
        };
        runner.start(&mut ctx);
        runner.step(0.25, &mut ctx);
        // sqrt(0.25) = 0.5
        assert!((ctx.graph.get(node).unwrap().position.x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_stop_grid_releases_grid() {
        use crate::action::GridEffect;
        use crate::graph::GridSize;

        let mut graph = SceneGraph::new();
        let node = graph.create_scene();
        let action = Action::sequence(vec![
            Action::grid(
                0.5,
                GridEffect::TurnOffTiles {
                    grid: GridSize::new(4, 4),
                    seed: 1,
                },
            ),
            Action::StopGrid,
        ]);

        let mut signals = Vec::new();
        let mut runner = ActionRunner::new(&action);
        let mut ctx = ActionContext {
            graph: &mut graph,
            target: node,
            viewport: VIEWPORT,
            signals: &mut signals,
        };
        runner.start(&mut ctx);
        runner.step(0.25, &mut ctx);
        assert_eq!(
            ctx.graph.get(node).unwrap().grid.as_ref().unwrap().hidden_count(),
            8
        );
        assert!(runner.step(0.25, &mut ctx));
        assert!(ctx.graph.get(node).unwrap().grid.is_none());
    }
}
