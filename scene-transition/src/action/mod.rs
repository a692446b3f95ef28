//! # Action 模块
//!
//! 以时长参数化的动作原语，以及顺序/并行组合。
//!
//! ## 模型
//!
//! 动作是一棵不可变的值树（`Action`），运行时由 `ActionManager`
//! 编译为带状态的执行树。每个动作接收归一化时间 `t ∈ [0, 1]`：
//! - `Sequence` 按子动作时长切分 `t`，跨越的子动作会被补足到 1
//! - `Spawn` 的时长取最长分支，较短分支提前到达 1
//! - 瞬时动作（`Show`/`Hide`/`Call`/`StopGrid`）只触发一次
//!
//! ```rust,ignore
//! let action = Action::sequence(vec![
//!     Action::scale_to(0.5, 0.5),
//!     Action::jump_by(0.5, Vec2::new(-1280.0, 0.0), 320.0, 2),
//! ]);
//! manager.run_action(&mut graph, viewport, scene, action);
//! ```

mod easing;
mod grid;
mod manager;
mod runner;

pub use easing::EasingFunction;
pub use grid::{GridEffect, TileFadeDirection};
pub use manager::{ActionManager, ActionTag};

use crate::graph::NodeId;
use crate::math::Vec2;

/// 回调信号
///
/// `Call` 动作触发时产生，宿主按 `receiver` 路由。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    pub receiver: NodeId,
    pub name: &'static str,
}

impl Signal {
    pub const fn new(receiver: NodeId, name: &'static str) -> Self {
        Self { receiver, name }
    }
}

/// 环绕相机参数（角度制）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub duration: f32,
    pub radius: f32,
    pub delta_radius: f32,
    pub angle_z: f32,
    pub delta_angle_z: f32,
    pub angle_x: f32,
    pub delta_angle_x: f32,
}

/// 动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MoveTo { duration: f32, to: Vec2 },
    MoveBy { duration: f32, delta: Vec2 },
    /// 抛物线跳跃位移
    JumpBy {
        duration: f32,
        delta: Vec2,
        height: f32,
        jumps: u32,
    },
    ScaleTo { duration: f32, to: f32 },
    ScaleBy { duration: f32, factor: f32 },
    RotateBy { duration: f32, degrees: f32 },
    FadeTo { duration: f32, opacity: u8 },
    FadeIn { duration: f32 },
    FadeOut { duration: f32 },
    OrbitCamera(Orbit),
    Grid { duration: f32, effect: GridEffect },
    Delay { duration: f32 },
    Show,
    Hide,
    Call(Signal),
    /// 释放目标节点的瓦片网格
    StopGrid,
    Sequence(Vec<Action>),
    /// 并行执行，时长取最长分支
    Spawn(Vec<Action>),
    Ease {
        easing: EasingFunction,
        inner: Box<Action>,
    },
    /// 以 `1 - t` 驱动内部动作
    ReverseTime(Box<Action>),
}

impl Action {
    // ========== 构造 ==========

    pub fn move_to(duration: f32, to: Vec2) -> Self {
        Action::MoveTo { duration, to }
    }

    pub fn move_by(duration: f32, delta: Vec2) -> Self {
        Action::MoveBy { duration, delta }
    }

    pub fn jump_by(duration: f32, delta: Vec2, height: f32, jumps: u32) -> Self {
        Action::JumpBy {
            duration,
            delta,
            height,
            jumps,
        }
    }

    pub fn scale_to(duration: f32, to: f32) -> Self {
        Action::ScaleTo { duration, to }
    }

    pub fn scale_by(duration: f32, factor: f32) -> Self {
        Action::ScaleBy { duration, factor }
    }

    pub fn rotate_by(duration: f32, degrees: f32) -> Self {
        Action::RotateBy { duration, degrees }
    }

    pub fn fade_to(duration: f32, opacity: u8) -> Self {
        Action::FadeTo { duration, opacity }
    }

    pub fn fade_in(duration: f32) -> Self {
        Action::FadeIn { duration }
    }

    pub fn fade_out(duration: f32) -> Self {
        Action::FadeOut { duration }
    }

    pub fn orbit(orbit: Orbit) -> Self {
        Action::OrbitCamera(orbit)
    }

    pub fn grid(duration: f32, effect: GridEffect) -> Self {
        Action::Grid { duration, effect }
    }

    pub fn delay(duration: f32) -> Self {
        Action::Delay { duration }
    }

    pub fn call(signal: Signal) -> Self {
        Action::Call(signal)
    }

    pub fn sequence(actions: Vec<Action>) -> Self {
        Action::Sequence(actions)
    }

    pub fn spawn(actions: Vec<Action>) -> Self {
        Action::Spawn(actions)
    }

    pub fn ease(easing: EasingFunction, inner: Action) -> Self {
        Action::Ease {
            easing,
            inner: Box::new(inner),
        }
    }

    pub fn reverse_time(inner: Action) -> Self {
        Action::ReverseTime(Box::new(inner))
    }

    // ========== 查询 ==========

    /// 时长（秒），瞬时动作为 0
    pub fn duration(&self) -> f32 {
        match self {
            Action::MoveTo { duration, .. }
            | Action::MoveBy { duration, .. }
            | Action::JumpBy { duration, .. }
            | Action::ScaleTo { duration, .. }
            | Action::ScaleBy { duration, .. }
            | Action::RotateBy { duration, .. }
            | Action::FadeTo { duration, .. }
            | Action::FadeIn { duration }
            | Action::FadeOut { duration }
            | Action::Grid { duration, .. }
            | Action::Delay { duration } => duration.max(0.0),
            Action::OrbitCamera(orbit) => orbit.duration.max(0.0),
            Action::Show | Action::Hide | Action::Call(_) | Action::StopGrid => 0.0,
            Action::Sequence(actions) => actions.iter().map(Action::duration).sum(),
            Action::Spawn(actions) => actions.iter().map(Action::duration).fold(0.0, f32::max),
            Action::Ease { inner, .. } | Action::ReverseTime(inner) => inner.duration(),
        }
    }

    /// 是否为瞬时动作
    pub fn is_instant(&self) -> bool {
        matches!(
            self,
            Action::Show | Action::Hide | Action::Call(_) | Action::StopGrid
        )
    }

    /// 反向动作
    ///
    /// 相对动作取反（位移取负、缩放取倒数、淡入淡出互换），
    /// 组合动作逐个反向并倒序；绝对动作无法结构化反向，退化为 `ReverseTime`。
    pub fn reverse(&self) -> Action {
        match self {
            Action::MoveBy { duration, delta } => Action::move_by(*duration, -*delta),
            Action::JumpBy {
                duration,
                delta,
                height,
                jumps,
            } => Action::jump_by(*duration, -*delta, *height, *jumps),
            Action::ScaleBy { duration, factor } if *factor != 0.0 => {
                Action::scale_by(*duration, 1.0 / factor)
            }
            Action::RotateBy { duration, degrees } => Action::rotate_by(*duration, -degrees),
            Action::FadeIn { duration } => Action::fade_out(*duration),
            Action::FadeOut { duration } => Action::fade_in(*duration),
            Action::OrbitCamera(orbit) => Action::OrbitCamera(Orbit {
                duration: orbit.duration,
                radius: orbit.radius + orbit.delta_radius,
                delta_radius: -orbit.delta_radius,
                angle_z: orbit.angle_z + orbit.delta_angle_z,
                delta_angle_z: -orbit.delta_angle_z,
                angle_x: orbit.angle_x + orbit.delta_angle_x,
                delta_angle_x: -orbit.delta_angle_x,
            }),
            Action::Delay { .. } | Action::Call(_) | Action::StopGrid => self.clone(),
            Action::Show => Action::Hide,
            Action::Hide => Action::Show,
            Action::Sequence(actions) => {
                Action::Sequence(actions.iter().rev().map(Action::reverse).collect())
            }
            Action::Spawn(actions) => Action::Spawn(actions.iter().map(Action::reverse).collect()),
            Action::Ease { easing, inner } => Action::ease(easing.reversed(), inner.reverse()),
            Action::ReverseTime(inner) => (**inner).clone(),
            Action::MoveTo { .. }
            | Action::ScaleTo { .. }
            | Action::ScaleBy { .. }
            | Action::FadeTo { .. }
            | Action::Grid { .. } => Action::reverse_time(self.clone()),
        }
    }
}
