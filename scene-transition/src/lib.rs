//! # Scene Transition
//!
//! 场景切换编排：在离场与入场两个场景之间播放动画交接，
//! 结束后把入场场景交还给运行循环。
//!
//! ## 架构概述
//!
//! ```text
//! Director::tick(dt)
//!   │
//!   ├─ ActionManager::update ──► Signal ──► TransitionScene::handle_signal
//!   ├─ Scheduler::tick ───────► FiredTask ─► TransitionScene::on_task（换场）
//!   ├─ apply_next_scene ──────► 生命周期通知（NodeEvent）
//!   └─ draw ──────────────────► Vec<DrawCommand>
//! ```
//!
//! ## 核心类型
//!
//! - [`Director`]：运行循环，持有场景图、调度器、动作管理器与合成器
//! - [`TransitionScene`]：过渡状态机，风格由 [`TransitionStyle`] 提供
//! - [`Action`]：以时长参数化的动作值树
//! - [`SceneGraph`]：以 [`NodeId`] 寻址的节点 arena
//! - [`Compositor`]：离屏渲染目标
//!
//! ## 使用示例
//!
//! ```ignore
//! use scene_transition::{Director, StageConfig, TransitionKind, TransitionRequest};
//!
//! let mut director = Director::new(StageConfig::default());
//! let title = director.create_scene();
//! director.run_with_scene(title);
//! director.tick(1.0 / 60.0);
//!
//! let game = director.create_scene();
//! director.transition_to(&TransitionRequest::new(TransitionKind::SlideInL), game)?;
//! loop {
//!     let frame = director.tick(1.0 / 60.0);
//!     renderer.draw(&frame.commands);
//! }
//! ```

pub mod action;
pub mod config;
pub mod director;
pub mod error;
pub mod graph;
pub mod math;
pub mod render;
pub mod scheduler;
pub mod transition;

// 重导出核心类型
pub use action::{Action, ActionManager, ActionTag, EasingFunction, Orbit, Signal};
pub use config::{CompositorConfig, StageConfig, TransitionConfig, ViewportConfig};
pub use director::{Director, Frame, InputDispatch, SceneStack, StageContext};
pub use error::{CompositorError, ConfigError, StageError, StageResult, TransitionError};
pub use graph::{Node, NodeEvent, NodeId, NodeKind, SceneGraph};
pub use math::{Color3, Size, Vec2, Vec3};
pub use render::{BlendMode, Compositor, DrawCommand, DrawContent, HeadlessCompositor};
pub use scheduler::{FiredTask, Scheduler, TaskId};
pub use transition::{
    Orientation, SceneOrder, TransitionKind, TransitionPhase, TransitionRequest, TransitionScene,
    TransitionScenes, TransitionStyle,
};
