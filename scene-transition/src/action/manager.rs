//! # Manager 模块
//!
//! 动作管理器：持有所有运行中的动作，每帧统一推进。
//!
//! 动作按启动顺序推进，同一帧内的回调信号按产生顺序返回，
//! 宿主据此决定分发顺序。

use tracing::{debug, trace};

use crate::graph::{NodeId, SceneGraph};
use crate::math::Size;

use super::runner::{ActionContext, ActionRunner};
use super::{Action, Signal};

/// 动作实例标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionTag(u64);

impl std::fmt::Display for ActionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ActionTag({})", self.0)
    }
}

struct RunningAction {
    tag: ActionTag,
    target: NodeId,
    runner: ActionRunner,
}

/// 动作管理器
#[derive(Default)]
pub struct ActionManager {
    actions: Vec<RunningAction>,
    next_tag: u64,
}

impl std::fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionManager")
            .field("actions", &self.actions.len())
            .finish()
    }
}

impl ActionManager {
    /// 创建新的动作管理器
    pub fn new() -> Self {
        Self::default()
    }

    fn next_action_tag(&mut self) -> ActionTag {
        self.next_tag += 1;
        ActionTag(self.next_tag)
    }

    /// 在节点上启动动作
    ///
    /// 立即捕获节点的起始状态，第一次推进发生在下一次 `update`。
    pub fn run_action(
        &mut self,
        graph: &mut SceneGraph,
        viewport: Size,
        target: NodeId,
        action: Action,
    ) -> ActionTag {
        let tag = self.next_action_tag();
        let mut runner = ActionRunner::new(&action);
        let mut signals = Vec::new();
        runner.start(&mut ActionContext {
            graph,
            target,
            viewport,
            signals: &mut signals,
        });
        trace!(tag = %tag, target = %target, duration = runner.duration(), "Action started");
        self.actions.push(RunningAction {
            tag,
            target,
            runner,
        });
        tag
    }

    /// 推进所有动作
    ///
    /// # 返回
    /// 本帧 `Call` 动作触发的信号（按产生顺序）
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph, viewport: Size) -> Vec<Signal> {
        let mut signals = Vec::new();
        let mut completed = Vec::new();

        for action in &mut self.actions {
            if !graph.contains(action.target) {
                debug!(
                    tag = %action.tag,
                    target = %action.target,
                    "Dropping action of released node"
                );
                completed.push(action.tag);
                continue;
            }
            let mut ctx = ActionContext {
                graph: &mut *graph,
                target: action.target,
                viewport,
                signals: &mut signals,
            };
            if action.runner.step(dt, &mut ctx) {
                trace!(tag = %action.tag, target = %action.target, "Action completed");
                completed.push(action.tag);
            }
        }

        self.actions.retain(|a| !completed.contains(&a.tag));
        signals
    }

    /// 停止动作（不会补完到终点）
    pub fn stop(&mut self, tag: ActionTag) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.tag != tag);
        self.actions.len() != before
    }

    /// 停止节点上的所有动作
    pub fn stop_all_for(&mut self, target: NodeId) -> usize {
        let before = self.actions.len();
        self.actions.retain(|a| a.target != target);
        before - self.actions.len()
    }

    // ========== 查询方法 ==========

    pub fn is_running(&self, tag: ActionTag) -> bool {
        self.actions.iter().any(|a| a.tag == tag)
    }

    /// 节点上是否有运行中的动作
    pub fn has_actions_for(&self, target: NodeId) -> bool {
        self.actions.iter().any(|a| a.target == target)
    }

    /// 运行中的动作数量
    pub fn active_count(&self) -> usize {
        self.actions.len()
    }

    /// 动作的当前进度（0.0 - 1.0）
    pub fn progress(&self, tag: ActionTag) -> Option<f32> {
        self.actions.iter().find(|a| a.tag == tag).map(|a| {
            let duration = a.runner.duration();
            if duration <= 0.0 {
                1.0
            } else {
                (a.runner.elapsed() / duration).min(1.0)
            }
        })
    }
}
