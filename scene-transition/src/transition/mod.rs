//! # Transition 模块
//!
//! 场景过渡：在同一时刻持有离场与入场两个场景，按风格编排动作，
//! 结束时把入场场景交还给运行循环。
//!
//! ## 生命周期
//!
//! ```text
//! Constructed → Entered → Animating → Finishing → Swapped → Exited → Released
//! ```
//!
//! - 进入舞台：根节点进入，输入分发关闭，离场场景只收到
//!   `ExitTransitionStarted`，入场场景完整进入，风格钩子构建动作
//! - `finish`：复位两个场景的变换，入场可见、离场隐藏，注册一次性的换场任务
//! - 换场任务（下一帧）：记录运行循环的清理标志，用入场场景替换栈顶
//! - 离开舞台：离场场景完整退出，入场场景只收到 `EnterTransitionFinished`
//!
//! 各风格只实现 `TransitionStyle`，状态机由 `TransitionScene` 统一驱动。

mod cross_fade;
mod fade;
mod flip;
mod kind;
mod slide;
mod tiles;
mod zoom;

pub use cross_fade::CrossFade;
pub use fade::{FADE_LAYER_TAG, Fade};
pub use flip::{Flip, FlipAxis};
pub use kind::{Orientation, TransitionKind, TransitionRequest};
pub use slide::{Edge, MoveIn, SlideIn};
pub use tiles::{Split, SplitAxis, TileFade, TurnOffTiles};
pub use zoom::{JumpZoom, RotoZoom, ShrinkGrow};

use std::fmt::Debug;

use tracing::{debug, warn};

use crate::action::{ActionTag, Signal};
use crate::director::StageContext;
use crate::graph::{NodeId, SceneGraph};
use crate::render::DisplayList;
use crate::scheduler::TaskId;

/// 结束回调的信号名
pub const FINISH: &str = "finish";
/// 中点切换可见性的信号名
pub const HIDE_OUT_SHOW_IN: &str = "hide_out_show_in";

/// 过渡阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Constructed,
    Entered,
    Animating,
    /// 已结束，等待换场任务
    Finishing,
    /// 已请求运行循环换入入场场景
    Swapped,
    Exited,
    Released,
}

/// 绘制顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneOrder {
    /// 先画离场，再画入场
    #[default]
    IncomingOnTop,
    /// 先画入场，再画离场
    OutgoingOnTop,
}

/// 过渡持有的场景句柄
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionScenes {
    /// 过渡自身的根节点（覆盖层与整体网格效果挂在这里）
    pub root: NodeId,
    pub outgoing: NodeId,
    pub incoming: NodeId,
    /// 时长（秒，非负）
    pub duration: f32,
}

impl TransitionScenes {
    /// 动作序列末尾触发 `finish` 的信号
    pub fn finish_signal(&self) -> Signal {
        Signal::new(self.root, FINISH)
    }

    pub fn hide_out_show_in_signal(&self) -> Signal {
        Signal::new(self.root, HIDE_OUT_SHOW_IN)
    }
}

/// 过渡风格
///
/// 每种过渡只需描述绘制顺序与入场时启动的动作。
pub trait TransitionStyle: Debug {
    /// 风格名称（用于日志）
    fn name(&self) -> &'static str;

    /// 构造时调用一次
    fn scene_order(&self) -> SceneOrder {
        SceneOrder::IncomingOnTop
    }

    /// 进入舞台后构建动作
    ///
    /// 动作序列必须以 `finish_signal` 的回调结束。
    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>);

    /// 离开舞台时拆除覆盖层
    fn on_exit(&mut self, _scenes: &TransitionScenes, _ctx: &mut StageContext<'_>) {}

    /// 释放时归还离屏资源
    fn release(&mut self, _scenes: &TransitionScenes, _ctx: &mut StageContext<'_>) {}

    /// 是否按顺序绘制两个场景；返回 false 时由覆盖层自行合成
    fn draws_scenes(&self) -> bool {
        true
    }
}

/// 过渡状态机
#[derive(Debug)]
pub struct TransitionScene {
    scenes: TransitionScenes,
    order: SceneOrder,
    /// 换场时记录的运行循环清理标志
    send_cleanup_snapshot: bool,
    phase: TransitionPhase,
    finish_count: u32,
    swap_task: Option<TaskId>,
    action_tags: Vec<ActionTag>,
    style: Box<dyn TransitionStyle>,
}

impl TransitionScene {
    /// 创建过渡（由 `Director::create_transition` 调用）
    ///
    /// 负数或 NaN 时长按 0 处理。
    pub(crate) fn new(
        root: NodeId,
        duration: f32,
        outgoing: NodeId,
        incoming: NodeId,
        style: Box<dyn TransitionStyle>,
    ) -> Self {
        let duration = if duration.is_nan() { 0.0 } else { duration.max(0.0) };
        let order = style.scene_order();
        Self {
            scenes: TransitionScenes {
                root,
                outgoing,
                incoming,
                duration,
            },
            order,
            send_cleanup_snapshot: false,
            phase: TransitionPhase::Constructed,
            finish_count: 0,
            swap_task: None,
            action_tags: Vec::new(),
            style,
        }
    }

    // ========== 查询方法 ==========

    pub fn name(&self) -> &'static str {
        self.style.name()
    }

    pub fn root(&self) -> NodeId {
        self.scenes.root
    }

    pub fn outgoing(&self) -> NodeId {
        self.scenes.outgoing
    }

    pub fn incoming(&self) -> NodeId {
        self.scenes.incoming
    }

    pub fn duration(&self) -> f32 {
        self.scenes.duration
    }

    pub fn scenes(&self) -> &TransitionScenes {
        &self.scenes
    }

    pub fn scene_order(&self) -> SceneOrder {
        self.order
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// `finish` 被调用的次数（含被忽略的重复调用）
    pub fn finish_count(&self) -> u32 {
        self.finish_count
    }

    pub fn send_cleanup_snapshot(&self) -> bool {
        self.send_cleanup_snapshot
    }

    // ========== 生命周期 ==========

    pub(crate) fn on_enter(&mut self, ctx: &mut StageContext<'_>) {
        let TransitionScenes {
            root,
            outgoing,
            incoming,
            ..
        } = self.scenes;

        ctx.graph.on_enter(root);
        self.phase = TransitionPhase::Entered;
        ctx.input.set_dispatch_events(false);
        ctx.graph.on_exit_transition_started(outgoing);
        ctx.graph.on_enter(incoming);

        self.style.on_enter(&self.scenes, ctx);
        self.action_tags.extend(ctx.take_issued_actions());
        self.phase = TransitionPhase::Animating;
        debug!(
            transition = self.name(),
            duration = self.scenes.duration,
            actions = self.action_tags.len(),
            "Transition entered"
        );
    }

    pub(crate) fn on_exit(&mut self, ctx: &mut StageContext<'_>) {
        let TransitionScenes {
            root,
            outgoing,
            incoming,
            ..
        } = self.scenes;

        ctx.graph.on_exit(root);
        ctx.input.set_dispatch_events(true);
        ctx.graph.on_exit(outgoing);
        ctx.graph.on_enter_transition_finished(incoming);
        self.style.on_exit(&self.scenes, ctx);
        self.phase = TransitionPhase::Exited;
        debug!(transition = self.name(), "Transition exited");
    }

    pub(crate) fn cleanup(&mut self, ctx: &mut StageContext<'_>) {
        ctx.cleanup_node(self.scenes.root);
        if self.send_cleanup_snapshot {
            ctx.cleanup_node(self.scenes.outgoing);
        }
    }

    /// 处理回调信号，返回是否已消费
    pub(crate) fn handle_signal(&mut self, name: &str, ctx: &mut StageContext<'_>) -> bool {
        match name {
            FINISH => {
                self.finish(ctx);
                true
            }
            HIDE_OUT_SHOW_IN => {
                self.hide_out_show_in(ctx.graph);
                true
            }
            _ => false,
        }
    }

    /// 结束动画，下一帧换入入场场景
    ///
    /// 同一实例只生效一次。
    pub fn finish(&mut self, ctx: &mut StageContext<'_>) {
        self.finish_count += 1;
        if self.finish_count > 1 {
            warn!(
                transition = self.name(),
                count = self.finish_count,
                "Transition finished more than once, ignoring"
            );
            return;
        }

        let TransitionScenes {
            root,
            outgoing,
            incoming,
            ..
        } = self.scenes;
        ctx.graph.set_visible(incoming, true);
        ctx.graph.reset_transform(incoming);
        ctx.graph.set_visible(outgoing, false);
        ctx.graph.reset_transform(outgoing);

        self.swap_task = Some(ctx.scheduler.schedule_once(root, 0.0));
        self.phase = TransitionPhase::Finishing;
        debug!(transition = self.name(), "Transition finished");
    }

    /// 入场可见，离场隐藏
    pub fn hide_out_show_in(&self, graph: &mut SceneGraph) {
        graph.set_visible(self.scenes.incoming, true);
        graph.set_visible(self.scenes.outgoing, false);
    }

    /// 处理到期任务，返回是否已消费
    pub(crate) fn on_task(&mut self, task: TaskId, ctx: &mut StageContext<'_>) -> bool {
        if self.swap_task != Some(task) {
            return false;
        }
        self.set_new_scene(ctx);
        true
    }

    fn set_new_scene(&mut self, ctx: &mut StageContext<'_>) {
        if let Some(task) = self.swap_task.take() {
            ctx.scheduler.unschedule(task);
        }
        self.send_cleanup_snapshot = ctx.scenes.send_cleanup_to_scene();
        ctx.scenes.replace_scene(self.scenes.incoming);
        // 离场场景对外恢复可见
        ctx.graph.set_visible(self.scenes.outgoing, true);
        self.phase = TransitionPhase::Swapped;
        debug!(
            transition = self.name(),
            incoming = %self.scenes.incoming,
            cleanup = self.send_cleanup_snapshot,
            "Incoming scene swapped in"
        );
    }

    /// 停止动作与任务，释放网格与离屏资源
    ///
    /// 场景本身由运行循环按引用情况释放。
    pub(crate) fn release(&mut self, ctx: &mut StageContext<'_>) {
        self.style.release(&self.scenes, ctx);
        for tag in self.action_tags.drain(..) {
            ctx.actions.stop(tag);
        }
        if let Some(task) = self.swap_task.take() {
            ctx.scheduler.unschedule(task);
        }
        ctx.scheduler.unschedule_all_for(self.scenes.root);
        for id in [self.scenes.root, self.scenes.outgoing, self.scenes.incoming] {
            ctx.graph.stop_grid(id);
        }
        self.phase = TransitionPhase::Released;
    }

    // ========== 绘制 ==========

    /// 记录过渡的显示列表
    ///
    /// 根节点的负 z 子节点、根节点、两个场景、根节点的非负 z 子节点（覆盖层）。
    pub fn draw(&self, graph: &SceneGraph, list: &mut DisplayList) {
        let TransitionScenes {
            root,
            outgoing,
            incoming,
            ..
        } = self.scenes;

        list.visit_children(graph, root, |z| z < 0);
        list.push_node(graph, root);
        if self.style.draws_scenes() {
            match self.order {
                SceneOrder::IncomingOnTop => {
                    list.visit(graph, outgoing);
                    list.visit(graph, incoming);
                }
                SceneOrder::OutgoingOnTop => {
                    list.visit(graph, incoming);
                    list.visit(graph, outgoing);
                }
            }
        }
        list.visit_children(graph, root, |z| z >= 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::StageConfig;
    use crate::director::Director;
    use crate::graph::NodeEvent;

    /// 只在入场时挂一个结束回调
    #[derive(Debug)]
    struct Instant;

    impl TransitionStyle for Instant {
        fn name(&self) -> &'static str {
            "instant"
        }

        fn scene_order(&self) -> SceneOrder {
            SceneOrder::OutgoingOnTop
        }

        fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
            ctx.run_action(scenes.root, Action::call(scenes.finish_signal()));
        }
    }

    fn running_director() -> (Director, NodeId) {
        let mut director = Director::new(StageConfig::default());
        let scene = director.create_scene();
        director.run_with_scene(scene);
        director.tick(0.0);
        (director, scene)
    }

    #[test]
    fn test_negative_duration_clamps() {
        let (mut director, _) = running_director();
        let incoming = director.create_scene();
        let root = director.create_transition(-3.0, incoming, Instant).unwrap();
        let transition = director.transition(root).unwrap();
        assert_eq!(transition.duration(), 0.0);
        assert_eq!(transition.scene_order(), SceneOrder::OutgoingOnTop);
        assert_eq!(transition.phase(), TransitionPhase::Constructed);
    }

    #[test]
    fn test_entry_notifications() {
        let (mut director, outgoing) = running_director();
        let incoming = director.create_scene();
        let root = director.create_transition(1.0, incoming, Instant).unwrap();
        director.replace_scene(root);
        let events = director.tick(0.0).events;

        assert!(!director.is_dispatching_events());
        assert!(events.contains(&(outgoing, NodeEvent::ExitTransitionStarted)));
        assert!(events.contains(&(incoming, NodeEvent::Enter)));
        assert!(!events.contains(&(outgoing, NodeEvent::Exit)));
    }

    #[test]
    fn test_swap_one_tick_after_finish() {
        let (mut director, outgoing) = running_director();
        let incoming = director.create_scene();
        let root = director.create_transition(1.0, incoming, Instant).unwrap();
        director.replace_scene(root);

        // 进入舞台
        director.tick(0.0);
        // 回调触发 finish，换场任务就绪
        director.tick(0.0);
        let phase = director.transition(root).unwrap().phase();
        assert_eq!(phase, TransitionPhase::Finishing);
        assert_eq!(director.running_scene(), Some(root));
        // 换场
        let events = director.tick(0.0).events;
        assert_eq!(director.running_scene(), Some(incoming));
        assert!(!director.is_transition(root));
        assert!(!director.graph().contains(root));
        assert!(!director.graph().contains(outgoing));
        assert!(director.is_dispatching_events());
        assert!(events.contains(&(outgoing, NodeEvent::Exit)));
        assert!(events.contains(&(outgoing, NodeEvent::Cleanup)));
        assert!(events.contains(&(incoming, NodeEvent::EnterTransitionFinished)));
    }

    #[test]
    fn test_finish_is_idempotent() {
        let (mut director, _) = running_director();
        let incoming = director.create_scene();
        let root = director.create_transition(1.0, incoming, Instant).unwrap();
        director.replace_scene(root);
        director.tick(0.0);

        let signal = Signal::new(root, FINISH);
        let twice = Action::sequence(vec![Action::call(signal), Action::call(signal)]);
        director.run_action(root, twice);
        director.tick(0.0);

        let transition = director.transition(root).unwrap();
        assert_eq!(transition.finish_count(), 3);
        assert_eq!(director.scheduler().len(), 1);
    }

    #[test]
    fn test_draw_order_and_overlay() {
        let (mut director, outgoing) = running_director();
        let incoming = director.create_scene();
        let root = director.create_transition(1.0, incoming, Instant).unwrap();
        let overlay = director.graph_mut().create_node(crate::graph::NodeKind::Layer);
        director.graph_mut().add_child(root, overlay, 2, None);
        director.replace_scene(root);

        let frame = director.tick(0.0);
        let order: Vec<_> = frame.commands.iter().map(|c| c.node).collect();
        assert_eq!(order, vec![root, incoming, outgoing, overlay]);
    }
}
