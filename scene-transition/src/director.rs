//! # Director 模块
//!
//! 运行循环：场景栈、当前/待切换场景、帧时钟与绘制。
//!
//! ## 帧顺序
//!
//! `tick(dt)` 依次执行：
//! 1. 推进动作，并把回调信号分发给对应的过渡
//! 2. 推进调度器（本帧注册的任务只就绪不触发）
//! 3. 应用待切换的场景
//! 4. 记录显示列表，取走本帧（含两帧之间）产生的生命周期通知
//!
//! 过渡与场景共享同一个场景图；过渡以其根节点 ID 作为场景栈中的条目，
//! 它的钩子通过 `StageContext` 借用运行循环的各个部件，而不是访问全局单例。

use std::collections::HashMap;

use tracing::{debug, info};

use crate::action::{Action, ActionManager, ActionTag, Signal};
use crate::config::{StageConfig, TransitionConfig};
use crate::error::{StageResult, TransitionError};
use crate::graph::{NodeEvent, NodeId, SceneGraph};
use crate::math::Size;
use crate::render::{Compositor, DisplayList, DrawCommand, HeadlessCompositor};
use crate::scheduler::{FiredTask, Scheduler};
use crate::transition::{TransitionRequest, TransitionScene, TransitionStyle};

/// 场景栈
#[derive(Debug, Default)]
pub struct SceneStack {
    stack: Vec<NodeId>,
    running: Option<NodeId>,
    next: Option<NodeId>,
    send_cleanup_to_scene: bool,
}

impl SceneStack {
    /// 当前运行的场景
    pub fn running(&self) -> Option<NodeId> {
        self.running
    }

    /// 待切换的场景
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub fn stack(&self) -> &[NodeId] {
        &self.stack
    }

    /// 切换时是否清理被替换的场景
    pub fn send_cleanup_to_scene(&self) -> bool {
        self.send_cleanup_to_scene
    }

    /// 替换栈顶场景（栈为空时压入），被替换的场景会被清理
    pub fn replace_scene(&mut self, scene: NodeId) {
        match self.stack.last_mut() {
            Some(top) => *top = scene,
            None => self.stack.push(scene),
        }
        self.send_cleanup_to_scene = true;
        self.next = Some(scene);
    }

    /// 压入场景，原场景保留在栈中且不被清理
    pub fn push_scene(&mut self, scene: NodeId) {
        self.send_cleanup_to_scene = false;
        self.stack.push(scene);
        self.next = Some(scene);
    }

    /// 弹出栈顶场景；栈中只剩一个场景时拒绝弹出
    pub fn pop_scene(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        self.send_cleanup_to_scene = true;
        self.next = self.stack.last().copied();
        true
    }

    /// 场景是否仍被运行循环引用
    pub fn holds(&self, id: NodeId) -> bool {
        self.running == Some(id) || self.next == Some(id) || self.stack.contains(&id)
    }
}

/// 输入分发开关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDispatch {
    enabled: bool,
}

impl Default for InputDispatch {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl InputDispatch {
    pub fn set_dispatch_events(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_dispatching(&self) -> bool {
        self.enabled
    }
}

/// 过渡钩子可借用的运行循环部件
pub struct StageContext<'a> {
    pub graph: &'a mut SceneGraph,
    pub scheduler: &'a mut Scheduler,
    pub actions: &'a mut ActionManager,
    pub scenes: &'a mut SceneStack,
    pub input: &'a mut InputDispatch,
    pub compositor: &'a mut dyn Compositor,
    pub config: &'a TransitionConfig,
    pub viewport: Size,
    issued: Vec<ActionTag>,
}

impl StageContext<'_> {
    /// 在节点上启动动作
    pub fn run_action(&mut self, target: NodeId, action: Action) -> ActionTag {
        let tag = self
            .actions
            .run_action(self.graph, self.viewport, target, action);
        self.issued.push(tag);
        tag
    }

    /// 取走本次借用期间启动的动作
    pub(crate) fn take_issued_actions(&mut self) -> Vec<ActionTag> {
        std::mem::take(&mut self.issued)
    }

    /// 停止子树上的动作与调度任务，并记录清理通知
    pub fn cleanup_node(&mut self, id: NodeId) {
        self.stop_activity(id);
        self.graph.on_cleanup(id);
    }

    /// 停止子树上的动作与调度任务后释放子树
    pub fn release_node(&mut self, id: NodeId) {
        self.stop_activity(id);
        self.graph.release(id);
    }

    fn stop_activity(&mut self, id: NodeId) {
        for node in self.graph.subtree(id) {
            self.actions.stop_all_for(node);
            self.scheduler.unschedule_all_for(node);
        }
    }
}

/// 单帧报告
#[derive(Debug, Clone)]
pub struct Frame {
    /// 帧序号（从 1 开始）
    pub index: u64,
    /// 本帧的显示列表
    pub commands: Vec<DrawCommand>,
    /// 未被过渡消费的信号
    pub signals: Vec<Signal>,
    /// 未被过渡消费的到期任务
    pub tasks: Vec<FiredTask>,
    /// 自上一帧以来的节点生命周期通知
    pub events: Vec<(NodeId, NodeEvent)>,
}

/// 运行循环
pub struct Director {
    graph: SceneGraph,
    scheduler: Scheduler,
    actions: ActionManager,
    scenes: SceneStack,
    input: InputDispatch,
    compositor: Box<dyn Compositor>,
    config: StageConfig,
    viewport: Size,
    /// 过渡根节点 -> 过渡
    transitions: HashMap<NodeId, TransitionScene>,
    frame: u64,
}

impl std::fmt::Debug for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("frame", &self.frame)
            .field("running", &self.scenes.running)
            .field("nodes", &self.graph.len())
            .field("transitions", &self.transitions.len())
            .finish()
    }
}

impl Director {
    /// 使用无头合成器创建运行循环
    pub fn new(config: StageConfig) -> Self {
        let compositor = HeadlessCompositor::new(config.compositor.max_targets);
        Self::with_compositor(config, Box::new(compositor))
    }

    /// 使用宿主提供的合成器创建运行循环
    pub fn with_compositor(config: StageConfig, compositor: Box<dyn Compositor>) -> Self {
        Self {
            graph: SceneGraph::new(),
            scheduler: Scheduler::new(),
            actions: ActionManager::new(),
            scenes: SceneStack::default(),
            input: InputDispatch::default(),
            compositor,
            viewport: config.viewport.size(),
            config,
            transitions: HashMap::new(),
            frame: 0,
        }
    }

    fn split(&mut self) -> (&mut HashMap<NodeId, TransitionScene>, StageContext<'_>) {
        (
            &mut self.transitions,
            StageContext {
                graph: &mut self.graph,
                scheduler: &mut self.scheduler,
                actions: &mut self.actions,
                scenes: &mut self.scenes,
                input: &mut self.input,
                compositor: self.compositor.as_mut(),
                config: &self.config.transitions,
                viewport: self.viewport,
                issued: Vec::new(),
            },
        )
    }

    fn with_transition<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut TransitionScene, &mut StageContext<'_>) -> R,
    ) -> Option<R> {
        let (transitions, mut ctx) = self.split();
        let transition = transitions.get_mut(&id)?;
        Some(f(transition, &mut ctx))
    }

    // ========== 查询方法 ==========

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn actions(&self) -> &ActionManager {
        &self.actions
    }

    pub fn compositor(&self) -> &dyn Compositor {
        self.compositor.as_ref()
    }

    pub fn scenes(&self) -> &SceneStack {
        &self.scenes
    }

    pub fn running_scene(&self) -> Option<NodeId> {
        self.scenes.running
    }

    pub fn send_cleanup_to_scene(&self) -> bool {
        self.scenes.send_cleanup_to_scene
    }

    pub fn is_dispatching_events(&self) -> bool {
        self.input.is_dispatching()
    }

    pub fn is_transition(&self, id: NodeId) -> bool {
        self.transitions.contains_key(&id)
    }

    pub fn transition(&self, id: NodeId) -> Option<&TransitionScene> {
        self.transitions.get(&id)
    }

    // ========== 场景管理 ==========

    pub fn create_scene(&mut self) -> NodeId {
        self.graph.create_scene()
    }

    /// 在节点上启动动作
    pub fn run_action(&mut self, target: NodeId, action: Action) -> ActionTag {
        self.actions
            .run_action(&mut self.graph, self.viewport, target, action)
    }

    /// 以首个场景启动运行循环
    pub fn run_with_scene(&mut self, scene: NodeId) {
        self.push_scene(scene);
    }

    /// 替换当前场景，下一帧生效
    pub fn replace_scene(&mut self, scene: NodeId) {
        let previous = self.scenes.next;
        self.scenes.replace_scene(scene);
        self.discard_pending(previous, scene);
    }

    /// 压入场景，下一帧生效
    pub fn push_scene(&mut self, scene: NodeId) {
        let previous = self.scenes.next;
        self.scenes.push_scene(scene);
        self.discard_pending(previous, scene);
    }

    /// 弹出场景，下一帧生效
    pub fn pop_scene(&mut self) -> bool {
        self.scenes.pop_scene()
    }

    /// 尚未生效就被覆盖的待切换场景
    fn discard_pending(&mut self, previous: Option<NodeId>, scene: NodeId) {
        if let Some(previous) = previous.filter(|&p| p != scene) {
            debug!(scene = %previous, "Pending scene superseded");
            self.release_stage(previous);
        }
    }

    // ========== 过渡 ==========

    /// 创建过渡，离场场景为当前运行的场景（没有时使用新建的空场景）
    ///
    /// 创建只分配过渡，调用方需再通过 `replace_scene` / `push_scene` 使其生效。
    pub fn create_transition(
        &mut self,
        duration: f32,
        incoming: NodeId,
        style: impl TransitionStyle + 'static,
    ) -> StageResult<NodeId> {
        self.create_boxed_transition(duration, incoming, Box::new(style))
    }

    /// 按请求创建过渡
    pub fn create_transition_from(
        &mut self,
        request: &TransitionRequest,
        incoming: NodeId,
    ) -> StageResult<NodeId> {
        let style = request.build_style(&self.config.transitions);
        let duration = request
            .duration
            .unwrap_or(self.config.transitions.default_duration);
        self.create_boxed_transition(duration, incoming, style)
    }

    /// 按请求创建过渡并替换当前场景
    pub fn transition_to(
        &mut self,
        request: &TransitionRequest,
        incoming: NodeId,
    ) -> StageResult<NodeId> {
        let root = self.create_transition_from(request, incoming)?;
        self.replace_scene(root);
        Ok(root)
    }

    fn create_boxed_transition(
        &mut self,
        duration: f32,
        incoming: NodeId,
        style: Box<dyn TransitionStyle>,
    ) -> StageResult<NodeId> {
        if !self.graph.contains(incoming) || self.is_transition(incoming) {
            return Err(TransitionError::MissingIncomingScene(incoming).into());
        }
        let outgoing = match self.scenes.running {
            Some(running) if self.is_transition(running) => {
                return Err(TransitionError::TransitionInProgress(running).into());
            }
            Some(running) => running,
            None => self.graph.create_scene(),
        };
        if outgoing == incoming {
            return Err(TransitionError::SameScene(incoming).into());
        }

        let root = self.graph.create_scene();
        let transition = TransitionScene::new(root, duration, outgoing, incoming, style);
        info!(
            transition = transition.name(),
            duration = transition.duration(),
            outgoing = %outgoing,
            incoming = %incoming,
            "Transition created"
        );
        self.transitions.insert(root, transition);
        Ok(root)
    }

    // ========== 帧循环 ==========

    /// 推进一帧
    pub fn tick(&mut self, dt: f32) -> Frame {
        self.frame += 1;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut signals = Vec::new();
        let mut tasks = Vec::new();

        // 1. 动作
        for signal in self.actions.update(dt, &mut self.graph, self.viewport) {
            let handled =
                self.with_transition(signal.receiver, |t, ctx| t.handle_signal(signal.name, ctx));
            if handled != Some(true) {
                signals.push(signal);
            }
        }

        // 2. 调度任务
        for task in self.scheduler.tick(dt) {
            let handled = self.with_transition(task.owner, |t, ctx| t.on_task(task.id, ctx));
            if handled != Some(true) {
                tasks.push(task);
            }
        }

        // 3. 场景切换
        self.apply_next_scene();

        // 4. 绘制
        Frame {
            index: self.frame,
            commands: self.draw(),
            signals,
            tasks,
            events: self.graph.drain_events(),
        }
    }

    /// 记录当前运行场景的显示列表
    pub fn draw(&self) -> Vec<DrawCommand> {
        let mut list = DisplayList::new();
        if let Some(running) = self.scenes.running {
            match self.transitions.get(&running) {
                Some(transition) => transition.draw(&self.graph, &mut list),
                None => list.visit(&self.graph, running),
            }
        }
        list.into_commands()
    }

    fn apply_next_scene(&mut self) {
        let Some(next) = self.scenes.next.take() else {
            return;
        };
        let previous = self.scenes.running;
        if previous == Some(next) {
            return;
        }
        // 过渡自己换入的入场场景已进入过舞台；被中途替换时新场景照常进入
        let swapped_in = previous
            .and_then(|id| self.transitions.get(&id))
            .is_some_and(|t| t.incoming() == next);
        let next_is_transition = self.is_transition(next);

        // 切入过渡时，原场景由过渡接管生命周期通知
        if !next_is_transition {
            if let Some(previous) = previous {
                self.exit_stage(previous);
                if self.scenes.send_cleanup_to_scene {
                    self.cleanup_stage(previous);
                }
            }
        }

        self.scenes.running = Some(next);
        debug!(scene = %next, transition = next_is_transition, "Running scene changed");

        if let Some(previous) = previous {
            self.release_stage(previous);
        }

        // 入场场景的完成通知已由过渡的退出钩子发出
        if !swapped_in {
            self.enter_stage(next);
        }
    }

    fn enter_stage(&mut self, id: NodeId) {
        let entered = self.with_transition(id, |t, ctx| t.on_enter(ctx));
        if entered.is_none() {
            self.graph.on_enter(id);
        }
        self.graph.on_enter_transition_finished(id);
    }

    fn exit_stage(&mut self, id: NodeId) {
        if self.with_transition(id, |t, ctx| t.on_exit(ctx)).is_none() {
            self.graph.on_exit(id);
        }
    }

    fn cleanup_stage(&mut self, id: NodeId) {
        let cleaned = self.with_transition(id, |t, ctx| t.cleanup(ctx));
        if cleaned.is_none() {
            let (_, mut ctx) = self.split();
            ctx.cleanup_node(id);
        }
    }

    /// 场景或过渡是否仍被引用
    fn is_referenced(&self, id: NodeId) -> bool {
        self.scenes.holds(id)
            || self
                .transitions
                .values()
                .any(|t| t.outgoing() == id || t.incoming() == id)
    }

    /// 释放不再被引用的场景或过渡
    fn release_stage(&mut self, id: NodeId) {
        if self.is_referenced(id) {
            return;
        }
        let Some(mut transition) = self.transitions.remove(&id) else {
            let (_, mut ctx) = self.split();
            ctx.release_node(id);
            return;
        };

        {
            let (_, mut ctx) = self.split();
            transition.release(&mut ctx);
            ctx.release_node(id);
        }
        for scene in [transition.outgoing(), transition.incoming()] {
            if !self.is_referenced(scene) {
                let (_, mut ctx) = self.split();
                ctx.release_node(scene);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_stack_flags() {
        let mut stack = SceneStack::default();
        let a = NodeId::new(1);
        let b = NodeId::new(2);

        stack.push_scene(a);
        assert!(!stack.send_cleanup_to_scene());
        stack.push_scene(b);
        assert_eq!(stack.stack(), &[a, b]);

        assert!(stack.pop_scene());
        assert!(stack.send_cleanup_to_scene());
        assert_eq!(stack.next(), Some(a));
        // 最后一个场景不能弹出
        assert!(!stack.pop_scene());

        stack.replace_scene(b);
        assert_eq!(stack.stack(), &[b]);
        assert!(stack.send_cleanup_to_scene());
    }

    #[test]
    fn test_run_with_scene_enters_next_tick() {
        let mut director = Director::new(StageConfig::default());
        let scene = director.create_scene();
        director.run_with_scene(scene);
        assert_eq!(director.running_scene(), None);

        let frame = director.tick(1.0 / 60.0);
        assert_eq!(director.running_scene(), Some(scene));
        assert_eq!(frame.commands.len(), 1);
        assert_eq!(
            frame.events,
            vec![
                (scene, NodeEvent::Enter),
                (scene, NodeEvent::EnterTransitionFinished),
            ]
        );
    }

    #[test]
    fn test_replace_scene_releases_previous() {
        let mut director = Director::new(StageConfig::default());
        let a = director.create_scene();
        let b = director.create_scene();
        director.run_with_scene(a);
        director.tick(0.0);

        director.replace_scene(b);
        director.tick(0.0);
        assert_eq!(director.running_scene(), Some(b));
        assert!(!director.graph().contains(a));
    }

    #[test]
    fn test_push_and_pop_keep_lower_scene() {
        let mut director = Director::new(StageConfig::default());
        let a = director.create_scene();
        let b = director.create_scene();
        director.run_with_scene(a);
        director.tick(0.0);

        director.push_scene(b);
        director.tick(0.0);
        assert!(director.graph().contains(a));

        assert!(director.pop_scene());
        director.tick(0.0);
        assert_eq!(director.running_scene(), Some(a));
        assert!(!director.graph().contains(b));
    }

    #[test]
    fn test_unrouted_signal_is_reported() {
        let mut director = Director::new(StageConfig::default());
        let scene = director.create_scene();
        director.run_with_scene(scene);
        let signal = Signal::new(scene, "custom");
        director.run_action(scene, Action::call(signal));

        let frame = director.tick(0.0);
        assert_eq!(frame.signals, vec![signal]);
    }

    #[test]
    fn test_create_transition_errors() {
        let mut director = Director::new(StageConfig::default());
        let scene = director.create_scene();
        director.run_with_scene(scene);
        director.tick(0.0);

        let missing = NodeId::new(999);
        let err = director
            .create_transition(1.0, missing, crate::transition::Fade::new(Default::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::StageError::Transition(TransitionError::MissingIncomingScene(_))
        ));

        let err = director
            .create_transition(1.0, scene, crate::transition::Fade::new(Default::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::StageError::Transition(TransitionError::SameScene(_))
        ));
    }
}
