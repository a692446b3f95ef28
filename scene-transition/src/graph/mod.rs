//! # Graph 模块
//!
//! 场景图：以 `NodeId` 寻址的节点 arena。
//!
//! ## 生命周期通知
//!
//! `on_enter` / `on_exit` 等方法递归作用于子树，通知以 `NodeEvent`
//! 排队，运行循环每帧通过 `drain_events` 取走并放进帧报告。节点之间只通过 ID 引用，
//! 释放子树后残留的 ID 查询会返回 `None`。

mod camera;
mod grid;
mod node;

pub use camera::Camera;
pub use grid::{GridSize, Tile, TileGrid};
pub use node::{Node, NodeEvent, NodeId, NodeKind};

use std::collections::HashMap;

use tracing::debug;

/// 场景图
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    events: Vec<(NodeId, NodeEvent)>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            events: Vec::new(),
        }
    }

    fn next_node_id(&mut self) -> NodeId {
        // Default 构造时 next_id 为 0
        self.next_id = self.next_id.max(1);
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    // ========== 节点管理 ==========

    /// 创建游离节点
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.next_node_id();
        self.nodes.insert(id, Node::new(id, kind));
        id
    }

    /// 创建空场景
    pub fn create_scene(&mut self) -> NodeId {
        self.create_node(NodeKind::Scene)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// 节点总数
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 挂载子节点
    ///
    /// 子节点若已有父节点会先被摘下。父节点在舞台上时子节点随之进入。
    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        z_order: i32,
        tag: Option<i32>,
    ) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        self.detach(child);

        let parent_running = match self.nodes.get_mut(&parent) {
            Some(node) => {
                node.children.push(child);
                node.running
            }
            None => return false,
        };
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
            node.z_order = z_order;
            node.tag = tag;
        }
        if parent_running {
            self.on_enter(child);
        }
        true
    }

    /// 从父节点摘下（不释放）
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(&child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != child);
        }
    }

    /// 按 tag 查找直接子节点
    pub fn child_by_tag(&self, parent: NodeId, tag: i32) -> Option<NodeId> {
        self.get(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.get(c).is_some_and(|n| n.tag == Some(tag)))
    }

    /// 子树全部节点（前序，含自身）
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// 释放子树，返回被释放的节点
    ///
    /// 调用方负责先停止这些节点上的动作与调度任务。
    pub fn release(&mut self, root: NodeId) -> Vec<NodeId> {
        self.detach(root);
        let released = self.subtree(root);
        for id in &released {
            self.nodes.remove(id);
        }
        if !released.is_empty() {
            debug!(node = %root, count = released.len(), "Released subtree");
        }
        released
    }

    // ========== 生命周期 ==========

    fn notify(&mut self, root: NodeId, event: NodeEvent, running: Option<bool>) {
        for id in self.subtree(root) {
            if let (Some(node), Some(running)) = (self.nodes.get_mut(&id), running) {
                node.running = running;
            }
            self.events.push((id, event));
        }
    }

    /// 进入舞台
    pub fn on_enter(&mut self, root: NodeId) {
        self.notify(root, NodeEvent::Enter, Some(true));
    }

    /// 离开舞台
    pub fn on_exit(&mut self, root: NodeId) {
        self.notify(root, NodeEvent::Exit, Some(false));
    }

    pub fn on_enter_transition_finished(&mut self, root: NodeId) {
        self.notify(root, NodeEvent::EnterTransitionFinished, None);
    }

    pub fn on_exit_transition_started(&mut self, root: NodeId) {
        self.notify(root, NodeEvent::ExitTransitionStarted, None);
    }

    /// 记录清理通知（动作与调度由 `StageContext::cleanup_node` 停止）
    pub fn on_cleanup(&mut self, root: NodeId) {
        self.notify(root, NodeEvent::Cleanup, None);
    }

    /// 取走并清空通知队列
    pub fn drain_events(&mut self) -> Vec<(NodeId, NodeEvent)> {
        std::mem::take(&mut self.events)
    }

    // ========== 可视状态 ==========

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    pub fn reset_transform(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.reset_transform();
        }
    }

    /// 释放节点上的瓦片网格
    pub fn stop_grid(&mut self, id: NodeId) -> bool {
        self.nodes
            .get_mut(&id)
            .and_then(|node| node.grid.take())
            .is_some()
    }
}
