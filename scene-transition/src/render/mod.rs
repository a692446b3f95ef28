//! # Render 模块
//!
//! 显示列表与合成器抽象。
//!
//! 场景图每帧被记录为扁平的 `DrawCommand` 列表；离屏合成通过
//! `Compositor` trait 分配、渲染、释放与视口等大的图像缓冲。
//! 库内只提供基于 `image::RgbaImage` 的无头实现，GPU 后端由宿主提供。

mod headless;
mod offscreen;

pub use headless::HeadlessCompositor;
pub use offscreen::OffscreenPair;

use serde::{Deserialize, Serialize};

use crate::error::CompositorError;
use crate::graph::{Camera, NodeId, NodeKind, SceneGraph};
use crate::math::{Color3, Size, Vec2};

/// 离屏渲染目标标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub(crate) u64);

impl std::fmt::Display for RenderTargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RenderTargetId({})", self.0)
    }
}

/// 混合模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// 源 alpha 覆盖
    #[default]
    Alpha,
    /// 加色（不透明，作为底图）
    Additive,
}

/// 绘制内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawContent {
    /// 场景或容器（自身不产生像素）
    Container,
    Color(Color3),
    Image {
        target: RenderTargetId,
        blend: BlendMode,
    },
}

/// 单条绘制命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub node: NodeId,
    pub content: DrawContent,
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub opacity: u8,
    pub camera: Camera,
    /// 节点带有瓦片网格
    pub tiled: bool,
}

/// 显示列表记录器
#[derive(Debug, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 递归记录节点：负 z 子节点、自身、非负 z 子节点；不可见的子树跳过
    pub fn visit(&mut self, graph: &SceneGraph, id: NodeId) {
        if !graph.get(id).is_some_and(|n| n.visible) {
            return;
        }
        self.visit_children(graph, id, |z| z < 0);
        self.push_node(graph, id);
        self.visit_children(graph, id, |z| z >= 0);
    }

    /// 按 z 顺序（同 z 保持挂载顺序）记录满足条件的直接子节点
    pub fn visit_children(
        &mut self,
        graph: &SceneGraph,
        parent: NodeId,
        filter: impl Fn(i32) -> bool,
    ) {
        let Some(node) = graph.get(parent) else {
            return;
        };
        let mut children: Vec<(i32, NodeId)> = node
            .children()
            .iter()
            .filter_map(|&c| graph.get(c).map(|n| (n.z_order(), c)))
            .filter(|(z, _)| filter(*z))
            .collect();
        children.sort_by_key(|(z, _)| *z);
        for (_, child) in children {
            self.visit(graph, child);
        }
    }

    /// 仅记录节点自身
    pub fn push_node(&mut self, graph: &SceneGraph, id: NodeId) {
        let Some(node) = graph.get(id) else {
            return;
        };
        let content = match node.kind {
            NodeKind::Scene | NodeKind::Layer => DrawContent::Container,
            NodeKind::ColorLayer { color } => DrawContent::Color(color),
            NodeKind::Image { target, blend } => DrawContent::Image { target, blend },
        };
        self.commands.push(DrawCommand {
            node: id,
            content,
            position: node.position,
            scale: Vec2::new(node.scale_x, node.scale_y),
            rotation: node.rotation,
            opacity: node.opacity,
            camera: node.camera,
            tiled: node.grid.is_some(),
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// 合成器
///
/// 离屏目标是有限资源，分配失败必须由调用方降级处理。
pub trait Compositor {
    /// 分配与 `size` 等大的离屏目标
    fn allocate_target(&mut self, size: Size) -> Result<RenderTargetId, CompositorError>;

    /// 把显示列表渲染进目标（覆盖原有内容）
    fn render_into(
        &mut self,
        target: RenderTargetId,
        commands: &[DrawCommand],
    ) -> Result<(), CompositorError>;

    /// 释放目标，返回目标是否存在
    fn release_target(&mut self, target: RenderTargetId) -> bool;

    /// 存活的目标数量
    fn live_targets(&self) -> usize;
}
