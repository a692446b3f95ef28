//! # Node 模块
//!
//! 场景图节点及其可视状态。

use crate::math::{Color3, Vec2};
use crate::render::{BlendMode, RenderTargetId};

use super::camera::Camera;
use super::grid::TileGrid;

/// 节点唯一标识符
///
/// 由 `SceneGraph` 分配，节点释放后不会复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// 节点内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// 场景根（也用作过渡自身的根）
    Scene,
    /// 纯容器
    Layer,
    /// 纯色层，透明度取节点 `opacity`
    ColorLayer { color: Color3 },
    /// 引用离屏图像的精灵
    Image {
        target: RenderTargetId,
        blend: BlendMode,
    },
}

/// 生命周期通知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEvent {
    /// 进入舞台
    Enter,
    /// 离开舞台
    Exit,
    /// 入场过渡结束
    EnterTransitionFinished,
    /// 离场过渡开始
    ExitTransitionStarted,
    /// 清理（动作与调度已停止）
    Cleanup,
}

/// 场景图节点
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub kind: NodeKind,
    pub position: Vec2,
    pub scale_x: f32,
    pub scale_y: f32,
    /// 旋转（角度制，顺时针）
    pub rotation: f32,
    /// 锚点（相对尺寸的比例）
    pub anchor: Vec2,
    pub visible: bool,
    pub opacity: u8,
    pub camera: Camera,
    /// 瓦片网格（网格动作运行期间存在）
    pub grid: Option<TileGrid>,
    pub(crate) z_order: i32,
    pub(crate) tag: Option<i32>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) running: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            position: Vec2::zero(),
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            anchor: Vec2::new(0.5, 0.5),
            visible: true,
            opacity: 255,
            camera: Camera::default(),
            grid: None,
            z_order: 0,
            tag: None,
            parent: None,
            children: Vec::new(),
            running: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn z_order(&self) -> i32 {
        self.z_order
    }

    pub fn tag(&self) -> Option<i32> {
        self.tag
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// 是否在舞台上
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 同时设置 x/y 缩放
    pub fn set_scale(&mut self, scale: f32) {
        self.scale_x = scale;
        self.scale_y = scale;
    }

    /// 统一缩放值（x/y 不同时返回 x）
    pub fn scale(&self) -> f32 {
        self.scale_x
    }

    /// 恢复恒等变换与默认相机
    pub fn reset_transform(&mut self) {
        self.position = Vec2::zero();
        self.set_scale(1.0);
        self.rotation = 0.0;
        self.camera.restore();
    }

    /// 是否处于恒等变换且相机为默认状态
    pub fn has_identity_transform(&self) -> bool {
        self.position == Vec2::zero()
            && self.scale_x == 1.0
            && self.scale_y == 1.0
            && self.rotation == 0.0
            && self.camera.is_default()
    }
}
