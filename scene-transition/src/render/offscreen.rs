//! # Offscreen 模块
//!
//! 把两个场景各自渲染进一张离屏图像，供交叉淡化合成使用。

use tracing::debug;

use crate::error::CompositorError;
use crate::graph::{NodeId, SceneGraph};
use crate::math::Size;

use super::{Compositor, DisplayList, RenderTargetId};

/// 入场、离场场景的离屏快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenPair {
    pub incoming: RenderTargetId,
    pub outgoing: RenderTargetId,
}

impl OffscreenPair {
    /// 分别捕获两个场景
    ///
    /// 任一步失败时已分配的目标会被释放，不会泄漏。
    pub fn capture(
        graph: &SceneGraph,
        compositor: &mut dyn Compositor,
        size: Size,
        incoming: NodeId,
        outgoing: NodeId,
    ) -> Result<Self, CompositorError> {
        let incoming_target = capture_scene(graph, compositor, size, incoming)?;
        let outgoing_target = match capture_scene(graph, compositor, size, outgoing) {
            Ok(target) => target,
            Err(e) => {
                compositor.release_target(incoming_target);
                return Err(e);
            }
        };
        debug!(
            incoming = %incoming_target,
            outgoing = %outgoing_target,
            "Captured scenes offscreen"
        );
        Ok(Self {
            incoming: incoming_target,
            outgoing: outgoing_target,
        })
    }

    /// 释放两张图像
    pub fn release(self, compositor: &mut dyn Compositor) {
        compositor.release_target(self.incoming);
        compositor.release_target(self.outgoing);
    }
}

/// 把单个场景渲染进新分配的目标
///
/// 场景即使当前不可见也会被捕获。
fn capture_scene(
    graph: &SceneGraph,
    compositor: &mut dyn Compositor,
    size: Size,
    scene: NodeId,
) -> Result<RenderTargetId, CompositorError> {
    let target = compositor.allocate_target(size)?;

    let mut list = DisplayList::new();
    list.visit_children(graph, scene, |z| z < 0);
    list.push_node(graph, scene);
    list.visit_children(graph, scene, |z| z >= 0);

    if let Err(e) = compositor.render_into(target, list.commands()) {
        compositor.release_target(target);
        return Err(e);
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;
    use crate::math::Color3;
    use crate::render::HeadlessCompositor;

    #[test]
    fn test_capture_pair() {
        let mut graph = SceneGraph::new();
        let incoming = graph.create_scene();
        let outgoing = graph.create_scene();
        let red = graph.create_node(NodeKind::ColorLayer {
            color: Color3::new(255, 0, 0),
        });
        graph.add_child(incoming, red, 0, None);
        graph.set_visible(incoming, false);

        let mut compositor = HeadlessCompositor::new(2);
        let size = Size::new(2.0, 2.0);
        let pair =
            OffscreenPair::capture(&graph, &mut compositor, size, incoming, outgoing).unwrap();
        assert_eq!(compositor.pixel(pair.incoming, 0, 0), Some([255, 0, 0, 255]));
        assert_eq!(compositor.pixel(pair.outgoing, 0, 0), Some([0, 0, 0, 0]));

        pair.release(&mut compositor);
        assert_eq!(compositor.live_targets(), 0);
    }

    #[test]
    fn test_second_allocation_failure_releases_first() {
        let mut graph = SceneGraph::new();
        let incoming = graph.create_scene();
        let outgoing = graph.create_scene();

        let mut compositor = HeadlessCompositor::new(1);
        let size = Size::new(2.0, 2.0);
        let result = OffscreenPair::capture(&graph, &mut compositor, size, incoming, outgoing);
        assert_eq!(result, Err(CompositorError::BudgetExhausted { limit: 1 }));
        assert_eq!(compositor.live_targets(), 0);
    }
}
