//! # Headless 模块
//!
//! 基于 `image::RgbaImage` 的无头合成器，供测试与命令行模拟使用。
//! 只合成纯色层与离屏图像，几何变换不参与像素计算。

use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::CompositorError;
use crate::math::Size;

use super::{BlendMode, Compositor, DrawCommand, DrawContent, RenderTargetId};

/// 无头合成器
#[derive(Debug)]
pub struct HeadlessCompositor {
    targets: HashMap<RenderTargetId, RgbaImage>,
    max_targets: usize,
    next_id: u64,
}

impl HeadlessCompositor {
    /// 创建合成器
    ///
    /// # 参数
    /// - `max_targets`: 同时存活的离屏目标上限，0 表示任何分配都会失败
    pub fn new(max_targets: usize) -> Self {
        Self {
            targets: HashMap::new(),
            max_targets,
            next_id: 0,
        }
    }

    /// 读取目标像素
    pub fn pixel(&self, target: RenderTargetId, x: u32, y: u32) -> Option<[u8; 4]> {
        let image = self.targets.get(&target)?;
        (x < image.width() && y < image.height()).then(|| image.get_pixel(x, y).0)
    }
}

impl Default for HeadlessCompositor {
    fn default() -> Self {
        Self::new(8)
    }
}

impl Compositor for HeadlessCompositor {
    fn allocate_target(&mut self, size: Size) -> Result<RenderTargetId, CompositorError> {
        if size.is_empty() {
            return Err(CompositorError::ZeroSizedTarget);
        }
        if self.targets.len() >= self.max_targets {
            return Err(CompositorError::BudgetExhausted {
                limit: self.max_targets,
            });
        }
        self.next_id += 1;
        let id = RenderTargetId(self.next_id);
        let (width, height) = (size.width.ceil() as u32, size.height.ceil() as u32);
        self.targets
            .insert(id, RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])));
        debug!(target_id = %id, width, height, "Render target allocated");
        Ok(id)
    }

    fn render_into(
        &mut self,
        target: RenderTargetId,
        commands: &[DrawCommand],
    ) -> Result<(), CompositorError> {
        let mut canvas = self
            .targets
            .remove(&target)
            .ok_or(CompositorError::UnknownTarget)?;
        canvas.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));

        for command in commands {
            match command.content {
                DrawContent::Container => {}
                DrawContent::Color(color) => {
                    let src = Rgba([color.r, color.g, color.b, command.opacity]);
                    canvas.pixels_mut().for_each(|p| blend_over(p, src));
                }
                DrawContent::Image {
                    target: source,
                    blend,
                } => {
                    let Some(image) = self.targets.get(&source) else {
                        continue;
                    };
                    for (dst, src) in canvas.pixels_mut().zip(image.pixels()) {
                        let alpha = (src.0[3] as u32 * command.opacity as u32 / 255) as u8;
                        let src = Rgba([src.0[0], src.0[1], src.0[2], alpha]);
                        match blend {
                            BlendMode::Alpha => blend_over(dst, src),
                            BlendMode::Additive => blend_add(dst, src),
                        }
                    }
                }
            }
        }

        self.targets.insert(target, canvas);
        Ok(())
    }

    fn release_target(&mut self, target: RenderTargetId) -> bool {
        let released = self.targets.remove(&target).is_some();
        if released {
            debug!(target_id = %target, "Render target released");
        }
        released
    }

    fn live_targets(&self) -> usize {
        self.targets.len()
    }
}

/// 源 alpha 覆盖
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src.0[3] as u32;
    for i in 0..3 {
        dst.0[i] = ((src.0[i] as u32 * a + dst.0[i] as u32 * (255 - a)) / 255) as u8;
    }
    dst.0[3] = (a + dst.0[3] as u32 * (255 - a) / 255).min(255) as u8;
}

/// 加色
fn blend_add(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src.0[3] as u32;
    for i in 0..3 {
        dst.0[i] = (dst.0[i] as u32 + src.0[i] as u32 * a / 255).min(255) as u8;
    }
    dst.0[3] = (dst.0[3] as u32 + a).min(255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, SceneGraph};
    use crate::math::Color3;
    use crate::render::DisplayList;

    #[test]
    fn test_budget_exhausted() {
        let mut compositor = HeadlessCompositor::new(1);
        let size = Size::new(4.0, 4.0);
        let first = compositor.allocate_target(size).unwrap();
        assert_eq!(
            compositor.allocate_target(size),
            Err(CompositorError::BudgetExhausted { limit: 1 })
        );

        assert!(compositor.release_target(first));
        assert!(!compositor.release_target(first));
        assert!(compositor.allocate_target(size).is_ok());
    }

    #[test]
    fn test_zero_sized_target() {
        let mut compositor = HeadlessCompositor::default();
        assert_eq!(
            compositor.allocate_target(Size::new(0.0, 10.0)),
            Err(CompositorError::ZeroSizedTarget)
        );
    }

    #[test]
    fn test_render_color_layer() {
        let mut graph = SceneGraph::new();
        let layer = graph.create_node(NodeKind::ColorLayer {
            color: Color3::new(200, 100, 50),
        });
        let mut list = DisplayList::new();
        list.visit(&graph, layer);

        let mut compositor = HeadlessCompositor::default();
        let target = compositor.allocate_target(Size::new(2.0, 2.0)).unwrap();
        compositor.render_into(target, list.commands()).unwrap();
        assert_eq!(compositor.pixel(target, 1, 1), Some([200, 100, 50, 255]));
    }

    #[test]
    fn test_render_unknown_target() {
        let mut compositor = HeadlessCompositor::default();
        let target = compositor.allocate_target(Size::new(2.0, 2.0)).unwrap();
        compositor.release_target(target);
        assert_eq!(
            compositor.render_into(target, &[]),
            Err(CompositorError::UnknownTarget)
        );
    }
}
