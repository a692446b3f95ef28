//! 翻转过渡：相机环绕制造的翻页错觉

use crate::action::{Action, Orbit};
use crate::director::StageContext;

use super::{Orientation, SceneOrder, TransitionScenes, TransitionStyle};

/// 翻转轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// 水平翻转
    X,
    /// 垂直翻转
    Y,
    /// 斜向翻转
    Angular,
}

impl FlipAxis {
    /// 离场、入场的相机倾角
    fn tilt(self) -> (f32, f32) {
        match self {
            FlipAxis::X => (0.0, 0.0),
            FlipAxis::Y => (90.0, 90.0),
            FlipAxis::Angular => (45.0, -45.0),
        }
    }
}

/// 翻转 / 缩放翻转
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flip {
    pub axis: FlipAxis,
    pub orientation: Orientation,
    /// 同时缩小到 0.5 再放大回 1
    pub zoom: bool,
}

impl Flip {
    pub fn new(axis: FlipAxis, orientation: Orientation) -> Self {
        Self {
            axis,
            orientation,
            zoom: false,
        }
    }

    pub fn zoomed(axis: FlipAxis, orientation: Orientation) -> Self {
        Self {
            zoom: true,
            ..Self::new(axis, orientation)
        }
    }

    /// 轴对应的默认方向
    pub fn default_orientation(axis: FlipAxis) -> Orientation {
        match axis {
            FlipAxis::Y => Orientation::UpOver,
            FlipAxis::X | FlipAxis::Angular => Orientation::RightOver,
        }
    }

    /// 是否按正方向旋转
    fn positive(&self) -> bool {
        match self.axis {
            FlipAxis::Y => self.orientation.is_primary(),
            FlipAxis::X | FlipAxis::Angular => !self.orientation.is_primary(),
        }
    }

    /// (入场起始角, 入场增量, 离场增量)
    fn angles(&self) -> (f32, f32, f32) {
        if self.positive() {
            (270.0, 90.0, 90.0)
        } else {
            (90.0, -90.0, -90.0)
        }
    }
}

impl TransitionStyle for Flip {
    fn name(&self) -> &'static str {
        match (self.axis, self.zoom) {
            (FlipAxis::X, false) => "flip_x",
            (FlipAxis::Y, false) => "flip_y",
            (FlipAxis::Angular, false) => "flip_angular",
            (FlipAxis::X, true) => "zoom_flip_x",
            (FlipAxis::Y, true) => "zoom_flip_y",
            (FlipAxis::Angular, true) => "zoom_flip_angular",
        }
    }

    fn scene_order(&self) -> SceneOrder {
        SceneOrder::OutgoingOnTop
    }

    fn on_enter(&mut self, scenes: &TransitionScenes, ctx: &mut StageContext<'_>) {
        let half = scenes.duration / 2.0;
        let (in_angle_z, in_delta_z, out_delta_z) = self.angles();
        let (out_tilt, in_tilt) = self.axis.tilt();

        ctx.graph.set_visible(scenes.incoming, false);

        let orbit_in = Action::orbit(Orbit {
            duration: half,
            radius: 1.0,
            delta_radius: 0.0,
            angle_z: in_angle_z,
            delta_angle_z: in_delta_z,
            angle_x: in_tilt,
            delta_angle_x: 0.0,
        });
        let orbit_out = Action::orbit(Orbit {
            duration: half,
            radius: 1.0,
            delta_radius: 0.0,
            angle_z: 0.0,
            delta_angle_z: out_delta_z,
            angle_x: out_tilt,
            delta_angle_x: 0.0,
        });

        let (in_action, out_action) = if self.zoom {
            if let Some(node) = ctx.graph.get_mut(scenes.incoming) {
                node.set_scale(0.5);
            }
            (
                Action::sequence(vec![
                    Action::delay(half),
                    Action::spawn(vec![orbit_in, Action::scale_to(half, 1.0), Action::Show]),
                    Action::call(scenes.finish_signal()),
                ]),
                Action::sequence(vec![
                    Action::spawn(vec![orbit_out, Action::scale_to(half, 0.5)]),
                    Action::Hide,
                    Action::delay(half),
                ]),
            )
        } else {
            (
                Action::sequence(vec![
                    Action::delay(half),
                    Action::Show,
                    orbit_in,
                    Action::call(scenes.finish_signal()),
                ]),
                Action::sequence(vec![orbit_out, Action::Hide, Action::delay(half)]),
            )
        };

        ctx.run_action(scenes.incoming, in_action);
        ctx.run_action(scenes.outgoing, out_action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_per_axis() {
        let flip = Flip::new(FlipAxis::X, Orientation::RightOver);
        assert_eq!(flip.angles(), (270.0, 90.0, 90.0));
        let flip = Flip::new(FlipAxis::X, Orientation::LeftOver);
        assert_eq!(flip.angles(), (90.0, -90.0, -90.0));

        let flip = Flip::new(FlipAxis::Y, Orientation::UpOver);
        assert_eq!(flip.angles(), (270.0, 90.0, 90.0));
        // DownOver 与 RightOver 同属第二种模式
        let flip = Flip::new(FlipAxis::Y, Orientation::DownOver);
        assert_eq!(flip.angles(), (90.0, -90.0, -90.0));

        let flip = Flip::zoomed(FlipAxis::Angular, Flip::default_orientation(FlipAxis::Angular));
        assert_eq!(flip.angles(), (270.0, 90.0, 90.0));
        assert_eq!(flip.name(), "zoom_flip_angular");
    }

    #[test]
    fn test_tilt() {
        assert_eq!(FlipAxis::Y.tilt(), (90.0, 90.0));
        assert_eq!(FlipAxis::Angular.tilt(), (45.0, -45.0));
    }
}
