//! # Camera 模块
//!
//! 节点相机。翻转类过渡通过环绕相机制造 3D 翻页的错觉。

use crate::math::Vec3;

/// 节点相机
///
/// 默认状态下视点位于节点正前方，结束过渡时必须恢复到默认状态。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// 视点
    pub eye: Vec3,
    /// 观察中心
    pub center: Vec3,
    /// 上方向
    pub up: Vec3,
}

impl Camera {
    /// 默认视点到观察中心的距离
    pub const Z_EYE: f32 = f32::EPSILON;

    /// 恢复默认视点
    pub fn restore(&mut self) {
        *self = Self::default();
    }

    /// 是否处于默认状态
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// 以球坐标设置视点（角度为弧度，半径已乘 `Z_EYE`）
    pub fn set_eye_spherical(&mut self, radius: f32, zenith: f32, azimuth: f32) {
        self.eye = Vec3::new(
            zenith.sin() * azimuth.cos() * radius + self.center.x,
            zenith.sin() * azimuth.sin() * radius + self.center.y,
            zenith.cos() * radius + self.center.z,
        );
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, Self::Z_EYE),
            center: Vec3::new(0.0, 0.0, 0.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}
