//! 多边形构建错误定义

use thiserror::Error;
use zshape_core::math::Point2I;

/// 添加顶点被拒绝的原因
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPointError {
    #[error("Client declined to start a new polygon")]
    Vetoed,

    #[error("Point ({}, {}) would make the outline self-intersecting", .0.x, .0.y)]
    SelfIntersection(Point2I),
}
